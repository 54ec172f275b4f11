// chipvm: CHIP-8 interpreter
//
// 4K memory, font at 000, programs at 200
// V0..VF, I, PC and a 16-deep call stack
// delay/sound timers at 60 Hz, beep when the sound timer runs out
// 64x32 XOR-drawn display, 16-key hex keypad

use std::fs;
use std::process::ExitCode;
use std::sync::atomic::Ordering;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};

use config::Args;
use emulator::Emulator;
use scheduler::Scheduler;
use sound::Sound;
use window::Desktop;

mod config;
mod decode;
mod display;
mod emulator;
mod errors;
mod keyboard;
mod memory;
mod registers;
mod scheduler;
mod sound;
mod timer;
mod window;

// CPU: ~540 instructions per second (--ips)
// Display: presented at most 60 times per second
// Timers: 60 Hz from measured wall time

fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let rom = fs::read(&args.rom)
        .with_context(|| format!("could not read ROM {}", args.rom.display()))?;
    let emu = Emulator::new(&rom, args.quirks(), args.seed)
        .with_context(|| format!("could not load ROM {}", args.rom.display()))?;
    info!("loaded {} ({} bytes)", args.rom.display(), rom.len());

    let sound = match Sound::new() {
        Ok(sound) => Some(sound),
        Err(err) => {
            warn!("audio unavailable, running silent: {err:#}");
            None
        }
    };
    let mut desktop = Desktop::new(args.scale, sound)?;

    let mut scheduler = Scheduler::new(emu, args.ips);
    let quit = scheduler.quit_handle();
    ctrlc::set_handler(move || quit.store(true, Ordering::SeqCst))
        .context("could not install Ctrl-C handler")?;

    if let Err(err) = scheduler.run(&mut desktop) {
        log::error!(
            "fault (pc={:04X}, stack depth {}): {err}",
            scheduler.emu.pc.0,
            scheduler.emu.stack.depth()
        );
        return Ok(ExitCode::FAILURE);
    }
    info!("stopped in state {:?}", scheduler.state());
    Ok(ExitCode::SUCCESS)
}
