use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::{
    display::FrameBuffer,
    emulator::{Emulator, Step},
    errors::VmError,
    keyboard::Keypad,
};

/// Everything outside the VM: the screen, the keys and the speaker.
pub trait Frontend {
    /// Refreshes `keypad` from the host. Returns false once the user asked to quit.
    fn poll_input(&mut self, keypad: &mut Keypad) -> Result<bool, VmError>;

    fn render(&mut self, fb: &FrameBuffer);

    fn beep(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    /// Suspended on FX0A until a key goes down; holds the target register.
    AwaitingKey(u8),
    Halted,
}

pub struct Scheduler {
    pub emu: Emulator,
    state: RunState,
    cycle: Duration,
    // shared with signal handlers, observed once per tick
    quit_requested: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new(emu: Emulator, instructions_per_second: u32) -> Self {
        Self {
            emu,
            state: RunState::Running,
            cycle: Duration::from_secs(1) / instructions_per_second.max(1),
            quit_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Asks the VM to stop at the next tick boundary.
    pub fn request_halt(&self) {
        self.quit_requested.store(true, Ordering::SeqCst);
    }

    /// A flag that, once set from anywhere, halts the VM at the next tick boundary.
    pub fn quit_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.quit_requested)
    }

    fn halt(&mut self, reason: &str) {
        info!("halting: {reason}");
        self.state = RunState::Halted;
    }

    /// One scheduler tick, minus the pacing sleep. `elapsed` is the wall time
    /// since the previous tick and drives the timers.
    pub fn tick<F: Frontend>(
        &mut self,
        frontend: &mut F,
        elapsed: Duration,
    ) -> Result<RunState, VmError> {
        if self.state == RunState::Halted {
            return Ok(self.state);
        }

        if !frontend.poll_input(&mut self.emu.keypad)? {
            self.request_halt();
        }

        match self.state {
            RunState::Running => match self.emu.step()? {
                Step::Continue => {}
                Step::AwaitKey(vx) => {
                    debug!("waiting for a key into V{vx:X}");
                    self.state = RunState::AwaitingKey(vx);
                }
                Step::Halt => self.halt("reached halt opcode"),
            },
            RunState::AwaitingKey(vx) => {
                if let Some(key) = self.emu.keypad.take_press() {
                    debug!("got key {key:X} for V{vx:X}");
                    self.emu.resolve_key(vx, key);
                    self.state = RunState::Running;
                }
            }
            RunState::Halted => {}
        }

        frontend.render(&self.emu.fb);

        if self.emu.timers.advance(elapsed) {
            debug!("beep");
            frontend.beep();
        }

        if self.quit_requested.load(Ordering::SeqCst) && self.state != RunState::Halted {
            self.halt("quit requested");
        }
        Ok(self.state)
    }

    /// Ticks until the VM halts, sleeping to hold the target instruction rate.
    pub fn run<F: Frontend>(&mut self, frontend: &mut F) -> Result<(), VmError> {
        let mut last_tick = Instant::now();
        while self.state != RunState::Halted {
            let started = Instant::now();
            let elapsed = started - last_tick;
            last_tick = started;

            self.tick(frontend, elapsed)?;

            if let Some(rest) = self.cycle.checked_sub(started.elapsed()) {
                std::thread::sleep(rest);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Quirks, registers::FLAG, timer::TIMER_PERIOD};

    /// Scripted host: key events are applied one tick each, frames and beeps are recorded.
    #[derive(Default)]
    struct Scripted {
        events: Vec<Option<(u8, bool)>>,
        quit_after: Option<usize>,
        polls: usize,
        frames: usize,
        last_frame: Option<FrameBuffer>,
        beeps: usize,
    }

    impl Frontend for Scripted {
        fn poll_input(&mut self, keypad: &mut Keypad) -> Result<bool, VmError> {
            if let Some(Some((code, down))) = self.events.get(self.polls).copied() {
                keypad.update_key(code, down)?;
            }
            self.polls += 1;
            Ok(self.quit_after.map_or(true, |n| self.polls <= n))
        }

        fn render(&mut self, fb: &FrameBuffer) {
            self.frames += 1;
            self.last_frame = Some(fb.clone());
        }

        fn beep(&mut self) {
            self.beeps += 1;
        }
    }

    fn scheduler(program: &[u16]) -> Scheduler {
        let rom: Vec<u8> = program.iter().flat_map(|op| op.to_be_bytes()).collect();
        let emu = Emulator::new(&rom, Quirks::default(), Some(0)).unwrap();
        Scheduler::new(emu, 540)
    }

    #[test]
    fn one_instruction_per_tick() {
        let mut sched = scheduler(&[0x6001, 0x6102, 0x0000]);
        let mut host = Scripted::default();
        assert_eq!(sched.tick(&mut host, Duration::ZERO), Ok(RunState::Running));
        assert_eq!(sched.emu.pc.0, 0x202);
        assert_eq!(sched.tick(&mut host, Duration::ZERO), Ok(RunState::Running));
        assert_eq!(sched.tick(&mut host, Duration::ZERO), Ok(RunState::Halted));
        assert_eq!(sched.emu.regs.upto(1), &[1, 2]);
        assert_eq!(host.frames, 3);
    }

    #[test]
    fn halted_is_terminal() {
        let mut sched = scheduler(&[0x0000, 0x6005]);
        let mut host = Scripted::default();
        sched.tick(&mut host, Duration::ZERO).unwrap();
        assert_eq!(sched.tick(&mut host, Duration::ZERO), Ok(RunState::Halted));
        assert_eq!(sched.emu.pc.0, 0x202);
        assert_eq!(sched.emu.regs.get(0), 0);
        assert_eq!(host.polls, 1);
    }

    #[test]
    fn fx0a_waits_for_a_new_key_down() {
        // key 5 is already held when F20A runs, so only the later press of 9 counts
        let mut sched = scheduler(&[0xF20A, 0x6301]);
        let mut host = Scripted {
            events: vec![Some((5, true)), None, Some((9, true))],
            ..Default::default()
        };
        assert_eq!(sched.tick(&mut host, Duration::ZERO), Ok(RunState::AwaitingKey(2)));
        assert_eq!(sched.tick(&mut host, Duration::ZERO), Ok(RunState::AwaitingKey(2)));
        assert_eq!(sched.emu.pc.0, 0x202);
        assert_eq!(sched.tick(&mut host, Duration::ZERO), Ok(RunState::Running));
        assert_eq!(sched.emu.regs.get(2), 9);
        sched.tick(&mut host, Duration::ZERO).unwrap();
        assert_eq!(sched.emu.regs.get(3), 1);
    }

    #[test]
    fn timers_run_while_awaiting_key() {
        let mut sched = scheduler(&[0x6003, 0xF015, 0xF118, 0xF00A]);
        let mut host = Scripted::default();
        for _ in 0..4 {
            sched.tick(&mut host, Duration::ZERO).unwrap();
        }
        assert_eq!(sched.state(), RunState::AwaitingKey(0));
        for _ in 0..3 {
            sched.tick(&mut host, TIMER_PERIOD).unwrap();
        }
        assert_eq!(sched.emu.timers.delay.count, 0);
        assert_eq!(sched.emu.timers.sound.count, 0);
        assert_eq!(host.beeps, 1);
        // no second beep once the sound timer sits at zero
        sched.tick(&mut host, TIMER_PERIOD).unwrap();
        assert_eq!(host.beeps, 1);
    }

    #[test]
    fn quit_lets_the_current_instruction_finish() {
        let mut sched = scheduler(&[0x6007, 0x6008]);
        let mut host = Scripted {
            quit_after: Some(0),
            ..Default::default()
        };
        assert_eq!(sched.tick(&mut host, Duration::ZERO), Ok(RunState::Halted));
        assert_eq!(sched.emu.regs.get(0), 7);
    }

    #[test]
    fn request_halt_stops_at_tick_boundary() {
        let mut sched = scheduler(&[0x1200]);
        let mut host = Scripted::default();
        sched.tick(&mut host, Duration::ZERO).unwrap();
        sched.request_halt();
        assert_eq!(sched.tick(&mut host, Duration::ZERO), Ok(RunState::Halted));
    }

    #[test]
    fn faults_surface_as_errors() {
        let mut sched = scheduler(&[0x00EE]);
        let mut host = Scripted::default();
        assert_eq!(
            sched.tick(&mut host, Duration::ZERO),
            Err(VmError::StackUnderflow)
        );
    }

    #[test]
    fn frames_follow_draws() {
        // draw glyph 0 twice: lit, then erased with a collision
        let mut sched = scheduler(&[0xD005, 0xD005, 0x0000]);
        let mut host = Scripted::default();
        sched.tick(&mut host, Duration::ZERO).unwrap();
        assert_eq!(host.last_frame.as_ref().map(|f| f.lit_count()), Some(14));
        sched.tick(&mut host, Duration::ZERO).unwrap();
        assert_eq!(host.last_frame, Some(FrameBuffer::new()));
        assert_eq!(sched.emu.regs.get(FLAG), 1);
    }

    #[test]
    fn run_stops_on_halt() {
        let mut sched = scheduler(&[0x6001, 0x0000]);
        let mut host = Scripted::default();
        sched.run(&mut host).unwrap();
        assert_eq!(sched.state(), RunState::Halted);
        assert_eq!(sched.emu.regs.get(0), 1);
    }

    #[test]
    fn quit_flag_from_another_thread_halts_after_the_instruction() {
        let mut sched = scheduler(&[0x6007, 0x6008]);
        let mut host = Scripted::default();
        let flag = sched.quit_handle();
        std::thread::spawn(move || flag.store(true, Ordering::SeqCst))
            .join()
            .unwrap();
        assert_eq!(sched.tick(&mut host, Duration::ZERO), Ok(RunState::Halted));
        assert_eq!(sched.emu.regs.get(0), 7);
        assert_eq!(sched.emu.pc.0, 0x202);
        assert_eq!(sched.tick(&mut host, Duration::ZERO), Ok(RunState::Halted));
        assert_eq!(sched.emu.regs.get(0), 7);
    }

    #[test]
    fn quit_while_awaiting_key() {
        let mut sched = scheduler(&[0xF10A]);
        let mut host = Scripted {
            quit_after: Some(1),
            ..Default::default()
        };
        assert_eq!(sched.tick(&mut host, Duration::ZERO), Ok(RunState::AwaitingKey(1)));
        assert_eq!(sched.tick(&mut host, Duration::ZERO), Ok(RunState::Halted));
        assert_eq!(sched.emu.regs.get(1), 0);
    }

    #[test]
    fn any_zero_low_byte_in_group_zero_halts() {
        let mut sched = scheduler(&[0x6001, 0x0100, 0x6002]);
        let mut host = Scripted::default();
        sched.tick(&mut host, Duration::ZERO).unwrap();
        assert_eq!(sched.tick(&mut host, Duration::ZERO), Ok(RunState::Halted));
        assert_eq!(sched.emu.regs.get(0), 1);
        assert_eq!(sched.emu.pc.0, 0x204);
    }
}
