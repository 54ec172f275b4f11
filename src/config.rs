use std::path::PathBuf;

use clap::{Parser, ValueEnum};

pub const DEFAULT_INSTRUCTIONS_PER_SECOND: u32 = 540;
pub const DEFAULT_SCALE: usize = 16;

/// Which register 8XY6 / 8XYE shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ShiftQuirk {
    /// Vx = Vy shifted (COSMAC VIP behaviour)
    #[default]
    Vy,
    /// Vx shifted in place, Vy ignored
    Vx,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Quirks {
    pub shift: ShiftQuirk,
}

#[derive(Parser, Debug)]
#[command(name = "chipvm", version, about = "A CHIP-8 virtual machine")]
pub struct Args {
    /// ROM file to run
    pub rom: PathBuf,

    #[arg(long, default_value_t = DEFAULT_INSTRUCTIONS_PER_SECOND, value_parser = clap::value_parser!(u32).range(1..), help = "Target instructions per second")]
    pub ips: u32,

    #[arg(long, value_enum, default_value_t = ShiftQuirk::Vy, help = "Source register for 8XY6/8XYE")]
    pub shift_quirk: ShiftQuirk,

    #[arg(long, help = "Seed for the CXNN random source")]
    pub seed: Option<u64>,

    #[arg(long, default_value_t = DEFAULT_SCALE, help = "Window pixels per CHIP-8 pixel")]
    pub scale: usize,
}

impl Args {
    pub fn quirks(&self) -> Quirks {
        Quirks {
            shift: self.shift_quirk,
        }
    }
}
