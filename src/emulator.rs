use log::trace;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    config::{Quirks, ShiftQuirk},
    decode::OpCodes,
    display::FrameBuffer,
    errors::VmError,
    keyboard::Keypad,
    memory::{Memory, TypeAddr, FONT_GLYPH_LEN, FONT_START, ROM_START},
    registers::{IndexRegister, ProgramCounter, Registers, Stack, FLAG},
    timer::Timers,
};

/// What the scheduler should do after an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    /// FX0A ran; store the next key pressed in this register.
    AwaitKey(u8),
    Halt,
}

/// The whole machine state for one run.
pub struct Emulator {
    pub fb: FrameBuffer,
    pub regs: Registers,
    pub mem: Memory,
    pub pc: ProgramCounter,
    pub index: IndexRegister,
    pub stack: Stack,
    pub timers: Timers,
    pub keypad: Keypad,
    quirks: Quirks,
    rng: StdRng,
}

impl Emulator {
    pub fn new(rom: &[u8], quirks: Quirks, seed: Option<u64>) -> Result<Self, VmError> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            fb: FrameBuffer::new(),
            regs: Registers::new(),
            mem: Memory::with_rom(rom)?,
            pc: ProgramCounter(ROM_START as TypeAddr),
            index: IndexRegister(0x0),
            stack: Stack::new(),
            timers: Timers::new(),
            keypad: Keypad::new(),
            quirks,
            rng,
        })
    }

    pub fn fetch_decode(&mut self) -> Result<OpCodes, VmError> {
        let ins = self.mem.read_word(self.pc.0)?;
        trace!("{:04X}: {:04X}", self.pc.0, ins);
        self.pc.increment();
        OpCodes::decode_raw(ins)
    }

    /// Runs one fetch-decode-execute cycle.
    pub fn step(&mut self) -> Result<Step, VmError> {
        let operation = self.fetch_decode()?;
        self.execute_ins(operation)
    }

    fn skip_if(&mut self, cond: bool) {
        if cond {
            self.pc.increment();
        }
    }

    pub fn execute_ins(&mut self, ins: OpCodes) -> Result<Step, VmError> {
        match ins {
            OpCodes::Halt => return Ok(Step::Halt),
            OpCodes::Jump(addr) => self.pc.set_addr(addr),
            OpCodes::SetRegister(vx, nn) => self.regs.set_register(vx, nn),
            OpCodes::AddToRegister(vx, nn) => self.regs.add_to_register(vx, nn),
            OpCodes::SetIndexRegister(addr) => self.index.set_addr(addr),
            OpCodes::ClearScreen => self.fb.clear_buffer(),
            OpCodes::Display(reg_x, reg_y, height) => {
                let (x, y) = (self.regs.get(reg_x), self.regs.get(reg_y));
                // rows come from I..I+N, fetched up front so a bad I leaves the screen alone
                let sprite = self.mem.read_range(self.index.0, height as usize)?;
                let vf = self.fb.paint(x, y, sprite);
                self.regs.set_flag(vf);
            }
            OpCodes::PushSubroutine(addr) => {
                // pc already points past the call
                self.stack.push(self.pc.0)?;
                self.pc.set_addr(addr);
            }
            OpCodes::PopSubroutine => {
                let addr = self.stack.pop()?;
                self.pc.set_addr(addr);
            }
            OpCodes::CopyRegister(vx, vy) => {
                self.regs.set_register(vx, self.regs.get(vy));
            }
            OpCodes::Or(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vy) | self.regs.get(vx));
            }
            OpCodes::And(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vy) & self.regs.get(vx));
            }
            OpCodes::XOr(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vy) ^ self.regs.get(vx));
            }
            // VF is written before the result in the arithmetic group, so
            // when x or y is F the result is computed from the fresh flag.
            OpCodes::Add(vx, vy) => {
                let (x, y) = (self.regs.get(vx), self.regs.get(vy));
                self.regs.set_flag(x.checked_add(y).is_none());
                let (x, y) = (self.regs.get(vx), self.regs.get(vy));
                self.regs.set_register(vx, x.wrapping_add(y));
            }
            OpCodes::SubtractForward(vx, vy) => {
                let (x, y) = (self.regs.get(vx), self.regs.get(vy));
                self.regs.set_flag(x > y);
                let (x, y) = (self.regs.get(vx), self.regs.get(vy));
                self.regs.set_register(vx, x.wrapping_sub(y));
            }
            OpCodes::SubtractBackward(vx, vy) => {
                let (x, y) = (self.regs.get(vx), self.regs.get(vy));
                self.regs.set_flag(y > x);
                let (x, y) = (self.regs.get(vx), self.regs.get(vy));
                self.regs.set_register(vx, y.wrapping_sub(x));
            }
            OpCodes::LeftShift(vx, vy) => {
                let source = self.shift_source(vx, vy);
                self.regs.set_flag((self.regs.get(source) >> 7) & 1 == 1);
                let value = self.regs.get(source) << 1;
                self.regs.set_register(vx, value);
            }
            OpCodes::RightShift(vx, vy) => {
                let source = self.shift_source(vx, vy);
                self.regs.set_flag(self.regs.get(source) & 1 == 1);
                let value = self.regs.get(source) >> 1;
                self.regs.set_register(vx, value);
            }
            OpCodes::Random(vx, nn) => {
                let ransuu: u8 = self.rng.gen();
                self.regs.set_register(vx, nn & ransuu);
            }
            OpCodes::JumpWithOffset(addr) => {
                self.pc.set_addr(addr + self.regs.get(0) as u16);
            }
            OpCodes::AddToIndex(vx) => self.index.add(self.regs.get(vx)),
            OpCodes::SkipEqualConstant(vx, nn) => self.skip_if(self.regs.get(vx) == nn),
            OpCodes::SkipNotEqualConstant(vx, nn) => self.skip_if(self.regs.get(vx) != nn),
            OpCodes::SkipEqualRegister(vx, vy) => {
                self.skip_if(self.regs.get(vx) == self.regs.get(vy))
            }
            OpCodes::SkipNotEqualRegister(vx, vy) => {
                self.skip_if(self.regs.get(vx) != self.regs.get(vy))
            }
            OpCodes::PointChar(vx) => {
                let glyph = self.regs.get(vx) as usize * FONT_GLYPH_LEN + FONT_START;
                self.index.set_addr(glyph as TypeAddr);
            }
            OpCodes::ToDecimal(vx) => {
                let value = self.regs.get(vx);
                let digits = [value / 100, (value / 10) % 10, value % 10];
                self.mem.write_range(self.index.0, &digits)?;
            }
            OpCodes::SkipIfPressed(vx) => {
                let pressed = self.keypad.read_key(self.regs.get(vx))?;
                self.skip_if(pressed);
            }
            OpCodes::SkipIfNotPressed(vx) => {
                let pressed = self.keypad.read_key(self.regs.get(vx))?;
                self.skip_if(!pressed);
            }
            OpCodes::CopyDelayToRegister(vx) => {
                self.regs.set_register(vx, self.timers.delay.count)
            }
            OpCodes::CopyRegisterToDelay(vx) => self.timers.delay.set(self.regs.get(vx)),
            OpCodes::CopyRegisterToSound(vx) => self.timers.sound.set(self.regs.get(vx)),
            OpCodes::GetKey(vx) => {
                self.keypad.forget_press();
                return Ok(Step::AwaitKey(vx));
            }
            OpCodes::LoadRegisterFromMemory(vx) => {
                let values = self.mem.read_range(self.index.0, vx as usize + 1)?;
                self.regs.load_upto(values);
            }
            OpCodes::StoreRegisterToMemory(vx) => {
                self.mem.write_range(self.index.0, self.regs.upto(vx))?;
            }
        }
        Ok(Step::Continue)
    }

    /// Completes a pending FX0A.
    pub fn resolve_key(&mut self, vx: u8, key: u8) {
        self.regs.set_register(vx, key);
    }

    fn shift_source(&self, vx: u8, vy: u8) -> u8 {
        match self.quirks.shift {
            ShiftQuirk::Vy => vy,
            ShiftQuirk::Vx => vx,
        }
    }
}
