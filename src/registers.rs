use crate::{errors::VmError, memory::TypeAddr};

pub const FLAG: u8 = 0xF;
pub const STACK_DEPTH: usize = 16;

pub struct Registers {
    registers: [u8; 16],
}

impl Registers {
    pub fn new() -> Self {
        Self { registers: [0; 16] }
    }

    pub fn set_register(&mut self, reg_num: u8, value: u8) {
        self.registers[(reg_num & 0xF) as usize] = value;
    }

    pub fn add_to_register(&mut self, reg_num: u8, value: u8) {
        let total = self.get(reg_num).wrapping_add(value);
        self.set_register(reg_num, total);
    }

    pub fn set_flag(&mut self, on: bool) {
        self.set_register(FLAG, on as u8);
    }

    pub fn get(&self, reg_num: u8) -> u8 {
        self.registers[(reg_num & 0xF) as usize]
    }

    /// V0..=Vx
    pub fn upto(&self, reg_num: u8) -> &[u8] {
        &self.registers[..=(reg_num & 0xF) as usize]
    }

    pub fn load_upto(&mut self, values: &[u8]) {
        self.registers[..values.len()].copy_from_slice(values);
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

// Special registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramCounter(pub TypeAddr);

impl ProgramCounter {
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(2);
    }

    pub fn set_addr(&mut self, addr: TypeAddr) {
        self.0 = addr;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRegister(pub TypeAddr);

impl IndexRegister {
    pub fn set_addr(&mut self, addr: TypeAddr) {
        self.0 = addr;
    }

    pub fn add(&mut self, offset: u8) {
        self.0 = self.0.wrapping_add(offset as u16);
    }
}

/// Return addresses for 2nnn/00EE, at most 16 deep.
pub struct Stack {
    addresses: [TypeAddr; STACK_DEPTH],
    depth: usize,
}

impl Stack {
    pub fn new() -> Self {
        Self {
            addresses: [0; STACK_DEPTH],
            depth: 0,
        }
    }

    pub fn push(&mut self, addr: TypeAddr) -> Result<(), VmError> {
        let slot = self
            .addresses
            .get_mut(self.depth)
            .ok_or(VmError::StackOverflow)?;
        *slot = addr;
        self.depth += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<TypeAddr, VmError> {
        if self.depth == 0 {
            return Err(VmError::StackUnderflow);
        }
        self.depth -= 1;
        Ok(self.addresses[self.depth])
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_wraps() {
        let mut regs = Registers::new();
        regs.set_register(3, 0xFE);
        regs.add_to_register(3, 0x03);
        assert_eq!(regs.get(3), 0x01);
        // no carry flag for 7xkk
        assert_eq!(regs.get(FLAG), 0);
    }

    #[test]
    fn upto_is_inclusive() {
        let mut regs = Registers::new();
        regs.load_upto(&[1, 2, 3]);
        assert_eq!(regs.upto(2), &[1, 2, 3]);
        assert_eq!(regs.upto(0xF).len(), 16);
    }

    #[test]
    fn stack_holds_sixteen() {
        let mut stack = Stack::new();
        for i in 0..STACK_DEPTH as u16 {
            stack.push(0x200 + i * 2).unwrap();
        }
        assert_eq!(stack.depth(), 16);
        assert_eq!(stack.push(0x300), Err(VmError::StackOverflow));
        assert_eq!(stack.depth(), 16);
        assert_eq!(stack.pop(), Ok(0x21E));
    }

    #[test]
    fn empty_stack_underflows() {
        let mut stack = Stack::new();
        assert_eq!(stack.pop(), Err(VmError::StackUnderflow));
        stack.push(0x204).unwrap();
        assert_eq!(stack.pop(), Ok(0x204));
        assert_eq!(stack.pop(), Err(VmError::StackUnderflow));
    }
}
