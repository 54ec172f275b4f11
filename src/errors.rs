use thiserror::Error;

use crate::memory::TypeAddr;

/// Faults raised by the virtual machine. Every one of them ends the current run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    #[error("memory access at {address:#06X} is out of range (bound {bound:#06X})")]
    AddressOutOfRange { address: usize, bound: usize },

    #[error("call stack overflow: more than 16 nested subroutine calls")]
    StackOverflow,

    #[error("call stack underflow: return with an empty call stack")]
    StackUnderflow,

    #[error("invalid key code {0:#04X}, expected 0x0..=0xF")]
    InvalidKeyCode(u8),

    #[error("unknown opcode {0:#06X}")]
    UnknownOpcode(u16),

    #[error("ROM is empty")]
    EmptyRom,

    #[error("ROM is too large ({size} bytes), max size is {max} bytes")]
    RomTooLarge { size: usize, max: usize },
}

impl VmError {
    pub fn out_of_range(address: TypeAddr) -> Self {
        Self::out_of_range_at(address as usize)
    }

    pub fn out_of_range_at(address: usize) -> Self {
        Self::AddressOutOfRange {
            address,
            bound: crate::memory::MEMORY_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_opcode_message_carries_raw_value() {
        assert_eq!(
            VmError::UnknownOpcode(0x5001).to_string(),
            "unknown opcode 0x5001"
        );
    }

    #[test]
    fn out_of_range_message_carries_address_and_bound() {
        let msg = VmError::out_of_range_at(4105).to_string();
        assert!(msg.contains("0x1009"));
        assert!(msg.contains("0x1000"));
    }
}
