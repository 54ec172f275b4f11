use crate::{errors::VmError, memory::TypeAddr};

/// Field view over a raw 16-bit opcode.
///
/// ```text
/// 0110 1100 1111 0001
/// id   x    y    n
///      addr---------
///           kk------
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawInstruction {
    code: u16,
}

impl RawInstruction {
    pub fn new(code: u16) -> Self {
        RawInstruction { code }
    }

    pub fn identifier(&self) -> u8 {
        (self.code >> 12) as u8
    }

    pub fn x(&self) -> u8 {
        ((self.code >> 8) & 0xF) as u8
    }

    pub fn y(&self) -> u8 {
        ((self.code >> 4) & 0xF) as u8
    }

    pub fn n(&self) -> u8 {
        (self.code & 0xF) as u8
    }

    pub fn kk(&self) -> u8 {
        (self.code & 0xFF) as u8
    }

    pub fn addr(&self) -> TypeAddr {
        self.code & 0x0FFF
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCodes {
    // 0x00 (low byte zero, normally 0000)
    // stop the machine
    Halt,
    // 00E0
    // turn all pixels to 0
    ClearScreen,
    // 1NNN
    // set PC to address NNN, "jump" to memory location
    Jump(TypeAddr),
    // 6XNN
    // set register VX to value NN
    SetRegister(u8, u8),
    // 7XNN
    // add value NN to VX, no carry
    AddToRegister(u8, u8),
    // ANNN
    // set index register I to address NNN
    SetIndexRegister(TypeAddr),
    // DXYN
    // draw an N pixel tall sprite starting at I
    // at Coordinates (VX, VY)
    // XOR pixels on screen using sprite data
    // if pixels on screen were switched OFF: VF set to 1
    Display(u8, u8, u8),

    // 2NNN
    PushSubroutine(TypeAddr),
    // 00EE
    PopSubroutine,

    // 3XNN
    SkipEqualConstant(u8, u8),
    // 4XNN
    SkipNotEqualConstant(u8, u8),
    // 5XY0
    SkipEqualRegister(u8, u8),
    // 9XY0
    SkipNotEqualRegister(u8, u8),

    // 8XY0
    CopyRegister(u8, u8),
    // 8XY1
    Or(u8, u8),
    // 8XY2
    And(u8, u8),
    // 8XY3
    XOr(u8, u8),
    /// 8XY4
    Add(u8, u8),
    // 8XY5
    SubtractForward(u8, u8),
    // 8XY7
    SubtractBackward(u8, u8),
    // 8XYE
    LeftShift(u8, u8),
    // 8XY6
    RightShift(u8, u8),

    // BNNN
    JumpWithOffset(TypeAddr),
    // CXNN
    Random(u8, u8),

    // EX9E
    SkipIfPressed(u8),
    // EXA1
    SkipIfNotPressed(u8),

    // FX07
    CopyDelayToRegister(u8),
    // FX15
    CopyRegisterToDelay(u8),
    // FX18
    CopyRegisterToSound(u8),

    // FX1E
    AddToIndex(u8),
    // FX0A
    GetKey(u8),
    // FX29
    PointChar(u8),
    // FX33
    ToDecimal(u8),

    // FX65
    LoadRegisterFromMemory(u8),
    // FX55
    StoreRegisterToMemory(u8),
}

impl OpCodes {
    pub fn decode_raw(ins: u16) -> Result<Self, VmError> {
        let raw = RawInstruction::new(ins);
        let (x, y) = (raw.x(), raw.y());
        let unknown = Err(VmError::UnknownOpcode(ins));

        let op = match raw.identifier() {
            0x0 => match raw.kk() {
                0x00 => Self::Halt,
                0xE0 => Self::ClearScreen,
                0xEE => Self::PopSubroutine,
                _ => return unknown,
            },
            0x1 => Self::Jump(raw.addr()),
            0x2 => Self::PushSubroutine(raw.addr()),
            0x3 => Self::SkipEqualConstant(x, raw.kk()),
            0x4 => Self::SkipNotEqualConstant(x, raw.kk()),
            0x5 if raw.n() == 0 => Self::SkipEqualRegister(x, y),
            0x6 => Self::SetRegister(x, raw.kk()),
            0x7 => Self::AddToRegister(x, raw.kk()),
            0x8 => match raw.n() {
                0x0 => Self::CopyRegister(x, y),
                0x1 => Self::Or(x, y),
                0x2 => Self::And(x, y),
                0x3 => Self::XOr(x, y),
                0x4 => Self::Add(x, y),
                0x5 => Self::SubtractForward(x, y),
                0x6 => Self::RightShift(x, y),
                0x7 => Self::SubtractBackward(x, y),
                0xE => Self::LeftShift(x, y),
                _ => return unknown,
            },
            0x9 if raw.n() == 0 => Self::SkipNotEqualRegister(x, y),
            0xA => Self::SetIndexRegister(raw.addr()),
            0xB => Self::JumpWithOffset(raw.addr()),
            0xC => Self::Random(x, raw.kk()),
            0xD => Self::Display(x, y, raw.n()),
            0xE => match raw.kk() {
                0x9E => Self::SkipIfPressed(x),
                0xA1 => Self::SkipIfNotPressed(x),
                _ => return unknown,
            },
            0xF => match raw.kk() {
                0x07 => Self::CopyDelayToRegister(x),
                0x0A => Self::GetKey(x),
                0x15 => Self::CopyRegisterToDelay(x),
                0x18 => Self::CopyRegisterToSound(x),
                0x1E => Self::AddToIndex(x),
                0x29 => Self::PointChar(x),
                0x33 => Self::ToDecimal(x),
                0x55 => Self::StoreRegisterToMemory(x),
                0x65 => Self::LoadRegisterFromMemory(x),
                _ => return unknown,
            },
            _ => return unknown,
        };
        Ok(op)
    }
}

#[test]
fn test_field_extraction() {
    let raw = RawInstruction::new(0x4CEE);
    assert_eq!(raw.identifier(), 0x4);
    assert_eq!(raw.x(), 0xC);
    assert_eq!(raw.y(), 0xE);
    assert_eq!(raw.n(), 0xE);
    assert_eq!(raw.kk(), 0xEE);
    assert_eq!(raw.addr(), 0xCEE);
}

#[test]
fn test_fields_rebuild_every_opcode() {
    for code in 0..=u16::MAX {
        let raw = RawInstruction::new(code);
        let from_nibbles = (raw.identifier() as u16) << 12
            | (raw.x() as u16) << 8
            | (raw.y() as u16) << 4
            | raw.n() as u16;
        assert_eq!(from_nibbles, code);
        assert_eq!((raw.identifier() as u16) << 12 | raw.addr(), code);
        assert_eq!((code & 0xFF00) | raw.kk() as u16, code);
    }
}

#[test]
fn test_decode_table() {
    assert_eq!(OpCodes::decode_raw(0x0000), Ok(OpCodes::Halt));
    assert_eq!(OpCodes::decode_raw(0x00E0), Ok(OpCodes::ClearScreen));
    assert_eq!(OpCodes::decode_raw(0x00EE), Ok(OpCodes::PopSubroutine));
    assert_eq!(OpCodes::decode_raw(0x1ABC), Ok(OpCodes::Jump(0xABC)));
    assert_eq!(OpCodes::decode_raw(0x2300), Ok(OpCodes::PushSubroutine(0x300)));
    assert_eq!(OpCodes::decode_raw(0x5120), Ok(OpCodes::SkipEqualRegister(1, 2)));
    assert_eq!(OpCodes::decode_raw(0x8AB6), Ok(OpCodes::RightShift(0xA, 0xB)));
    assert_eq!(OpCodes::decode_raw(0x8ABE), Ok(OpCodes::LeftShift(0xA, 0xB)));
    assert_eq!(OpCodes::decode_raw(0xD125), Ok(OpCodes::Display(1, 2, 5)));
    assert_eq!(OpCodes::decode_raw(0xE3A1), Ok(OpCodes::SkipIfNotPressed(3)));
    assert_eq!(OpCodes::decode_raw(0xF40A), Ok(OpCodes::GetKey(4)));
    assert_eq!(OpCodes::decode_raw(0xFF55), Ok(OpCodes::StoreRegisterToMemory(0xF)));
}

#[test]
fn test_decode_rejects_unknown_patterns() {
    for code in [0x5001, 0x9AB1, 0x0123, 0x8008, 0x800F, 0xE09F, 0xF000, 0xFF66] {
        assert_eq!(OpCodes::decode_raw(code), Err(VmError::UnknownOpcode(code)));
    }
}
