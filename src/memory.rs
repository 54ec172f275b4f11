use crate::errors::VmError;

pub type TypeAddr = u16; // in reality u12
type FontBytes = [u8; FONT_GLYPH_LEN * 16];

pub const MEMORY_SIZE: usize = 4096;
pub const ROM_START: usize = 0x200;
pub const MAX_ROM_LEN: usize = MEMORY_SIZE - ROM_START;
pub const FONT_START: usize = 0x000;
pub const FONT_GLYPH_LEN: usize = 5;

const DEFAULT_FONT: FontBytes = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Checks a ROM image before it is handed to the VM.
pub fn validate_rom(bytes: &[u8]) -> Result<(), VmError> {
    if bytes.is_empty() {
        return Err(VmError::EmptyRom);
    }
    if bytes.len() > MAX_ROM_LEN {
        return Err(VmError::RomTooLarge {
            size: bytes.len(),
            max: MAX_ROM_LEN,
        });
    }
    Ok(())
}

pub struct Memory {
    // 4k bytes
    // font glyphs live in 000 -> 04F, programs start at 200
    bytes: [u8; MEMORY_SIZE],
}

impl Memory {
    pub fn new() -> Self {
        let mut bytes = [0; MEMORY_SIZE];
        bytes[FONT_START..FONT_START + DEFAULT_FONT.len()].copy_from_slice(&DEFAULT_FONT);
        Self { bytes }
    }

    /// Fresh memory with the font in place and `rom` copied to 0x200.
    pub fn with_rom(rom: &[u8]) -> Result<Self, VmError> {
        validate_rom(rom)?;
        let mut mem = Self::new();
        mem.bytes[ROM_START..ROM_START + rom.len()].copy_from_slice(rom);
        Ok(mem)
    }

    pub fn get(&self, addr: TypeAddr) -> Result<u8, VmError> {
        self.bytes
            .get(addr as usize)
            .copied()
            .ok_or_else(|| VmError::out_of_range(addr))
    }

    pub fn set(&mut self, addr: TypeAddr, val: u8) -> Result<(), VmError> {
        let slot = self
            .bytes
            .get_mut(addr as usize)
            .ok_or_else(|| VmError::out_of_range(addr))?;
        *slot = val;
        Ok(())
    }

    /// Big-endian 16-bit word at `addr`.
    pub fn read_word(&self, addr: TypeAddr) -> Result<u16, VmError> {
        let (l, r) = (self.get(addr)?, self.get(addr.wrapping_add(1))?);
        Ok(((l as u16) << 8) | r as u16)
    }

    pub fn read_range(&self, addr: TypeAddr, len: usize) -> Result<&[u8], VmError> {
        let range = Self::span(addr, len)?;
        Ok(&self.bytes[range])
    }

    /// Writes all of `data` at `addr`, or nothing if any byte would fall outside memory.
    pub fn write_range(&mut self, addr: TypeAddr, data: &[u8]) -> Result<(), VmError> {
        let range = Self::span(addr, data.len())?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }

    fn span(addr: TypeAddr, len: usize) -> Result<std::ops::Range<usize>, VmError> {
        let start = addr as usize;
        if len == 0 {
            return Ok(0..0);
        }
        if start + len > MEMORY_SIZE {
            // report the last byte the access would have touched
            return Err(VmError::out_of_range_at(start + len - 1));
        }
        Ok(start..start + len)
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
