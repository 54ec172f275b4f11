use minifb::Key;

use crate::errors::VmError;

/// Host keys laid out like the COSMAC VIP hex keypad, indexed by key code.
///
/// ```text
/// 1 2 3 C      1 2 3 4
/// 4 5 6 D  ->  Q W E R
/// 7 8 9 E      A S D F
/// A 0 B F      Z X C V
/// ```
pub const KEYMAP: [Key; 16] = [
    Key::X,    // 0
    Key::Key1, // 1
    Key::Key2, // 2
    Key::Key3, // 3
    Key::Q,    // 4
    Key::W,    // 5
    Key::E,    // 6
    Key::A,    // 7
    Key::S,    // 8
    Key::D,    // 9
    Key::Z,    // A
    Key::C,    // B
    Key::Key4, // C
    Key::R,    // D
    Key::F,    // E
    Key::V,    // F
];

/// Down/up state of the 16 keys, plus the most recent key-down transition.
#[derive(Debug, Default)]
pub struct Keypad {
    keys: [bool; 16],
    last_press: Option<u8>,
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_key(&mut self, code: u8, down: bool) -> Result<(), VmError> {
        let key = self
            .keys
            .get_mut(code as usize)
            .ok_or(VmError::InvalidKeyCode(code))?;
        if down && !*key {
            self.last_press = Some(code);
        }
        *key = down;
        Ok(())
    }

    pub fn read_key(&self, code: u8) -> Result<bool, VmError> {
        self.keys
            .get(code as usize)
            .copied()
            .ok_or(VmError::InvalidKeyCode(code))
    }

    /// Forgets any key-down seen so far; the next `take_press` only reports newer ones.
    pub fn forget_press(&mut self) {
        self.last_press = None;
    }

    pub fn take_press(&mut self) -> Option<u8> {
        self.last_press.take()
    }
}
