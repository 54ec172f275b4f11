pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;

/// Monochrome 64x32 pixel grid. Rendering it is the frontend's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    bit_buffer: [[bool; WIDTH]; HEIGHT],
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            bit_buffer: [[false; WIDTH]; HEIGHT],
        }
    }

    pub fn clear_buffer(&mut self) {
        self.bit_buffer = [[false; WIDTH]; HEIGHT];
    }

    /// XOR-toggles one pixel, returning whether it was lit before.
    pub fn toggle(&mut self, x: usize, y: usize) -> bool {
        let pixel = &mut self.bit_buffer[y % HEIGHT][x % WIDTH];
        let previous = *pixel;
        *pixel = !previous;
        previous
    }

    /// XORs `sprite` (one byte per row, MSB leftmost) onto the grid at (x, y).
    /// Coordinates wrap around both edges. Returns true on any collision.
    pub fn paint(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let mut vf = false;
        for (i, row) in sprite.iter().enumerate() {
            for j in 0..8 {
                if (row >> (7 - j)) & 1 == 1 {
                    vf |= self.toggle(x as usize + j, y as usize + i);
                }
            }
        }
        vf
    }

    pub fn rows(&self) -> &[[bool; WIDTH]; HEIGHT] {
        &self.bit_buffer
    }
}

#[cfg(test)]
impl FrameBuffer {
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.bit_buffer[y % HEIGHT][x % WIDTH]
    }

    pub fn lit_count(&self) -> usize {
        self.bit_buffer.iter().flatten().filter(|&&p| p).count()
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
