use std::time::{Duration, Instant};

use anyhow::Context;
use minifb::{Key, Scale, Window, WindowOptions};

use crate::{
    display::{FrameBuffer, HEIGHT, WIDTH},
    errors::VmError,
    keyboard::{Keypad, KEYMAP},
    scheduler::Frontend,
    sound::Sound,
};

const ON: u32 = 0x00_7F_FF;
const OFF: u32 = 0x00_00_00;
// Limit presents to ~60 fps, input is still pumped every tick
const FRAME_INTERVAL: Duration = Duration::from_micros(16600);

/// Desktop host: a minifb window for video and keys, cpal for the beep.
pub struct Desktop {
    window: Window,
    pixel_buffer: Vec<u32>,
    last_present: Option<Instant>,
    sound: Option<Sound>,
}

impl Desktop {
    pub fn new(scale: usize, sound: Option<Sound>) -> anyhow::Result<Self> {
        let mut window = Window::new(
            "chipvm - ESC to exit",
            WIDTH,
            HEIGHT,
            WindowOptions {
                scale: scale_for(scale),
                ..WindowOptions::default()
            },
        )
        .context("could not open window")?;
        // pacing is the scheduler's job
        window.limit_update_rate(None);
        Ok(Self {
            window,
            pixel_buffer: vec![OFF; WIDTH * HEIGHT],
            last_present: None,
            sound,
        })
    }
}

fn scale_for(scale: usize) -> Scale {
    match scale {
        0 | 1 => Scale::X1,
        2 | 3 => Scale::X2,
        4..=7 => Scale::X4,
        8..=15 => Scale::X8,
        16..=31 => Scale::X16,
        _ => Scale::X32,
    }
}

/// Flattens the grid into 0RGB pixels, row-major.
pub fn to_pixels(fb: &FrameBuffer, out: &mut [u32]) {
    for (dst, &lit) in out.iter_mut().zip(fb.rows().iter().flatten()) {
        *dst = if lit { ON } else { OFF };
    }
}

impl Frontend for Desktop {
    fn poll_input(&mut self, keypad: &mut Keypad) -> Result<bool, VmError> {
        for (code, key) in KEYMAP.iter().enumerate() {
            keypad.update_key(code as u8, self.window.is_key_down(*key))?;
        }
        if let Some(sound) = self.sound.as_mut() {
            sound.update();
        }
        Ok(self.window.is_open() && !self.window.is_key_down(Key::Escape))
    }

    fn render(&mut self, fb: &FrameBuffer) {
        let due = self
            .last_present
            .map_or(true, |at| at.elapsed() >= FRAME_INTERVAL);
        if !due {
            self.window.update();
            return;
        }
        to_pixels(fb, &mut self.pixel_buffer);
        if let Err(err) = self
            .window
            .update_with_buffer(&self.pixel_buffer, WIDTH, HEIGHT)
        {
            log::warn!("could not present frame: {err}");
        }
        self.last_present = Some(Instant::now());
    }

    fn beep(&mut self) {
        if let Some(sound) = self.sound.as_mut() {
            sound.beep();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixels_are_row_major() {
        let mut fb = FrameBuffer::new();
        fb.paint(1, 2, &[0x80]);
        let mut out = vec![0xDEAD; WIDTH * HEIGHT];
        to_pixels(&fb, &mut out);
        assert_eq!(out[2 * WIDTH + 1], ON);
        assert_eq!(out.iter().filter(|&&p| p == ON).count(), 1);
        assert!(out.iter().all(|&p| p == ON || p == OFF));
    }

    #[test]
    fn scale_rounds_down() {
        assert!(matches!(scale_for(16), Scale::X16));
        assert!(matches!(scale_for(10), Scale::X8));
        assert!(matches!(scale_for(100), Scale::X32));
    }
}
