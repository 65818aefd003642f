//! Display sink for running without a window.
use std::fmt::{self, Write};

use chip8::{constants::*, DisplaySink};
use log::info;

/// Keeps the most recent frame, to be printed when the program ends.
pub struct HeadlessDisplay {
    frame: Box<[bool; DISPLAY_BUFFER_SIZE]>,
    frames: usize,
    beeps: usize,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self {
            frame: Box::new([false; DISPLAY_BUFFER_SIZE]),
            frames: 0,
            beeps: 0,
        }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn beeps(&self) -> usize {
        self.beeps
    }

    /// Render the last frame as text, one line per row.
    pub fn dump(&self) -> Result<String, fmt::Error> {
        let mut buf = String::with_capacity(DISPLAY_BUFFER_SIZE + DISPLAY_HEIGHT);

        for row in self.frame.chunks(DISPLAY_WIDTH) {
            for px in row {
                buf.write_char(if *px { '#' } else { '.' })?;
            }
            writeln!(buf)?;
        }

        Ok(buf)
    }
}

impl Default for HeadlessDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySink for HeadlessDisplay {
    fn refresh(&mut self, display: &[bool; DISPLAY_BUFFER_SIZE]) {
        self.frame.copy_from_slice(display);
        self.frames += 1;
    }

    fn beep(&mut self) {
        info!("beep");
        self.beeps += 1;
    }
}
