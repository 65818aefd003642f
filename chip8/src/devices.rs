//! IO device interface
use std::cell::Cell;

use crate::constants::*;

/// Output device receiving the display buffer and sound events.
pub trait DisplaySink {
    /// Blit the display buffer to screen output.
    ///
    /// The buffer is row-major, [`DISPLAY_WIDTH`] pixels wide.
    fn refresh(&mut self, display: &[bool; DISPLAY_BUFFER_SIZE]);

    /// Sound the buzzer once. Called when the sound timer reaches zero.
    fn beep(&mut self);
}

/// Input device polled for the keypad state.
pub trait KeySource {
    /// The key currently held down, if any.
    ///
    /// Only a single key is reported at a time.
    fn current_key(&self) -> Option<KeyCode>;
}

/// Source of elapsed time, called once per VM cycle.
pub trait TickSource {
    /// Milliseconds elapsed since the previous call.
    fn tick(&mut self) -> f64;
}

/// Display that discards everything it is given.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl DisplaySink for NullDisplay {
    fn refresh(&mut self, _display: &[bool; DISPLAY_BUFFER_SIZE]) {}

    fn beep(&mut self) {}
}

/// Keypad with no keys pressed, ever.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoKeys;

impl KeySource for NoKeys {
    fn current_key(&self) -> Option<KeyCode> {
        None
    }
}

impl KeySource for Option<KeyCode> {
    fn current_key(&self) -> Option<KeyCode> {
        *self
    }
}

/// Shared key state that the host updates while the VM holds a reference.
impl KeySource for Cell<Option<KeyCode>> {
    fn current_key(&self) -> Option<KeyCode> {
        self.get()
    }
}

impl<K: KeySource + ?Sized> KeySource for &K {
    fn current_key(&self) -> Option<KeyCode> {
        (**self).current_key()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KeyCode {
    Key0 = 0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    KeyA,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF = 0xF,
}

impl KeyCode {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl std::fmt::Display for KeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let key_id = self.as_u8();
        write!(f, "k{key_id:x}")
    }
}

impl From<KeyCode> for u8 {
    fn from(keycode: KeyCode) -> Self {
        keycode.as_u8()
    }
}

impl TryFrom<u8> for KeyCode {
    type Error = InvalidKeyCode;

    fn try_from(key_id: u8) -> Result<Self, Self::Error> {
        match key_id {
            0 => Ok(Self::Key0),
            1 => Ok(Self::Key1),
            2 => Ok(Self::Key2),
            3 => Ok(Self::Key3),
            4 => Ok(Self::Key4),
            5 => Ok(Self::Key5),
            6 => Ok(Self::Key6),
            7 => Ok(Self::Key7),
            8 => Ok(Self::Key8),
            9 => Ok(Self::Key9),
            10 => Ok(Self::KeyA),
            11 => Ok(Self::KeyB),
            12 => Ok(Self::KeyC),
            13 => Ok(Self::KeyD),
            14 => Ok(Self::KeyE),
            15 => Ok(Self::KeyF),
            _ => Err(InvalidKeyCode),
        }
    }
}

#[derive(Debug)]
pub struct InvalidKeyCode;

impl std::error::Error for InvalidKeyCode {}

impl std::fmt::Display for InvalidKeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "keycode must be in range 0 <= keycode < {KEY_COUNT}")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_keycode_conversion() {
        for key_id in 0..KEY_COUNT {
            let keycode = KeyCode::try_from(key_id).unwrap();
            assert_eq!(u8::from(keycode), key_id);
        }
        assert!(KeyCode::try_from(KEY_COUNT).is_err());
        assert_eq!(KeyCode::KeyB.to_string(), "kb");
    }

    #[test]
    fn test_cell_key_source() {
        let keys = Cell::new(None::<KeyCode>);
        assert_eq!(keys.current_key(), None);
        keys.set(Some(KeyCode::Key7));
        assert_eq!((&keys).current_key(), Some(KeyCode::Key7));
    }
}
