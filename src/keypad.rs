//! # keypad
//!
//! The sixteen hex keys as the machine sees them. The host input layer
//! writes here between instructions; opcodes only read.
use crate::error::Chip8Error;

pub const KEY_COUNT: usize = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    pub pressed: bool,
    /// released since the last frame boundary
    pub just_released: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Keypad {
    keys: [KeyState; KEY_COUNT],
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, key: u8) -> Result<&mut KeyState, Chip8Error> {
        self.keys
            .get_mut(key as usize)
            .ok_or(Chip8Error::InvalidKey(key))
    }

    /// a release earlier in the same frame stays recorded
    pub fn press(&mut self, key: u8) -> Result<(), Chip8Error> {
        self.slot(key)?.pressed = true;
        Ok(())
    }

    pub fn release(&mut self, key: u8) -> Result<(), Chip8Error> {
        let k = self.slot(key)?;
        if k.pressed {
            k.pressed = false;
            k.just_released = true;
        }
        Ok(())
    }

    pub fn is_pressed(&self, key: u8) -> Result<bool, Chip8Error> {
        self.keys
            .get(key as usize)
            .map(|k| k.pressed)
            .ok_or(Chip8Error::InvalidKey(key))
    }

    /// lowest-numbered key currently held
    pub fn first_pressed(&self) -> Option<u8> {
        self.keys.iter().position(|k| k.pressed).map(|k| k as u8)
    }

    /// lowest-numbered key held that has not also been released this frame
    pub fn first_fresh_press(&self) -> Option<u8> {
        self.keys
            .iter()
            .position(|k| k.pressed && !k.just_released)
            .map(|k| k as u8)
    }

    /// whether the key went up since the last frame boundary, even if it
    /// has been pressed again since
    pub fn was_released(&self, key: u8) -> Result<bool, Chip8Error> {
        self.keys
            .get(key as usize)
            .map(|k| k.just_released)
            .ok_or(Chip8Error::InvalidKey(key))
    }

    pub fn state(&self, key: u8) -> Option<KeyState> {
        self.keys.get(key as usize).copied()
    }

    /// forget last frame's releases
    pub fn end_frame(&mut self) {
        for k in self.keys.iter_mut() {
            k.just_released = false;
        }
    }
}
