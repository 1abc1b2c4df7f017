use crate::error::Chip8Error;
use crate::keypad::{Keypad, KEY_COUNT};
use crossterm::event::{poll, read, Event, KeyCode};
use crossterm::terminal;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::time::{Duration, Instant};

/// map of characters typed on the host to hex keys, using the left-hand
/// side of a qwerty keyboard
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); KEY_COUNT] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// terminals report presses (and auto-repeats) but never releases; a key
/// is considered held until this long after its last report
const KEY_HOLD: Duration = Duration::from_millis(200);

/// anything the host wants from the interpreter besides key state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Nothing,
    Quit,
}

/// reads key presses and releases from the host. Errors are `Chip8Error`
/// because polling writes straight into the keypad, which rejects keys
/// outside 0..16.
pub trait Input {
    /// move whatever the host has seen since the last call into the keypad
    fn poll(&mut self, keypad: &mut Keypad) -> Result<HostEvent, Chip8Error>;

    /// give the terminal back for line input (the debugger console)
    fn suspend(&mut self) -> Result<(), Chip8Error> {
        Ok(())
    }

    /// take the terminal again after `suspend`
    fn resume(&mut self) -> Result<(), Chip8Error> {
        Ok(())
    }
}

/// terminal keyboard, via crossterm in raw mode
pub struct StdinInput {
    keymap: HashMap<char, u8>,
    last_seen: [Option<Instant>; KEY_COUNT],
}

impl StdinInput {
    pub fn new() -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(StdinInput {
            keymap: HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
            last_seen: [None; KEY_COUNT],
        })
    }

    fn release_stale(&mut self, keypad: &mut Keypad, now: Instant) -> Result<(), Chip8Error> {
        for key in 0..KEY_COUNT {
            if let Some(seen) = self.last_seen[key] {
                if now.duration_since(seen) > KEY_HOLD {
                    self.last_seen[key] = None;
                    keypad.release(key as u8)?;
                }
            }
        }
        Ok(())
    }
}

impl Drop for StdinInput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Input for StdinInput {
    fn poll(&mut self, keypad: &mut Keypad) -> Result<HostEvent, Chip8Error> {
        let now = Instant::now();
        while poll(Duration::from_millis(0))? {
            match read()? {
                Event::Key(evt) => match evt.code {
                    KeyCode::Char(c) => match self.keymap.get(&c.to_ascii_lowercase()) {
                        Some(&key) => {
                            self.last_seen[key as usize] = Some(now);
                            keypad.press(key)?;
                        }
                        None => log::warn!("can't map {:?} to a hex key", c),
                    },
                    KeyCode::Esc => return Ok(HostEvent::Quit),
                    other => log::debug!("ignoring key {:?}", other),
                },
                _ => log::debug!("ignoring non-key terminal event"),
            }
        }
        self.release_stale(keypad, now)?;
        Ok(HostEvent::Nothing)
    }

    fn suspend(&mut self) -> Result<(), Chip8Error> {
        terminal::disable_raw_mode()?;
        log::debug!("raw mode off");
        Ok(())
    }

    fn resume(&mut self) -> Result<(), Chip8Error> {
        terminal::enable_raw_mode()?;
        log::debug!("raw mode on");
        Ok(())
    }
}

/// one poll's worth of scripted input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scripted {
    Idle,
    Press(u8),
    Release(u8),
    Quit,
}

/// dummy Input implementation for testing; plays one entry per poll and
/// goes quiet when the script runs out
pub struct DummyInput {
    script: VecDeque<Scripted>,
    suspended: bool,
    pub polls: usize,
}

impl DummyInput {
    pub fn new(script: &[Scripted]) -> Self {
        DummyInput {
            script: script.iter().copied().collect(),
            suspended: false,
            polls: 0,
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }
}

impl Input for DummyInput {
    fn poll(&mut self, keypad: &mut Keypad) -> Result<HostEvent, Chip8Error> {
        self.polls += 1;
        match self.script.pop_front() {
            Some(Scripted::Press(key)) => keypad.press(key)?,
            Some(Scripted::Release(key)) => keypad.release(key)?,
            Some(Scripted::Quit) => return Ok(HostEvent::Quit),
            Some(Scripted::Idle) | None => {}
        }
        Ok(HostEvent::Nothing)
    }

    fn suspend(&mut self) -> Result<(), Chip8Error> {
        self.suspended = true;
        Ok(())
    }

    fn resume(&mut self) -> Result<(), Chip8Error> {
        self.suspended = false;
        Ok(())
    }
}
