use std::io;
use thiserror::Error;

/// Everything that stops the machine. None of these are recoverable: the
/// caller reports and halts.
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("program is {len} bytes; only {max} fit between 0x200 and 0xe8f")]
    ProgramTooLarge { len: usize, max: usize },

    #[error("program counter {0:#05x} is odd or outside 0x200..=0xffe")]
    ProgramCounterOutOfRange(u16),

    #[error("no instruction for {word:#06x} at {addr:#05x}")]
    UnknownInstruction { word: u16, addr: u16 },

    #[error("call stack overflow (depth {0})")]
    StackOverflow(usize),

    #[error("return with an empty call stack")]
    StackUnderflow,

    #[error("key {0:#04x} does not exist")]
    InvalidKey(u8),

    #[error("host i/o failed: {0}")]
    Io(#[from] io::Error),
}
