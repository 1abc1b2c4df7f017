//! # instruction
//!
//! Every 16-bit word decodes; the fields are fixed by bit position:
//!
//! ```text
//!   15..12  11..8  7..4  3..0
//!   class   x      y     n
//!                  nn--------
//!           nnn---------------
//! ```
//!
//! Whether a word means anything is decided later, when the execution
//! engine looks up a handler for it.
use std::fmt;

/// operand layout, used only for printing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Full,
    X,
    XY,
    XYN,
    XNN,
    NNN,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub word: u16,
    pub opcode_class: u8,
    pub x: u8,
    pub y: u8,
    pub n: u8,
    pub nn: u8,
    pub nnn: u16,
}

/// split a code word into its fields
pub fn decode(word: u16) -> Instruction {
    Instruction {
        word,
        opcode_class: ((word & 0xF000) >> 12) as u8,
        x: ((word & 0x0F00) >> 8) as u8,
        y: ((word & 0x00F0) >> 4) as u8,
        n: (word & 0x000F) as u8,
        nn: (word & 0x00FF) as u8,
        nnn: word & 0x0FFF,
    }
}

/// decode a program image word by word, with addresses as if it were loaded
/// at `origin`. Data mixed into the code decodes too, usually as `unknown`;
/// a trailing odd byte is padded with zero.
pub fn disassemble(image: &[u8], origin: u16) -> impl Iterator<Item = (u16, Instruction)> + '_ {
    image.chunks(2).enumerate().map(move |(i, pair)| {
        let word = u16::from_be_bytes([pair[0], pair.get(1).copied().unwrap_or(0)]);
        (origin.wrapping_add(2 * i as u16), decode(word))
    })
}

impl Instruction {
    /// short name and operand layout; `None` for words with no handler
    fn mnemonic(&self) -> Option<(&'static str, Layout)> {
        let m = match (self.opcode_class, self.n, self.nn) {
            (0x0, _, _) if self.word == 0x00E0 => ("clear", Layout::Full),
            (0x0, _, _) if self.word == 0x00EE => ("return", Layout::Full),
            (0x1, _, _) => ("jump", Layout::NNN),
            (0x2, _, _) => ("call", Layout::NNN),
            (0x3, _, _) => ("skipe", Layout::XNN),
            (0x4, _, _) => ("skipne", Layout::XNN),
            (0x5, _, _) => ("skipre", Layout::XY),
            (0x6, _, _) => ("set", Layout::XNN),
            (0x7, _, _) => ("add", Layout::XNN),
            (0x8, 0x0, _) => ("move", Layout::XY),
            (0x8, 0x1, _) => ("or", Layout::XY),
            (0x8, 0x2, _) => ("and", Layout::XY),
            (0x8, 0x3, _) => ("xor", Layout::XY),
            (0x8, 0x4, _) => ("addr", Layout::XY),
            (0x8, 0x5, _) => ("sub", Layout::XY),
            (0x8, 0x6, _) => ("shiftr", Layout::XY),
            (0x8, 0x7, _) => ("subr", Layout::XY),
            (0x8, 0xE, _) => ("shiftl", Layout::XY),
            (0x9, _, _) => ("skiprne", Layout::XY),
            (0xA, _, _) => ("seti", Layout::NNN),
            (0xB, _, _) => ("jump0", Layout::NNN),
            (0xC, _, _) => ("rand", Layout::XNN),
            (0xD, _, _) => ("sprite", Layout::XYN),
            (0xE, _, 0x9E) => ("skipkey", Layout::X),
            (0xE, _, 0xA1) => ("skipnkey", Layout::X),
            (0xF, _, 0x07) => ("setfromdelay", Layout::X),
            (0xF, _, 0x0A) => ("key", Layout::X),
            (0xF, _, 0x15) => ("settodelay", Layout::X),
            (0xF, _, 0x18) => ("settosound", Layout::X),
            (0xF, _, 0x1E) => ("addi", Layout::X),
            (0xF, _, 0x29) => ("font", Layout::X),
            (0xF, _, 0x33) => ("bcd", Layout::X),
            (0xF, _, 0x55) => ("save", Layout::X),
            (0xF, _, 0x65) => ("load", Layout::X),
            _ => return None,
        };
        Some(m)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, layout) = match self.mnemonic() {
            Some(m) => m,
            None => return write!(f, "unknown # {:04X}", self.word),
        };
        match layout {
            Layout::Full => write!(f, "{}", name)?,
            Layout::X => write!(f, "{} V{:X}", name, self.x)?,
            Layout::XY => write!(f, "{} V{:X} V{:X}", name, self.x, self.y)?,
            Layout::XYN => write!(f, "{} V{:X} V{:X} {:X}", name, self.x, self.y, self.n)?,
            Layout::XNN => write!(f, "{} V{:X} {:02X}", name, self.x, self.nn)?,
            Layout::NNN => write!(f, "{} {:04X}", name, self.nnn)?,
        }
        write!(f, " # {:04X}", self.word)
    }
}
