use crate::error::Chip8Error;
use std::io;
use std::io::Read;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// Represents the byte-addressable memory of the machine
pub trait MemoryMap {
    /// write a chunk of bytes into "RAM"
    fn write(&mut self, data: &[u8], addr: u16, len: usize) -> Result<(), io::Error> {
        let bytes = self.get_rw_slice(addr, len);
        let mut d: &[u8] = data;
        d.read_exact(bytes)?;
        Ok(())
    }

    /// get a big-endian two-byte word (instruction fetch)
    fn get_word(&self, addr: u16) -> u16 {
        let word = self.get_ro_slice(addr, 2);
        ((word[0] as u16) << 8) + (word[1] as u16)
    }

    /// single byte; addr must already be within 12 bits
    fn read(&self, addr: u16) -> u8 {
        self.get_ro_slice(addr, 1)[0]
    }

    /// single byte; addr must already be within 12 bits
    fn write_byte(&mut self, addr: u16, value: u8) {
        self.get_rw_slice(addr, 1)[0] = value;
    }

    /// get a r/w slice of the underlying memory
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> &mut [u8];

    /// get a r/o slice of the underlying memory
    fn get_ro_slice(&self, addr: u16, len: usize) -> &[u8];
}

/// Defines the memory map the interpreter exposes to programs:
///   0x0000-0x004f  unused
///   0x0050-0x009f  font
///   0x00a0-0x01ff  unused
///   0x0200-0x0e8f  program
///   0x0e90-0x0fff  free for program data, never loaded into
///
/// the stack, registers and display live outside the address space
pub struct Chip8MemoryMap {
    bytes: Box<[u8]>,
    pub program_addr: u16,
    pub font_addr: u16,
}

impl MemoryMap for Chip8MemoryMap {
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> &mut [u8] {
        let a = addr as usize;
        &mut self.bytes[a..(a + len)]
    }
    fn get_ro_slice(&self, addr: u16, len: usize) -> &[u8] {
        let a = addr as usize;
        &self.bytes[a..(a + len)]
    }
}

/// how much RAM we have
pub const CHIP8_RAM_SIZE_BYTES: u16 = 4096;

/// where the program is loaded
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// last address a program image may occupy
pub const CHIP8_MAX_PROGRAM_ADDR: u16 = 0x0e8f;

/// how many bytes of program can be loaded
pub const CHIP8_MAX_PROGRAM_LEN: usize = (CHIP8_MAX_PROGRAM_ADDR - CHIP8_PROGRAM_ADDR + 1) as usize;

impl Chip8MemoryMap {
    /// zeroed memory with the font baked in
    pub fn new() -> Self {
        let mut bytes = vec![0u8; CHIP8_RAM_SIZE_BYTES as usize].into_boxed_slice();
        let font = CHIP8_FONT_ADDR as usize;
        bytes[font..font + CHIP8_FONT.len()].copy_from_slice(&CHIP8_FONT);
        Chip8MemoryMap {
            bytes,
            program_addr: CHIP8_PROGRAM_ADDR,
            font_addr: CHIP8_FONT_ADDR,
        }
    }

    /// load a CHIP-8 program at 0x200; refuses anything past 0xe8f
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize, Chip8Error> {
        let mut buf = Vec::new();
        let len = reader.read_to_end(&mut buf)?;
        if len > CHIP8_MAX_PROGRAM_LEN {
            return Err(Chip8Error::ProgramTooLarge {
                len,
                max: CHIP8_MAX_PROGRAM_LEN,
            });
        }
        self.write(&buf, self.program_addr, len)?;
        Ok(len)
    }

    /// address of the glyph for a hex digit; only the low nibble counts
    pub fn glyph_addr(&self, digit: u8) -> u16 {
        self.font_addr + (digit & 0x0F) as u16 * CHIP8_GLYPH_HEIGHT
    }
}

impl Default for Chip8MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

pub const CHIP8_GLYPH_HEIGHT: u16 = 5;
pub const CHIP8_FONT_ADDR: u16 = 0x050;
pub const CHIP8_FONT: [u8; 80] = [
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_zeroed() {
        let m = Chip8MemoryMap::new();
        // NB. everything but the font is zero
        assert_eq!(m.bytes[..0x50], [0; 0x50]);
        assert_eq!(m.bytes[0xa0..], [0; 0xf60]);
    }

    #[test]
    fn test_font_loaded() {
        let m = Chip8MemoryMap::new();
        assert_eq!(m.get_ro_slice(0x050, 80), &CHIP8_FONT);
        assert_eq!(m.glyph_addr(0x0), 0x050);
        assert_eq!(m.glyph_addr(0xf), 0x050 + 75);
        // high nibble is ignored
        assert_eq!(m.glyph_addr(0x1a), m.glyph_addr(0x0a));
    }

    #[test]
    fn test_write_slice_ok() {
        let mut dst = Chip8MemoryMap::new();
        let src: &[u8] = &[0, 1, 2, 3, 4, 5, 6, 7];
        dst.write(src, 8, 8).unwrap();
        assert_eq!(
            dst.bytes[..16],
            [0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7]
        );
    }

    #[test]
    fn test_read_write_byte() {
        let mut m = Chip8MemoryMap::new();
        m.write_byte(0xfff, 0xab);
        assert_eq!(m.read(0xfff), 0xab);
        assert_eq!(m.read(0x300), 0);
    }

    #[test]
    fn test_read_word() {
        let mut m = Chip8MemoryMap::new();
        let src: &[u8] = &[0, 1, 2, 3, 4, 5, 6, 7];
        m.write(src, 0x200, 8).unwrap();
        assert_eq!(m.get_word(0x204), 0x0405);
    }

    #[test]
    #[should_panic]
    fn test_read_past_end_panic() {
        let m = Chip8MemoryMap::new();
        let _ = m.get_word(0x1000);
    }

    #[test]
    fn test_program_load_ok() -> Result<(), Chip8Error> {
        let mut dst = Chip8MemoryMap::new();
        let mut prog: &[u8] = &[0x00, 0xe0]; // clear screen
        assert_eq!(dst.load_program(&mut prog)?, 2);
        assert_eq!(dst.get_ro_slice(0x200, 2), &[0x00, 0xe0]);
        Ok(())
    }

    #[test]
    fn test_program_load_fills_region() -> Result<(), Chip8Error> {
        let mut dst = Chip8MemoryMap::new();
        let prog = vec![0xaa; CHIP8_MAX_PROGRAM_LEN];
        dst.load_program(&mut prog.as_slice())?;
        assert_eq!(dst.read(0xe8f), 0xaa);
        assert_eq!(dst.read(0xe90), 0x00);
        Ok(())
    }

    #[test]
    fn test_program_load_too_large() {
        let mut dst = Chip8MemoryMap::new();
        let prog = vec![0xaa; CHIP8_MAX_PROGRAM_LEN + 1];
        match dst.load_program(&mut prog.as_slice()) {
            Err(Chip8Error::ProgramTooLarge { len, max }) => {
                assert_eq!(len, 0xc91);
                assert_eq!(max, 0xc90);
            }
            other => panic!("expected ProgramTooLarge, got {:?}", other),
        }
        // nothing was written
        assert_eq!(dst.read(0x200), 0);
    }
}
