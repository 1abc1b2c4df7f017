//! # machine
//!
//! Everything an executing program can observe or change: memory, the sixteen
//! V registers, I, the program counter, the call stack, the timers, the
//! keypad and the framebuffer. One `MachineState` per run; a new program
//! needs a new machine.
//!
//! The execution engine is `step()` plus the handler table in `ops`.
use crate::display::Framebuffer;
use crate::error::Chip8Error;
use crate::instruction::{self, Instruction};
use crate::keypad::Keypad;
use crate::memory::{Chip8MemoryMap, MemoryMap, CHIP8_PROGRAM_ADDR, CHIP8_RAM_SIZE_BYTES};
use crate::ops;
use crate::timer::Timers;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use std::io;

/// deepest the call stack may go
pub const STACK_DEPTH: usize = 16;

/// Which reading of the historically ambiguous opcodes to follow.
///
/// | opcode         | legacy              | modern          |
/// |----------------|---------------------|-----------------|
/// | 8XY1/8XY2/8XY3 | VF = 0 afterwards   | VF untouched    |
/// | 8XY6/8XYE      | shift VY into VX    | shift VX        |
/// | BNNN           | NNN + V0            | NNN + VX        |
/// | FX55/FX65      | I advances by X + 1 | I unchanged     |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuirkMode {
    Legacy,
    #[default]
    Modern,
}

/// return addresses for 2NNN/00EE
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    frames: Vec<u16>,
}

impl CallStack {
    pub fn push(&mut self, addr: u16) -> Result<(), Chip8Error> {
        if self.frames.len() >= STACK_DEPTH {
            return Err(Chip8Error::StackOverflow(self.frames.len() + 1));
        }
        self.frames.push(addr);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16, Chip8Error> {
        self.frames.pop().ok_or(Chip8Error::StackUnderflow)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// oldest first
    pub fn frames(&self) -> &[u16] {
        &self.frames
    }
}

/// progress through FX0A
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyWait {
    /// nothing held yet; timers keep running
    Press,
    /// this key went down; waiting for it to come up, timers held
    Release(u8),
}

pub struct MachineState {
    pub(crate) memory: Chip8MemoryMap,
    pub(crate) framebuffer: Framebuffer,
    pub(crate) registers: [u8; 16],
    pub(crate) index: u16,
    pub(crate) program_counter: u16,
    pub(crate) stack: CallStack,
    pub(crate) timers: Timers,
    pub(crate) quirks: QuirkMode,
    pub(crate) keypad: Keypad,
    pub(crate) key_wait: Option<KeyWait>,
    pub(crate) rng: StdRng,
}

impl MachineState {
    pub fn new(quirks: QuirkMode) -> Self {
        Self::with_rng(quirks, StdRng::from_entropy())
    }

    /// deterministic CXNN, for tests and replays
    pub fn with_seed(quirks: QuirkMode, seed: u64) -> Self {
        Self::with_rng(quirks, StdRng::seed_from_u64(seed))
    }

    fn with_rng(quirks: QuirkMode, rng: StdRng) -> Self {
        MachineState {
            memory: Chip8MemoryMap::new(),
            framebuffer: Framebuffer::new(),
            registers: [0; 16],
            index: 0,
            program_counter: CHIP8_PROGRAM_ADDR,
            stack: CallStack::default(),
            timers: Timers::default(),
            quirks,
            keypad: Keypad::new(),
            key_wait: None,
            rng,
        }
    }

    /// load a chip8 program at 0x200
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize, Chip8Error> {
        self.memory.load_program(reader)
    }

    /// fetch, decode and execute one instruction; returns what ran
    pub fn step(&mut self) -> Result<Instruction, Chip8Error> {
        let addr = self.program_counter;
        if addr % 2 != 0 || addr < CHIP8_PROGRAM_ADDR || addr > CHIP8_RAM_SIZE_BYTES - 2 {
            return Err(Chip8Error::ProgramCounterOutOfRange(addr));
        }
        let inst = instruction::decode(self.memory.get_word(addr));
        self.program_counter += 2;

        let handler = ops::lookup(&inst).ok_or(Chip8Error::UnknownInstruction {
            word: inst.word,
            addr,
        })?;
        handler(self, inst)?;
        log::trace!("{:03x}: {}", addr, inst);
        Ok(inst)
    }

    /// re-execute the current instruction next step
    pub(crate) fn repeat(&mut self) {
        self.program_counter -= 2;
    }

    pub(crate) fn skip(&mut self) {
        self.program_counter += 2;
    }

    pub(crate) fn set_flag(&mut self, flag: bool) {
        self.registers[0xF] = flag as u8;
    }

    /// FX0A has seen its key go down and is waiting for it to come up
    pub fn timers_paused(&self) -> bool {
        matches!(self.key_wait, Some(KeyWait::Release(_)))
    }

    pub fn register(&self, index: u8) -> u8 {
        self.registers[index as usize]
    }

    pub fn registers(&self) -> &[u8; 16] {
        &self.registers
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn program_counter(&self) -> u16 {
        self.program_counter
    }

    pub fn stack(&self) -> &CallStack {
        &self.stack
    }

    pub fn quirks(&self) -> QuirkMode {
        self.quirks
    }

    pub fn key_wait(&self) -> Option<KeyWait> {
        self.key_wait
    }

    pub fn memory(&self) -> &Chip8MemoryMap {
        &self.memory
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut Timers {
        &mut self.timers
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    /// the input layer's only way in
    pub fn keypad_mut(&mut self) -> &mut Keypad {
        &mut self.keypad
    }
}

/// register dump, as printed by the debugger
impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "PC: {:03x}  I: {:03x}  DT: {:02x}  ST: {:02x}  quirks: {:?}",
            self.program_counter, self.index, self.timers.delay, self.timers.sound, self.quirks
        )?;
        for (i, v) in self.registers.iter().enumerate() {
            write!(f, "V{:X}:{:02x}", i, v)?;
            f.write_str(if i % 8 == 7 { "\n" } else { " " })?;
        }
        write!(f, "stack ({}):", self.stack.depth())?;
        for addr in self.stack.frames() {
            write!(f, " {:03x}", addr)?;
        }
        writeln!(f)?;
        if let Some(wait) = self.key_wait {
            writeln!(f, "waiting for key: {:?}", wait)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// a machine with `words` loaded at 0x200
    fn machine_with(quirks: QuirkMode, words: &[u16]) -> MachineState {
        let mut m = MachineState::with_seed(quirks, 8);
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_be_bytes()).collect();
        m.load_program(&mut bytes.as_slice()).unwrap();
        m
    }

    #[test]
    fn test_initial_state() {
        let m = MachineState::new(QuirkMode::Modern);
        assert_eq!(m.program_counter(), 0x200);
        assert_eq!(m.index(), 0);
        assert_eq!(m.registers(), &[0; 16]);
        assert_eq!(m.stack().depth(), 0);
        assert_eq!(m.timers(), &Timers::default());
        assert_eq!(m.memory().read(0x050), 0xF0);
        assert!(m.framebuffer().pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn test_stack_bounds() {
        let mut s = CallStack::default();
        assert!(matches!(s.pop(), Err(Chip8Error::StackUnderflow)));
        for i in 0..STACK_DEPTH as u16 {
            s.push(0x200 + i * 2).unwrap();
        }
        assert!(matches!(s.push(0x300), Err(Chip8Error::StackOverflow(17))));
        assert_eq!(s.pop().unwrap(), 0x21e);
        assert_eq!(s.depth(), 15);
    }

    #[test]
    fn test_jumps_track_targets() -> Result<(), Chip8Error> {
        // 200: jump 206, 206: jump 204, 204: jump 20a, 20a: jump 200
        let mut m = machine_with(QuirkMode::Modern, &[0x1206, 0x0000, 0x120a, 0x1204, 0x0000, 0x1200]);
        let targets = [0x206, 0x204, 0x20a, 0x200, 0x206, 0x204];
        for target in targets {
            m.step()?;
            assert_eq!(m.program_counter(), target);
            assert_eq!(m.program_counter() % 2, 0);
        }
        Ok(())
    }

    #[test]
    fn test_step_returns_instruction() -> Result<(), Chip8Error> {
        let mut m = machine_with(QuirkMode::Modern, &[0x6a42]);
        let inst = m.step()?;
        assert_eq!(inst.word, 0x6a42);
        assert_eq!(m.register(0xa), 0x42);
        assert_eq!(m.program_counter(), 0x202);
        Ok(())
    }

    #[test]
    fn test_unknown_instruction_is_fatal() {
        let mut m = machine_with(QuirkMode::Modern, &[0x6001, 0x8009]);
        m.step().unwrap();
        match m.step() {
            Err(Chip8Error::UnknownInstruction { word, addr }) => {
                assert_eq!(word, 0x8009);
                assert_eq!(addr, 0x202);
            }
            other => panic!("expected UnknownInstruction, got {:?}", other.map(|i| i.word)),
        }
    }

    #[test]
    fn test_zero_word_is_unknown() {
        // empty memory is not a program
        let mut m = MachineState::with_seed(QuirkMode::Modern, 1);
        assert!(matches!(
            m.step(),
            Err(Chip8Error::UnknownInstruction { word: 0, addr: 0x200 })
        ));
    }

    #[test]
    fn test_odd_program_counter_is_fatal() {
        let mut m = machine_with(QuirkMode::Modern, &[0x1301]);
        m.step().unwrap();
        assert!(matches!(
            m.step(),
            Err(Chip8Error::ProgramCounterOutOfRange(0x301))
        ));
    }

    #[test]
    fn test_program_counter_below_program_is_fatal() {
        let mut m = machine_with(QuirkMode::Modern, &[0x1050]);
        m.step().unwrap();
        assert!(matches!(
            m.step(),
            Err(Chip8Error::ProgramCounterOutOfRange(0x050))
        ));
    }

    #[test]
    fn test_state_dump() {
        let mut m = machine_with(QuirkMode::Legacy, &[0x6a42, 0x2300]);
        m.step().unwrap();
        m.step().unwrap();
        let dump = m.to_string();
        assert!(dump.starts_with("PC: 300  I: 000"));
        assert!(dump.contains("VA:42"));
        assert!(dump.contains("stack (1): 204"));
        assert!(dump.contains("Legacy"));
    }
}
