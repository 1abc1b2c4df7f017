//! # debugger
//!
//! Wraps `MachineState::step` with breakpoints and a line-oriented console:
//!
//! ```text
//!   s          print the whole machine state
//!   c          continue until the next breakpoint
//!   n          execute one instruction, then pause again
//!   q          quit
//!   b <addr>   set a breakpoint (hex, 0x optional) and continue
//!   h          help
//! ```
//!
//! The machine itself knows nothing about any of this.
use crate::error::Chip8Error;
use crate::instruction::Instruction;
use crate::machine::MachineState;
use std::io::{self, BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugState {
    Running,
    Paused,
}

/// what the caller should do after a debugger step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    State,
    Continue,
    Next,
    Quit,
    Breakpoint(Option<u16>),
    Help,
}

const HELP: &str = "Commands:
  > s          Print entire machine state to console
  > c          Continue with execution without stopping
  > n          Execute instruction then pause again
  > q          Quit program
  > b <0xXXX>  Set a breakpoint at a memory address in hex
  > h          Help, print this message";

fn parse_addr(text: &str) -> Option<u16> {
    let text = text.trim();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u16::from_str_radix(digits, 16).ok()
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    let mut chars = line.chars();
    let command = match chars.next()? {
        's' => Command::State,
        'c' => Command::Continue,
        'n' => Command::Next,
        'q' => Command::Quit,
        'h' => Command::Help,
        'b' => {
            let rest = chars.as_str().trim();
            if rest.is_empty() {
                Command::Breakpoint(None)
            } else {
                Command::Breakpoint(Some(parse_addr(rest)?))
            }
        }
        _ => return None,
    };
    // single-letter commands take nothing after them
    match command {
        Command::Breakpoint(_) => Some(command),
        _ if chars.as_str().trim().is_empty() => Some(command),
        _ => None,
    }
}

pub struct Debugger<'a> {
    state: DebugState,
    breakpoint: Option<u16>,
    last: Option<Instruction>,
    input: &'a mut dyn BufRead,
    output: &'a mut dyn Write,
}

impl<'a> Debugger<'a> {
    /// starts paused when `paused` is set, as with the --debug flag
    pub fn new(input: &'a mut dyn BufRead, output: &'a mut dyn Write, paused: bool) -> Self {
        Debugger {
            state: if paused {
                DebugState::Paused
            } else {
                DebugState::Running
            },
            breakpoint: None,
            last: None,
            input,
            output,
        }
    }

    pub fn set_breakpoint(&mut self, addr: u16) {
        self.breakpoint = Some(addr);
    }

    pub fn breakpoint(&self) -> Option<u16> {
        self.breakpoint
    }

    pub fn state(&self) -> DebugState {
        self.state
    }

    /// run the console while paused, then execute one instruction unless told
    /// to quit
    pub fn step(&mut self, machine: &mut MachineState) -> Result<Flow, Chip8Error> {
        while self.state == DebugState::Paused {
            self.status(machine)?;
            match self.read_command()? {
                None => return Ok(Flow::Quit),
                Some(Command::State) => {
                    write!(self.output, "{}", machine)?;
                    write!(self.output, "{}", machine.framebuffer().to_ascii())?;
                }
                Some(Command::Continue) => self.state = DebugState::Running,
                Some(Command::Next) => break,
                Some(Command::Quit) => return Ok(Flow::Quit),
                Some(Command::Breakpoint(addr)) => {
                    let addr = match addr {
                        Some(addr) => Some(addr),
                        None => self.prompt_addr()?,
                    };
                    match addr {
                        Some(addr) => {
                            self.breakpoint = Some(addr);
                            self.state = DebugState::Running;
                        }
                        None => writeln!(self.output, "Sorry, that is not a hex address")?,
                    }
                }
                Some(Command::Help) => writeln!(self.output, "{}", HELP)?,
            }
        }

        self.last = Some(machine.step()?);
        if Some(machine.program_counter()) == self.breakpoint {
            log::debug!("breakpoint at {:03x}", machine.program_counter());
            self.state = DebugState::Paused;
        }
        Ok(Flow::Continue)
    }

    fn status(&mut self, machine: &MachineState) -> Result<(), io::Error> {
        match self.last {
            Some(i) => writeln!(
                self.output,
                "PC (incremented): {:x}; Instruction just executed: {:04x} ({}); A: {:x}; X: {:x}; Y: {:x}; N: {:x}; NN: {:x}; NNN: {:x}",
                machine.program_counter(), i.word, i, i.opcode_class, i.x, i.y, i.n, i.nn, i.nnn
            )?,
            None => writeln!(self.output, "PC: {:x}; nothing executed yet", machine.program_counter())?,
        }
        writeln!(
            self.output,
            "Debug: (s)tate, (c)ontinue, (n)ext, (q)uit, (b)reakpoint, (h)elp"
        )?;
        self.output.flush()
    }

    /// None once the input is exhausted
    fn read_command(&mut self) -> Result<Option<Command>, io::Error> {
        loop {
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            match parse_command(&line) {
                Some(c) => return Ok(Some(c)),
                None => {
                    writeln!(self.output, "Sorry, {} is not a valid command", line.trim())?;
                    self.output.flush()?;
                }
            }
        }
    }

    fn prompt_addr(&mut self) -> Result<Option<u16>, io::Error> {
        write!(self.output, "Enter memory address in hex (e.g. 0xXXX): ")?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(parse_addr(&line))
    }
}
