use std::error::Error;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;

use chip8vm::config::{Config, DEFAULT_INSTRUCTION_RATE};
use chip8vm::debugger::Debugger;
use chip8vm::display::MonoTermDisplay;
use chip8vm::input::StdinInput;
use chip8vm::instruction::disassemble;
use chip8vm::interpreter::Chip8Interpreter;
use chip8vm::machine::QuirkMode;
use chip8vm::memory::CHIP8_PROGRAM_ADDR;
use chip8vm::sound::{Mute, SimpleBeep, Sound};
use clap::{Parser, ValueEnum};
use log::{error, info};

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Quirks {
    /// COSMAC VIP behaviour
    Legacy,
    /// CHIP-48 / SUPER-CHIP era behaviour
    Modern,
}

impl From<Quirks> for QuirkMode {
    fn from(q: Quirks) -> Self {
        match q {
            Quirks::Legacy => QuirkMode::Legacy,
            Quirks::Modern => QuirkMode::Modern,
        }
    }
}

fn parse_hex(s: &str) -> Result<u16, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(digits, 16).map_err(|e| format!("{}: {}", s, e))
}

#[derive(Parser)]
#[command(name = "chip8vm")]
#[command(about = "A CHIP-8 interpreter for the terminal")]
struct Args {
    #[arg(long, default_value = "roms/ibm_logo.ch8", help = "program image to load at 0x200")]
    rom: PathBuf,

    #[arg(long, default_value_t = DEFAULT_INSTRUCTION_RATE,
          value_parser = clap::value_parser!(u32).range(1..),
          help = "instructions per second")]
    rate: u32,

    #[arg(long, value_enum, default_value_t = Quirks::Modern, help = "how to run the ambiguous opcodes")]
    quirks: Quirks,

    #[arg(long, help = "start paused in the console debugger")]
    debug: bool,

    #[arg(long, value_parser = parse_hex, help = "pause in the console debugger at this address (hex)")]
    breakpoint: Option<u16>,

    #[arg(long, help = "no beeper")]
    mute: bool,

    #[arg(long, help = "seed for the random number instruction")]
    seed: Option<u64>,

    #[arg(long, help = "stop after this many instructions")]
    cycles: Option<u64>,

    #[arg(long, help = "print the program as instructions and exit")]
    disassemble: bool,
}

fn run(
    interpreter: &mut Chip8Interpreter,
    program: &mut File,
    cycles: Option<u64>,
) -> Result<(), Box<dyn Error>> {
    interpreter.load_program(program)?;
    match interpreter.main_loop(cycles) {
        Ok(n) => {
            info!("stopped after {} instructions", n);
            Ok(())
        }
        Err(e) => {
            error!(
                "machine halted at {:03x}: {}",
                interpreter.machine().program_counter(),
                e
            );
            Err(e.into())
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = Config {
        instruction_rate: args.rate,
        quirks: args.quirks.into(),
        seed: args.seed,
        throttle: true,
    };
    let mut program = File::open(&args.rom)?;
    info!("loading {}", args.rom.display());

    if args.disassemble {
        let mut image = Vec::new();
        program.read_to_end(&mut image)?;
        for (addr, inst) in disassemble(&image, CHIP8_PROGRAM_ADDR) {
            println!("{:03x}  {}", addr, inst);
        }
        return Ok(());
    }

    let mut display = MonoTermDisplay::new()?;
    let mut input = StdinInput::new()?;
    let mut sound: Box<dyn Sound> = if args.mute {
        Box::new(Mute::new())
    } else {
        Box::new(SimpleBeep::new())
    };
    // the debugger console shares the terminal; the interpreter drops raw
    // mode while it is paused
    let mut stdin = io::stdin().lock();
    let mut stdout = io::stdout();
    let result = {
        let mut interpreter =
            Chip8Interpreter::new(config, &mut display, &mut input, sound.as_mut());
        if args.debug || args.breakpoint.is_some() {
            let mut debugger = Debugger::new(&mut stdin, &mut stdout, args.debug);
            if let Some(addr) = args.breakpoint {
                debugger.set_breakpoint(addr);
            }
            interpreter = interpreter.with_debugger(debugger);
        }
        run(&mut interpreter, &mut program, args.cycles)
    };

    // shove some junk on stdout to stop the cli messing up the last frame
    for _ in 0..12 {
        println!();
    }
    result
}
