//! # chip8vm
//!
//! ## Design
//!
//! * one `MachineState` per run, owned and stepped by a single thread
//! * decode is total; only the handler lookup can reject a word
//! * handlers are plain functions over `(&mut MachineState, Instruction)`,
//!   picked from a fixed table; nothing captures the machine
//! * legacy/modern quirks are a field on the machine, read by the handful of
//!   handlers that care
//! * timers are the driving loop's job, not the opcodes'
//! * abstract display, input and sound behind traits so the core runs
//!   headless in tests
//!
//! Model
//!
//! main
//!  |-- config (command line)
//!  |-- display, input, sound
//!  |-- interpreter(config, display, input, sound, [debugger])
//!  |    `-- machine state(quirks)
//!  |         |-- memory map (font at 0x050, program at 0x200)
//!  |         |-- registers, I, PC, call stack, timers, keypad
//!  |         `-- framebuffer
//!  `-- main loop
//!       |-- input.poll(keypad)
//!       |-- [debugger.step ->] machine.step -> ops::lookup -> handler
//!       |-- every rate/60 instructions: timers.tick (unless FX0A holds
//!       |   them), display.draw(snapshot), keypad.end_frame, beep/stop
//!       `-- sleep until the next instruction is due
pub mod config;
pub mod debugger;
pub mod display;
pub mod error;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod keypad;
pub mod machine;
pub mod memory;
pub mod ops;
pub mod sound;
pub mod timer;

pub use error::Chip8Error;
