//! # interpreter
//!
//! The driving loop around a `MachineState`:
//!
//!  - polls the host input into the keypad before every instruction
//!  - executes one instruction, through the debugger when there is one
//!  - while the debugger is paused, hands the terminal to its console: input
//!    is suspended (the keypad holds its last state) and frames aren't drawn
//!  - every `rate / 60` instructions (one "frame"): ticks the timers unless
//!    FX0A holds them, hands the display a snapshot of the framebuffer,
//!    clears the keypad's release flags and switches the beeper
//!  - sleeps to hold the configured instruction rate
//!
//! The display never sees the live framebuffer, only a borrowed snapshot at
//! a frame boundary, so it cannot observe a half-drawn sprite.
use crate::config::Config;
use crate::debugger::{DebugState, Debugger, Flow};
use crate::display;
use crate::error::Chip8Error;
use crate::input::{self, HostEvent};
use crate::machine::MachineState;
use crate::sound;
use crate::timer::FrameDivider;
use std::io;
use std::time::{Duration, Instant};

pub struct Chip8Interpreter<'a> {
    machine: MachineState,
    display: &'a mut dyn display::Display,
    input: &'a mut dyn input::Input,
    sound: &'a mut dyn sound::Sound,
    debugger: Option<Debugger<'a>>,
    divider: FrameDivider,
    config: Config,
    console_open: bool,
}

impl<'a> Chip8Interpreter<'a> {
    pub fn new(
        config: Config,
        display: &'a mut dyn display::Display,
        input: &'a mut dyn input::Input,
        sound: &'a mut dyn sound::Sound,
    ) -> Self {
        let machine = match config.seed {
            Some(seed) => MachineState::with_seed(config.quirks, seed),
            None => MachineState::new(config.quirks),
        };
        Chip8Interpreter {
            machine,
            display,
            input,
            sound,
            debugger: None,
            divider: FrameDivider::new(config.instruction_rate),
            config,
            console_open: false,
        }
    }

    /// route every instruction through a debugger
    pub fn with_debugger(mut self, debugger: Debugger<'a>) -> Self {
        self.debugger = Some(debugger);
        self
    }

    /// load a chip8 program
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize, Chip8Error> {
        let len = self.machine.load_program(reader)?;
        log::info!("loaded {} bytes of program", len);
        Ok(len)
    }

    pub fn machine(&self) -> &MachineState {
        &self.machine
    }

    fn debugger_paused(&self) -> bool {
        self.debugger
            .as_ref()
            .map_or(false, |d| d.state() == DebugState::Paused)
    }

    /// one instruction, plus a frame if one is due
    pub fn cycle(&mut self) -> Result<Flow, Chip8Error> {
        if self.debugger_paused() && !self.console_open {
            self.input.suspend()?;
            self.console_open = true;
        }
        if !self.console_open && self.input.poll(self.machine.keypad_mut())? == HostEvent::Quit {
            log::info!("host asked to quit");
            return Ok(Flow::Quit);
        }
        let flow = match self.debugger.as_mut() {
            Some(debugger) => debugger.step(&mut self.machine)?,
            None => {
                self.machine.step()?;
                Flow::Continue
            }
        };
        if flow == Flow::Quit {
            return Ok(Flow::Quit);
        }
        if self.console_open && !self.debugger_paused() {
            self.input.resume()?;
            self.display.invalidate()?;
            self.console_open = false;
        }
        if self.divider.advance() {
            self.interrupt()?;
        }
        Ok(Flow::Continue)
    }

    /// 60Hz frame boundary
    pub fn interrupt(&mut self) -> Result<(), Chip8Error> {
        if !self.machine.timers_paused() {
            self.machine.timers_mut().tick();
        }
        if !self.console_open {
            self.display.draw(self.machine.framebuffer())?;
        }
        self.machine.keypad_mut().end_frame();

        let sounding = self.machine.timers().sounding();
        if sounding != self.sound.is_beeping() {
            let switched = if sounding {
                self.sound.beep()
            } else {
                self.sound.stop()
            };
            // a missing speaker is not worth stopping the program for
            if let Err(e) = switched {
                log::warn!("sound: {}", e);
            }
        }
        Ok(())
    }

    /// run until quit, an error, or `max_cycles` instructions; returns how
    /// many cycles ran
    pub fn main_loop(&mut self, max_cycles: Option<u64>) -> Result<u64, Chip8Error> {
        log::info!(
            "running at {} instructions/s, {:?} quirks, timers every {} instructions",
            self.config.instruction_rate,
            self.config.quirks,
            self.divider.period()
        );
        let period = Duration::from_secs_f64(1.0 / self.config.instruction_rate.max(1) as f64);
        let mut next = Instant::now() + period;
        let mut executed = 0;

        while max_cycles.map_or(true, |max| executed < max) {
            if self.cycle()? == Flow::Quit {
                break;
            }
            executed += 1;

            if self.config.throttle {
                let now = Instant::now();
                if next > now {
                    spin_sleep::sleep(next - now);
                } else {
                    // fell behind (e.g. sat at the debugger prompt); don't race to catch up
                    next = now;
                }
                next += period;
            }
        }
        Ok(executed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DummyDisplay;
    use crate::input::{DummyInput, Scripted};
    use crate::machine::{KeyWait, QuirkMode};
    use crate::sound::{Mute, Sound};

    fn config() -> Config {
        Config {
            instruction_rate: 600, // a frame every 10 instructions
            quirks: QuirkMode::Modern,
            seed: Some(7),
            throttle: false,
        }
    }

    fn program(words: &[u16]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_be_bytes()).collect()
    }

    #[test]
    fn test_program_load_ok() -> Result<(), Chip8Error> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let mut i = Chip8Interpreter::new(config(), &mut display, &mut input, &mut sound);
        let mut prog: &[u8] = &[0x00, 0xe0]; // clear screen
        assert_eq!(i.load_program(&mut prog)?, 2);
        Ok(())
    }

    #[test]
    fn test_timers_tick_per_frame() -> Result<(), Chip8Error> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        {
            let mut i = Chip8Interpreter::new(config(), &mut display, &mut input, &mut sound);
            // delay = 5, then spin
            i.load_program(&mut program(&[0x6A05, 0xFA15, 0x1204]).as_slice())?;
            assert_eq!(i.main_loop(Some(30))?, 30);
            assert_eq!(i.machine().timers().delay, 2);
            i.main_loop(Some(100))?;
            assert_eq!(i.machine().timers().delay, 0);
        }
        assert_eq!(display.frames, 13);
        Ok(())
    }

    #[test]
    fn test_key_wait_holds_timers_until_release() -> Result<(), Chip8Error> {
        let mut script = vec![Scripted::Idle; 40];
        script.push(Scripted::Press(7));
        script.extend(vec![Scripted::Idle; 40]);
        script.push(Scripted::Release(7));

        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&script);
        let mut sound = Mute::new();
        let mut i = Chip8Interpreter::new(config(), &mut display, &mut input, &mut sound);
        // delay = 20; V3 = key; spin
        i.load_program(&mut program(&[0x6A14, 0xFA15, 0xF30A, 0x1206]).as_slice())?;

        // waiting for a press: timers run (frames at 10, 20, 30, 40)
        i.main_loop(Some(40))?;
        assert_eq!(i.machine().timers().delay, 16);
        assert_eq!(i.machine().key_wait(), Some(KeyWait::Press));
        assert_eq!(i.machine().program_counter(), 0x204);

        // key 7 down at cycle 41; frames at 50..80 leave the timers alone
        i.main_loop(Some(41))?;
        assert_eq!(i.machine().key_wait(), Some(KeyWait::Release(7)));
        assert_eq!(i.machine().timers().delay, 16);
        assert_eq!(i.machine().register(3), 0);

        // released at cycle 82; timers resume at the frame at 90
        i.main_loop(Some(19))?;
        assert_eq!(i.machine().key_wait(), None);
        assert_eq!(i.machine().register(3), 7);
        assert_eq!(i.machine().timers().delay, 14);
        Ok(())
    }

    #[test]
    fn test_frames_are_snapshots() -> Result<(), Chip8Error> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        {
            let mut i = Chip8Interpreter::new(config(), &mut display, &mut input, &mut sound);
            // draw "0" at (0, 0) then spin
            i.load_program(&mut program(&[0xA050, 0xD005, 0x1204]).as_slice())?;
            i.main_loop(Some(10))?;
        }
        assert_eq!(display.frames, 1);
        let frame = display.last.expect("one frame was published");
        assert_eq!(frame.pixel(0, 0), 1);
        assert_eq!(frame.pixel(1, 1), 0);
        Ok(())
    }

    #[test]
    fn test_sound_follows_timer() -> Result<(), Chip8Error> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        {
            let mut i = Chip8Interpreter::new(config(), &mut display, &mut input, &mut sound);
            // sound = 2, then spin
            i.load_program(&mut program(&[0x6A02, 0xFA18, 0x1204]).as_slice())?;
            i.main_loop(Some(10))?;
        }
        assert!(sound.is_beeping());
        {
            let mut i = Chip8Interpreter::new(config(), &mut display, &mut input, &mut sound);
            i.load_program(&mut program(&[0x6A02, 0xFA18, 0x1204]).as_slice())?;
            i.main_loop(Some(20))?;
        }
        assert!(!sound.is_beeping());
        assert_eq!(sound.switches(), 2);
        Ok(())
    }

    #[test]
    fn test_host_quit() -> Result<(), Chip8Error> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[Scripted::Idle, Scripted::Idle, Scripted::Quit]);
        let mut sound = Mute::new();
        let mut i = Chip8Interpreter::new(config(), &mut display, &mut input, &mut sound);
        i.load_program(&mut program(&[0x1200]).as_slice())?;
        assert_eq!(i.main_loop(None)?, 2);
        Ok(())
    }

    #[test]
    fn test_machine_error_stops_loop() {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let mut i = Chip8Interpreter::new(config(), &mut display, &mut input, &mut sound);
        i.load_program(&mut program(&[0x6001, 0x00EE]).as_slice())
            .unwrap();
        assert!(matches!(i.main_loop(None), Err(Chip8Error::StackUnderflow)));
        assert_eq!(i.machine().register(0), 1);
    }

    #[test]
    fn test_runs_through_debugger() -> Result<(), Chip8Error> {
        let mut console: &[u8] = b"n\nc\n";
        let mut output = Vec::new();
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let debugger = Debugger::new(&mut console, &mut output, true);
        let mut i = Chip8Interpreter::new(config(), &mut display, &mut input, &mut sound)
            .with_debugger(debugger);
        i.load_program(&mut program(&[0x7001, 0x1200]).as_slice())?;
        assert_eq!(i.main_loop(Some(6))?, 6);
        assert_eq!(i.machine().register(0), 3);
        Ok(())
    }

    #[test]
    fn test_breakpoint_keeps_host_input() -> Result<(), Chip8Error> {
        // wait for a key, then spin at 204 where the breakpoint is
        let mut script = vec![Scripted::Idle; 5];
        script.push(Scripted::Press(4));
        script.extend(vec![Scripted::Idle; 5]);
        script.push(Scripted::Release(4));

        let mut console: &[u8] = b"q\n";
        let mut output = Vec::new();
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&script);
        let mut sound = Mute::new();
        {
            let mut debugger = Debugger::new(&mut console, &mut output, false);
            debugger.set_breakpoint(0x204);
            let mut i = Chip8Interpreter::new(config(), &mut display, &mut input, &mut sound)
                .with_debugger(debugger);
            i.load_program(&mut program(&[0xF00A, 0x1204, 0x1204]).as_slice())?;
            assert_eq!(i.main_loop(Some(1000))?, 13);
            assert_eq!(i.machine().program_counter(), 0x204);
            assert_eq!(i.machine().register(0), 4);
        }
        // the console had the terminal when the debugger quit
        assert!(input.is_suspended());
        assert_eq!(input.polls, 13);
        Ok(())
    }

    #[test]
    fn test_console_hands_terminal_back() -> Result<(), Chip8Error> {
        let mut console: &[u8] = b"n\nn\nc\n";
        let mut output = Vec::new();
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        {
            let debugger = Debugger::new(&mut console, &mut output, true);
            let mut i = Chip8Interpreter::new(config(), &mut display, &mut input, &mut sound)
                .with_debugger(debugger);
            i.load_program(&mut program(&[0x7001, 0x1200]).as_slice())?;
            assert_eq!(i.main_loop(Some(20))?, 20);
        }
        // no polling while the console was open, for the first three steps
        assert_eq!(input.polls, 17);
        assert!(!input.is_suspended());
        assert_eq!(display.invalidations, 1);
        assert_eq!(display.frames, 2);
        Ok(())
    }

    #[test]
    fn test_throttle_holds_rate() -> Result<(), Chip8Error> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let c = Config {
            instruction_rate: 1000,
            throttle: true,
            ..config()
        };
        let mut i = Chip8Interpreter::new(c, &mut display, &mut input, &mut sound);
        i.load_program(&mut program(&[0x1200]).as_slice())?;
        let start = Instant::now();
        i.main_loop(Some(50))?;
        assert!(start.elapsed() >= Duration::from_millis(45));
        Ok(())
    }
}
