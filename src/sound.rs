use std::error::Error;

/// the buzzer; the interpreter holds it on while the sound timer is non-zero
pub trait Sound {
    fn beep(&mut self) -> Result<(), Box<dyn Error>>;
    fn stop(&mut self) -> Result<(), Box<dyn Error>>;
    fn is_beeping(&self) -> bool;
}

/// C7, audible through most PC speakers
pub const DEFAULT_PITCH_HZ: u16 = 2093;

/// PC speaker tone via the beep crate
pub struct SimpleBeep {
    pitch: u16,
    sounding: bool,
}

impl SimpleBeep {
    pub fn new() -> Self {
        Self::with_pitch(DEFAULT_PITCH_HZ)
    }

    /// a zero pitch would be silence, so it falls back to the default
    pub fn with_pitch(pitch: u16) -> Self {
        SimpleBeep {
            pitch: if pitch == 0 { DEFAULT_PITCH_HZ } else { pitch },
            sounding: false,
        }
    }

    pub fn pitch(&self) -> u16 {
        self.pitch
    }
}

impl Default for SimpleBeep {
    fn default() -> Self {
        Self::new()
    }
}

impl Sound for SimpleBeep {
    fn beep(&mut self) -> Result<(), Box<dyn Error>> {
        beep::beep(self.pitch)?;
        self.sounding = true;
        log::trace!("beeper on at {}Hz", self.pitch);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn Error>> {
        // the beep crate treats 0Hz as off
        beep::beep(0)?;
        self.sounding = false;
        log::trace!("beeper off");
        Ok(())
    }

    fn is_beeping(&self) -> bool {
        self.sounding
    }
}

/// silence that still remembers whether it was asked to beep; used with
/// --mute, headless runs and tests
#[derive(Debug, Default)]
pub struct Mute {
    sounding: bool,
    switches: usize,
}

impl Mute {
    pub fn new() -> Self {
        Mute::default()
    }

    /// how many times the beeper has been turned on or off
    pub fn switches(&self) -> usize {
        self.switches
    }
}

impl Sound for Mute {
    fn beep(&mut self) -> Result<(), Box<dyn Error>> {
        self.sounding = true;
        self.switches += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn Error>> {
        self.sounding = false;
        self.switches += 1;
        Ok(())
    }

    fn is_beeping(&self) -> bool {
        self.sounding
    }
}
