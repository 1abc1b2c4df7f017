/// delay and sound counters; both count down towards zero at 60Hz
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timers {
    pub delay: u8,
    pub sound: u8,
}

/// the logical rate the timers run at, whatever the instruction rate
pub const TIMER_HZ: u32 = 60;

impl Timers {
    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    pub fn sounding(&self) -> bool {
        self.sound > 0
    }
}

/// Counts executed instructions and says when a 60Hz frame has passed.
#[derive(Debug, Clone)]
pub struct FrameDivider {
    period: u32,
    count: u32,
}

impl FrameDivider {
    /// `instruction_rate` is instructions per second
    pub fn new(instruction_rate: u32) -> Self {
        FrameDivider {
            period: (instruction_rate / TIMER_HZ).max(1),
            count: 0,
        }
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    /// call once per executed instruction; true on a frame boundary
    pub fn advance(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.period {
            self.count = 0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_stops_at_zero() {
        let mut t = Timers { delay: 2, sound: 1 };
        t.tick();
        assert_eq!(t, Timers { delay: 1, sound: 0 });
        assert!(!t.sounding());
        t.tick();
        t.tick();
        assert_eq!(t, Timers { delay: 0, sound: 0 });
    }

    #[test]
    fn test_divider_period() {
        assert_eq!(FrameDivider::new(500).period(), 8);
        assert_eq!(FrameDivider::new(600).period(), 10);
        // slower than the timers themselves
        assert_eq!(FrameDivider::new(30).period(), 1);
    }

    #[test]
    fn test_divider_fires_every_period() {
        let mut d = FrameDivider::new(180);
        let fired: Vec<bool> = (0..7).map(|_| d.advance()).collect();
        assert_eq!(fired, [false, false, true, false, false, true, false]);
    }
}
