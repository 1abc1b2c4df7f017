use crate::machine::QuirkMode;

/// instructions per second when nothing else is asked for
pub const DEFAULT_INSTRUCTION_RATE: u32 = 500;

/// How the interpreter should run; built from the command line by the binary.
#[derive(Debug, Clone)]
pub struct Config {
    /// instructions per second
    pub instruction_rate: u32,
    pub quirks: QuirkMode,
    /// fixed seed for CXNN; entropy when None
    pub seed: Option<u64>,
    /// sleep between instructions to hold `instruction_rate`; off for tests
    pub throttle: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            instruction_rate: DEFAULT_INSTRUCTION_RATE,
            quirks: QuirkMode::default(),
            seed: None,
            throttle: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = Config::default();
        assert_eq!(c.instruction_rate, 500);
        assert_eq!(c.quirks, QuirkMode::Modern);
        assert!(c.throttle);
        assert_eq!(c.seed, None);
    }
}
