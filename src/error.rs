use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Read-delay search reached the delay cap without a matching read.
    CalibrationTimeout { lane: usize, cap: u32 },
    /// Write leveling did not find the DQS/CK crossing below the delay cap.
    LevelingFailure { lane: usize, delay: u32 },
    /// The memory test found words that did not read back as written.
    DataIntegrity { errors: u32, total: u32 },
    InvalidConfig(&'static str),
    MissingArgument(&'static str),
    ParseError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            &Error::CalibrationTimeout { lane, cap } =>
                write!(f, "no valid read delay for module {} below {} taps", lane, cap),
            &Error::LevelingFailure { lane, delay } =>
                write!(f, "write leveling failed for module {} at {} taps", lane, delay),
            &Error::DataIntegrity { errors, total } =>
                write!(f, "{}/{} words incorrect", errors, total),
            &Error::InvalidConfig(reason) =>
                write!(f, "invalid PHY configuration: {}", reason),
            &Error::MissingArgument(usage) =>
                write!(f, "{}", usage),
            &Error::ParseError =>
                write!(f, "invalid integer"),
        }
    }
}
