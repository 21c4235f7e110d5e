//! Unified error types for the board HAL.
//!
//! A single `Error` enum that every driver can convert into, keeping the
//! main loop's error handling uniform.  All variants are `Copy` so they can
//! be passed through bus callbacks and logged without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level HAL error
// ---------------------------------------------------------------------------

/// Every fallible operation in the HAL funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid (rejected at construction).
    Config(&'static str),
    /// The notification bus refused a registration.
    Bus(BusError),
    /// The timer service refused a schedule.
    Timer(TimerError),
    /// An I2C transaction failed after recovery.
    I2c(I2cError),
    /// A radio frame could not be built, sent or decoded.
    Radio(RadioError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Timer(e) => write!(f, "timer: {e}"),
            Self::I2c(e) => write!(f, "i2c: {e}"),
            Self::Radio(e) => write!(f, "radio: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Every listener slot is taken.
    Full,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "listener table full"),
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Timer errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// Every timer slot is taken.
    Full,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "timer table full"),
        }
    }
}

impl From<TimerError> for Error {
    fn from(e: TimerError) -> Self {
        Self::Timer(e)
    }
}

// ---------------------------------------------------------------------------
// I2C errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2cError {
    /// The transaction kept failing after every allowed recovery cycle.
    RetriesExhausted,
    /// Bus recovery itself failed (peripheral could not be re-enabled).
    RecoveryFailed,
}

impl fmt::Display for I2cError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetriesExhausted => write!(f, "retries exhausted"),
            Self::RecoveryFailed => write!(f, "bus recovery failed"),
        }
    }
}

impl From<I2cError> for Error {
    fn from(e: I2cError) -> Self {
        Self::I2c(e)
    }
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        embedded_hal::i2c::ErrorKind::Other
    }
}

// ---------------------------------------------------------------------------
// Radio errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// Frame shorter than its header, or length byte disagrees with the data.
    Truncated,
    /// Header carries an unsupported version.
    BadVersion(u8),
    /// Frame belongs to another protocol on the same radio.
    WrongProtocol(u8),
    /// Payload could not be encoded or decoded.
    Codec,
    /// The radio driver refused the frame.
    SendFailed,
}

impl fmt::Display for RadioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated => write!(f, "frame truncated"),
            Self::BadVersion(v) => write!(f, "unsupported frame version {v}"),
            Self::WrongProtocol(p) => write!(f, "unexpected protocol {p}"),
            Self::Codec => write!(f, "payload codec error"),
            Self::SendFailed => write!(f, "send failed"),
        }
    }
}

impl From<RadioError> for Error {
    fn from(e: RadioError) -> Self {
        Self::Radio(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// HAL-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
