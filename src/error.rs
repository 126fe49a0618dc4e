//! Error types for stepper-control.
//!
//! Every fallible operation returns [`Result`]; the error kinds mirror the
//! negative-errno taxonomy commonly used by stepper driver stacks.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all stepper-control operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Optional operation not supported by this backend.
    NotImplemented,
    /// An argument was rejected (zero rate, bad resolution, ...).
    InvalidArgument(InvalidArgument),
    /// Motion command issued while the stepper is disabled.
    Canceled,
    /// Hardware transport failure (pin write, timer programming).
    Io,
    /// Underlying device or motion plan not initialized.
    NotReady,
}

/// Detail for [`Error::InvalidArgument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidArgument {
    /// Acceleration rate of zero cannot produce a start interval.
    ZeroAccelerationRate,
    /// Deceleration rate of zero cannot produce a stop plan.
    ZeroDecelerationRate,
    /// Step interval of zero does not describe a velocity.
    ZeroInterval,
    /// Micro-step resolution is not a power of two in 1..=256.
    InvalidMicrosteps(u16),
    /// Absolute move target is farther than i32 micro-steps away.
    TargetOutOfRange,
    /// Named controller missing from the configuration.
    ControllerNotFound(heapless::String<32>),
    /// Failed to parse TOML configuration.
    ParseError(heapless::String<128>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotImplemented => write!(f, "Operation not implemented"),
            Error::InvalidArgument(e) => write!(f, "Invalid argument: {}", e),
            Error::Canceled => write!(f, "Motion canceled: stepper is disabled"),
            Error::Io => write!(f, "Hardware I/O error"),
            Error::NotReady => write!(f, "Device or motion plan not initialized"),
        }
    }
}

impl fmt::Display for InvalidArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidArgument::ZeroAccelerationRate => {
                write!(f, "acceleration rate cannot be zero")
            }
            InvalidArgument::ZeroDecelerationRate => {
                write!(f, "deceleration rate cannot be zero")
            }
            InvalidArgument::ZeroInterval => write!(f, "step interval cannot be zero"),
            InvalidArgument::InvalidMicrosteps(v) => {
                write!(
                    f,
                    "invalid micro-step resolution: {}. Valid values: 1, 2, 4, 8, 16, 32, 64, 128, 256",
                    v
                )
            }
            InvalidArgument::TargetOutOfRange => {
                write!(f, "move target exceeds the i32 micro-step range")
            }
            InvalidArgument::ControllerNotFound(name) => {
                write!(f, "controller '{}' not found", name)
            }
            InvalidArgument::ParseError(msg) => write!(f, "parse error: {}", msg),
        }
    }
}

impl From<InvalidArgument> for Error {
    fn from(e: InvalidArgument) -> Self {
        Error::InvalidArgument(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for InvalidArgument {}
