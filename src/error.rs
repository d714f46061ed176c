//! Error types for galvo-stepper.
//!
//! Errors only surface from background-context operations (configuration,
//! building, queueing blocks, direct beam moves). The step interrupt never
//! returns an error; it clamps and records diagnostics instead.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all galvo-stepper operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Pin or bus operation error
    Hardware(HardwareError),
    /// Block or queue error
    Motion(MotionError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Timer frequency cannot be represented by the reciprocal tables
    InvalidTimerFrequency(u32),
    /// Step-rate thresholds are not ordered `double < quad <= max`
    InvalidStepThresholds {
        /// Rate above which two steps are taken per tick
        double: u32,
        /// Rate above which four steps are taken per tick
        quad: u32,
        /// Maximum step frequency
        max: u32,
    },
    /// A timer interval is zero
    InvalidInterval(&'static str),
    /// Debounce sample count outside 1..=8
    InvalidDebounce(u8),
    /// Steps per unit must be finite and > 0
    InvalidStepsPerUnit(f32),
    /// Galvo scalar must be > 0
    InvalidGalvoScalar(u16),
    /// Pacer frequency must be > 0
    InvalidPacerFrequency(u32),
    /// Beam drive requested on an axis the galvo cannot position
    InvalidDrive(&'static str),
    /// Late enable requested on an axis with no enable output
    LateEnableWithoutPin(&'static str),
    /// Required builder input missing
    Missing(&'static str),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Hardware errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareError {
    /// GPIO pin operation failed
    PinError,
    /// SPI transfer to the beam positioning device failed
    BusError,
}

/// Block and queue errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionError {
    /// Block violates the phase or rate ordering
    InvalidBlock(&'static str),
    /// Block queue is full
    QueueFull,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Hardware(e) => write!(f, "Hardware error: {}", e),
            Error::Motion(e) => write!(f, "Motion error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidTimerFrequency(hz) => write!(
                f,
                "Invalid timer frequency: {} Hz. Must be a multiple of 62500 in 500000..=2000000",
                hz
            ),
            ConfigError::InvalidStepThresholds { double, quad, max } => write!(
                f,
                "Invalid step thresholds: double ({}) < quad ({}) <= max ({}) does not hold",
                double, quad, max
            ),
            ConfigError::InvalidInterval(which) => write!(f, "Invalid {}: must be > 0", which),
            ConfigError::InvalidDebounce(n) => {
                write!(f, "Invalid debounce sample count: {}. Must be 1-8", n)
            }
            ConfigError::InvalidStepsPerUnit(v) => {
                write!(f, "Invalid steps per unit: {}. Must be > 0", v)
            }
            ConfigError::InvalidGalvoScalar(v) => write!(f, "Invalid galvo scalar: {}", v),
            ConfigError::InvalidPacerFrequency(v) => {
                write!(f, "Invalid pacer frequency: {} Hz", v)
            }
            ConfigError::InvalidDrive(axis) => {
                write!(f, "Axis {} cannot use beam drive, only X and Y can", axis)
            }
            ConfigError::LateEnableWithoutPin(axis) => {
                write!(f, "Axis {} uses late enable but has no enable output", axis)
            }
            ConfigError::Missing(what) => write!(f, "{} is required", what),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for HardwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HardwareError::PinError => write!(f, "GPIO pin operation failed"),
            HardwareError::BusError => write!(f, "SPI transfer failed"),
        }
    }
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionError::InvalidBlock(why) => write!(f, "Invalid block: {}", why),
            MotionError::QueueFull => write!(f, "Block queue is full"),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<HardwareError> for Error {
    fn from(e: HardwareError) -> Self {
        Error::Hardware(e)
    }
}

impl From<MotionError> for Error {
    fn from(e: MotionError) -> Self {
        Error::Motion(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for HardwareError {}

#[cfg(feature = "std")]
impl std::error::Error for MotionError {}
