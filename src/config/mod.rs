//! Configuration module for galvo-stepper.
//!
//! Provides types for loading and validating step timer, output and axis
//! configuration from TOML files (with `std` feature) or values built in code.

mod axis;
#[cfg(feature = "std")]
mod loader;
mod output;
mod stepper;
mod system;
pub mod units;
mod validation;

pub use axis::{AxisConfig, Drive, EndstopConfig};
pub use output::{OutputConfig, OutputMode};
pub use stepper::StepperConfig;
pub use system::{AdvanceConfig, AxesConfig, SystemConfig};
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{DebounceSamples, StepRate, Steps, StepsPerUnit, TimerTicks};
