//! # galvo-stepper
//!
//! Interrupt-driven step generation for a resin printer that steers a laser
//! with a galvanometer and moves its build platform with stepper motors.
//!
//! ## Features
//!
//! - **Trapezoidal ramps in integer math**: reciprocal lookup tables map step
//!   rates to timer intervals with no division in the interrupt
//! - **Bresenham distribution**: each axis steps exactly its planned count
//! - **Beam output**: X/Y step events move a galvo over SPI, one unit per
//!   event or as a timed continuous scan
//! - **Debounced limit switches** with sticky hit records
//! - **Independently paced secondary axis** for pressure advance
//! - **embedded-hal 1.0**: `OutputPin`, `InputPin` and `SpiDevice`
//! - **no_std compatible**: shared state uses `critical-section`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use galvo_stepper::{Axis, AxisPins, Block, MotionShared, SharedBlockQueue, StepperBuilder};
//!
//! static SHARED: MotionShared = MotionShared::new();
//! static QUEUE: SharedBlockQueue<16> = SharedBlockQueue::new();
//!
//! let config = galvo_stepper::load_config("machine.toml")?;
//! let mut stepper = StepperBuilder::new()
//!     .from_config(&config)
//!     .shared(&SHARED)
//!     .axis_pins(Axis::Z, AxisPins::step_dir(z_step, z_dir).with_enable(z_en))
//!     .endstop_pins(Axis::Z, Some(z_min), None)
//!     .galvo(spi)
//!     .clock(clock)
//!     .build()?;
//!
//! QUEUE.push(Block::from_steps([0, 0, -800, 0]))?;
//!
//! // In the timer interrupt:
//! stepper.on_timer(&mut &QUEUE, &mut timer);
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O and TOML parsing
//! - `defmt`: Derives `defmt::Format` on the public data types

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

// Core modules
pub mod config;
pub mod control;
pub mod error;
pub mod hal;
pub mod motion;
pub mod stepper;

// Re-exports for ergonomic API
pub use config::{validate_config, AxisConfig, OutputMode, StepperConfig, SystemConfig};
pub use control::{synchronize, wake_up};
pub use error::{Error, Result};
pub use motion::{
    AdvanceProfile, Axis, Block, BlockQueue, BlockSource, Direction, Kinematics, MotionPhase,
    SharedBlockQueue,
};
pub use stepper::{
    AxisPins, Diagnostics, EndstopHit, EndstopReport, MotionShared, Position, SchedulerState,
    SecondaryPacer, Stepper, StepperBuilder,
};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Unit types
pub use config::units::{DebounceSamples, StepRate, Steps, StepsPerUnit, TimerTicks};
