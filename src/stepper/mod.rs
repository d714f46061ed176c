//! Stepper module for galvo-stepper.
//!
//! The step interrupt scheduler, its output drivers and the state it shares
//! with background code.

mod builder;
mod endstop;
pub mod galvo;
mod output;
mod pacer;
mod position;
mod scheduler;
mod shared;

pub use builder::StepperBuilder;
pub use endstop::EndstopMonitor;
pub use galvo::{BeamAxis, Galvo};
pub use output::{AxisPins, OutputDriver, OutputStatus};
pub use pacer::{AdvanceRamp, SecondaryPacer};
pub use position::Position;
pub use scheduler::{SchedulerState, Stepper};
pub use shared::{Diagnostics, EndstopHit, EndstopReport, MotionShared};
