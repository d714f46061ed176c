//! Motion module for galvo-stepper.
//!
//! Blocks, rate generation, step distribution and per-block execution state.
//! Nothing here touches hardware.

mod axis;
mod block;
mod bresenham;
mod executor;
pub mod speed_table;
mod strategy;
mod trapezoid;

pub use axis::{Axis, AxisMask, Direction, NUM_AXES};
pub use block::{AdvanceProfile, Block, BlockQueue, BlockSource, SharedBlockQueue};
pub use bresenham::{Dda, Kinematics};
pub use executor::BlockExecutor;
pub use speed_table::SpeedTable;
pub use strategy::{SecondaryDrive, StepStrategy};
pub use trapezoid::{MotionPhase, StepTiming, TrapezoidGenerator};
