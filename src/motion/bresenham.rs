//! Multi-axis Bresenham step distribution.
//!
//! Every step event each axis adds its step count to an error term; when the
//! term goes positive the axis steps and the event count is subtracted. Over
//! a whole block each axis therefore steps exactly `steps[axis]` times, spread
//! as evenly as integer arithmetic allows.

use serde::Deserialize;

use super::axis::{Axis, AxisMask, NUM_AXES};
use super::block::Block;

/// How the raw X/Y step decisions map onto the two motors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Kinematics {
    /// Each axis drives its own motor.
    #[default]
    Cartesian,
    /// X and Y are coupled through a belt arrangement.
    CoreXy,
}

impl Kinematics {
    /// Resolve raw per-axis decisions into the axes that actually step.
    ///
    /// The coupled arrangement steps each logical axis whose term overflowed,
    /// for same-direction and opposed-direction moves alike, so both variants
    /// currently resolve identically. Motor mixing lives in the planner's
    /// step counts.
    pub fn resolve(self, raw: AxisMask) -> AxisMask {
        match self {
            Kinematics::Cartesian | Kinematics::CoreXy => raw,
        }
    }
}

/// Bresenham error terms for one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dda {
    counters: [i32; NUM_AXES],
}

impl Dda {
    /// Create zeroed counters.
    pub const fn new() -> Self {
        Self {
            counters: [0; NUM_AXES],
        }
    }

    /// Start a block: every term begins at `-(step_event_count / 2)`.
    pub fn reset(&mut self, step_event_count: u32) {
        let start = -((step_event_count >> 1) as i32);
        self.counters = [start; NUM_AXES];
    }

    /// Advance the error terms by one step event and return the stepping axes.
    pub fn step(&mut self, block: &Block, kinematics: Kinematics) -> AxisMask {
        let mut raw = AxisMask::EMPTY;
        for axis in Axis::ALL {
            let counter = &mut self.counters[axis.index()];
            *counter += block.steps_of(axis) as i32;
            raw = raw.with(axis, *counter > 0);
        }

        let stepping = kinematics.resolve(raw);
        let count = block.step_event_count as i32;
        for axis in stepping.iter() {
            self.counters[axis.index()] -= count;
        }
        stepping
    }

    /// Current error term of one axis.
    #[inline]
    pub fn counter(&self, axis: Axis) -> i32 {
        self.counters[axis.index()]
    }
}
