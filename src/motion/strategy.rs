//! Stepping strategy selected once from validated configuration.
//!
//! Configuration-dependent behavior (coupled kinematics, late enable,
//! independently paced secondary axis) is resolved here at startup so the
//! interrupt only consults plain flags.

use crate::config::SystemConfig;

use super::axis::{Axis, AxisMask};
use super::block::Block;
use super::bresenham::Kinematics;

/// How secondary-axis step events reach the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SecondaryDrive {
    /// Pulsed inline with the other axes.
    Inline,
    /// Queued for the pacer interrupt.
    Paced,
}

/// Resolved stepping behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepStrategy {
    /// X/Y resolution rule.
    pub kinematics: Kinematics,
    /// Secondary-axis delivery.
    pub secondary: SecondaryDrive,
    /// Axes enabled at block load with a settle delay before stepping.
    pub late_enable: AxisMask,
}

impl StepStrategy {
    /// Resolve the strategy for a configuration.
    pub fn from_config(config: &SystemConfig) -> Self {
        let late_enable = config
            .axes
            .iter()
            .fold(AxisMask::EMPTY, |mask, (axis, c)| mask.with(axis, c.late_enable));

        Self {
            kinematics: config.kinematics,
            secondary: if config.advance_enabled() {
                SecondaryDrive::Paced
            } else {
                SecondaryDrive::Inline
            },
            late_enable,
        }
    }

    /// Whether loading this block needs a settle delay.
    #[inline]
    pub fn needs_settle(&self, block: &Block) -> bool {
        block.moving_axes().intersects(self.late_enable)
    }

    /// Whether step events of this axis go to the pacer.
    #[inline]
    pub fn is_paced(&self, axis: Axis) -> bool {
        axis == Axis::E && self.secondary == SecondaryDrive::Paced
    }
}
