//! Position tracking for the four axes.
//!
//! Counts are absolute steps from the last `set_position`, advanced one step
//! at a time by the interrupt in the direction of each emitted event.

use crate::config::units::{Steps, StepsPerUnit};
use crate::config::AxesConfig;
use crate::motion::{Axis, Direction, NUM_AXES};

/// Absolute step counts of every axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Position {
    counts: [i32; NUM_AXES],
}

impl Position {
    /// Create a position at the origin.
    #[inline]
    pub const fn new() -> Self {
        Self {
            counts: [0; NUM_AXES],
        }
    }

    /// Create a position from raw step counts.
    #[inline]
    pub const fn at(counts: [i32; NUM_AXES]) -> Self {
        Self { counts }
    }

    /// Get the position of one axis in steps.
    #[inline]
    pub fn steps(&self, axis: Axis) -> Steps {
        Steps(self.counts[axis.index()])
    }

    /// Get all counts.
    #[inline]
    pub fn counts(&self) -> [i32; NUM_AXES] {
        self.counts
    }

    /// Set the position of one axis.
    #[inline]
    pub fn set_steps(&mut self, axis: Axis, steps: Steps) {
        self.counts[axis.index()] = steps.0;
    }

    /// Move one axis by a single step.
    #[inline]
    pub fn step(&mut self, axis: Axis, direction: Direction) {
        let count = &mut self.counts[axis.index()];
        *count = count.wrapping_add(direction.sign());
    }

    /// Position of one axis in physical units.
    #[inline]
    pub fn units(&self, axis: Axis, steps_per_unit: StepsPerUnit) -> f32 {
        self.steps(axis).to_units(steps_per_unit)
    }

    /// Position of every axis in physical units.
    pub fn to_units(&self, axes: &AxesConfig) -> [f32; NUM_AXES] {
        let mut out = [0.0; NUM_AXES];
        for (axis, config) in axes.iter() {
            out[axis.index()] = self.units(axis, config.steps_per_unit);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_tracking() {
        let mut pos = Position::new();
        pos.step(Axis::Z, Direction::Positive);
        pos.step(Axis::Z, Direction::Positive);
        pos.step(Axis::X, Direction::Negative);

        assert_eq!(pos.steps(Axis::Z), Steps(2));
        assert_eq!(pos.steps(Axis::X), Steps(-1));
        assert_eq!(pos.counts(), [-1, 0, 2, 0]);
    }

    #[test]
    fn test_unit_conversion() {
        let mut axes = AxesConfig::default();
        axes.z.steps_per_unit = StepsPerUnit::new(400.0).unwrap();
        let pos = Position::at([10, 0, 200, 0]);

        let units = pos.to_units(&axes);
        assert!((units[Axis::Z.index()] - 0.5).abs() < 1e-6);
        assert!((units[Axis::X.index()] - 10.0).abs() < 1e-6);
    }
}
