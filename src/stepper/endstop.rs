//! Debounced limit switch sampling.

use embedded_hal::digital::InputPin;

use crate::config::units::DebounceSamples;
use crate::config::EndstopConfig;
use crate::error::HardwareError;
use crate::motion::{Axis, Direction, NUM_AXES};

/// One switch input with its run of consecutive asserted samples.
struct LimitInput<I> {
    pin: I,
    streak: u8,
}

impl<I: InputPin> LimitInput<I> {
    fn sample(&mut self, inverting: bool, needed: u8) -> Result<bool, HardwareError> {
        let level = self.pin.is_high().map_err(|_| HardwareError::PinError)?;
        let asserted = level != inverting;
        self.streak = if asserted {
            self.streak.saturating_add(1).min(needed)
        } else {
            0
        };
        Ok(self.streak >= needed)
    }
}

struct AxisEndstops<I> {
    min: Option<LimitInput<I>>,
    max: Option<LimitInput<I>>,
    inverting: bool,
    samples: DebounceSamples,
}

/// Limit switches of every axis that has one.
pub struct EndstopMonitor<I> {
    axes: [Option<AxisEndstops<I>>; NUM_AXES],
}

impl<I: InputPin> EndstopMonitor<I> {
    /// Create a monitor with no switches.
    pub fn new() -> Self {
        Self {
            axes: [None, None, None, None],
        }
    }

    /// Attach the switches of one axis.
    ///
    /// Pins for sides the configuration disables are dropped.
    pub fn attach(&mut self, axis: Axis, config: &EndstopConfig, min: Option<I>, max: Option<I>) {
        let wrap = |pin: I| LimitInput { pin, streak: 0 };
        self.axes[axis.index()] = Some(AxisEndstops {
            min: min.filter(|_| config.min).map(wrap),
            max: max.filter(|_| config.max).map(wrap),
            inverting: config.inverting,
            samples: config.debounce_samples,
        });
    }

    /// Whether any switch is attached to this axis.
    pub fn has_axis(&self, axis: Axis) -> bool {
        self.axes[axis.index()]
            .as_ref()
            .is_some_and(|a| a.min.is_some() || a.max.is_some())
    }

    /// Sample the switch the axis is travelling toward.
    ///
    /// The sample updates the debounce history even when the axis is not
    /// moving; a hit is only reported while it moves.
    pub fn check(
        &mut self,
        axis: Axis,
        direction: Direction,
        moving: bool,
    ) -> Result<bool, HardwareError> {
        let Some(endstops) = self.axes[axis.index()].as_mut() else {
            return Ok(false);
        };
        let input = match direction {
            Direction::Negative => endstops.min.as_mut(),
            Direction::Positive => endstops.max.as_mut(),
        };
        let Some(input) = input else {
            return Ok(false);
        };
        let triggered = input.sample(endstops.inverting, endstops.samples.value())?;
        Ok(triggered && moving)
    }
}

impl<I: InputPin> Default for EndstopMonitor<I> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};

    fn config(samples: u8) -> EndstopConfig {
        EndstopConfig {
            debounce_samples: DebounceSamples::new(samples).unwrap(),
            ..EndstopConfig::default()
        }
    }

    #[test]
    fn test_two_sample_debounce() {
        let expectations = [
            Transaction::get(State::High),
            Transaction::get(State::Low),
            Transaction::get(State::High),
            Transaction::get(State::High),
        ];
        let pin = PinMock::new(&expectations);
        let mut monitor = EndstopMonitor::new();
        monitor.attach(Axis::Z, &config(2), Some(pin), None);

        // A single-sample glitch is ignored.
        assert_eq!(monitor.check(Axis::Z, Direction::Negative, true), Ok(false));
        assert_eq!(monitor.check(Axis::Z, Direction::Negative, true), Ok(false));
        assert_eq!(monitor.check(Axis::Z, Direction::Negative, true), Ok(false));
        assert_eq!(monitor.check(Axis::Z, Direction::Negative, true), Ok(true));

        if let Some(mut endstops) = monitor.axes[Axis::Z.index()].take() {
            endstops.min.as_mut().unwrap().pin.done();
        }
    }

    #[test]
    fn test_single_sample_and_inverting() {
        let expectations = [Transaction::get(State::Low)];
        let pin = PinMock::new(&expectations);
        let mut monitor = EndstopMonitor::new();
        let cfg = EndstopConfig {
            inverting: true,
            ..config(1)
        };
        monitor.attach(Axis::Z, &cfg, Some(pin), None);

        assert_eq!(monitor.check(Axis::Z, Direction::Negative, true), Ok(true));

        if let Some(mut endstops) = monitor.axes[Axis::Z.index()].take() {
            endstops.min.as_mut().unwrap().pin.done();
        }
    }

    #[test]
    fn test_not_moving_never_hits() {
        let expectations = [Transaction::get(State::High), Transaction::get(State::High)];
        let pin = PinMock::new(&expectations);
        let mut monitor = EndstopMonitor::new();
        monitor.attach(Axis::Z, &config(2), Some(pin), None);

        assert_eq!(monitor.check(Axis::Z, Direction::Negative, false), Ok(false));
        assert_eq!(monitor.check(Axis::Z, Direction::Negative, false), Ok(false));

        if let Some(mut endstops) = monitor.axes[Axis::Z.index()].take() {
            endstops.min.as_mut().unwrap().pin.done();
        }
    }

    #[test]
    fn test_wrong_side_is_not_sampled() {
        let pin = PinMock::new(&[]);
        let mut monitor = EndstopMonitor::new();
        monitor.attach(Axis::Z, &config(1), Some(pin), None);

        // Moving positive samples the (absent) max switch only.
        assert_eq!(monitor.check(Axis::Z, Direction::Positive, true), Ok(false));
        assert_eq!(monitor.check(Axis::X, Direction::Negative, true), Ok(false));
        assert!(monitor.has_axis(Axis::Z));
        assert!(!monitor.has_axis(Axis::X));

        if let Some(mut endstops) = monitor.axes[Axis::Z.index()].take() {
            endstops.min.as_mut().unwrap().pin.done();
        }
    }
}
