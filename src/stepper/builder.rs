//! Builder pattern for Stepper.

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;

use crate::config::{validate_config, Drive, OutputMode, SystemConfig};
use crate::error::{ConfigError, Error, Result};
use crate::hal::Clock;
use crate::motion::{Axis, StepStrategy, TrapezoidGenerator, NUM_AXES};

use super::endstop::EndstopMonitor;
use super::output::{AxisPins, OutputDriver};
use super::scheduler::Stepper;
use super::shared::MotionShared;

/// Builder for creating Stepper instances.
pub struct StepperBuilder<'a, O, I, SPI, C> {
    config: Option<SystemConfig>,
    shared: Option<&'a MotionShared>,
    pins: [AxisPins<O>; NUM_AXES],
    endstops: [(Option<I>, Option<I>); NUM_AXES],
    galvo: Option<SPI>,
    clock: Option<C>,
}

impl<'a, O, I, SPI, C> Default for StepperBuilder<'a, O, I, SPI, C>
where
    O: OutputPin,
    I: InputPin,
    SPI: SpiDevice,
    C: Clock,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, O, I, SPI, C> StepperBuilder<'a, O, I, SPI, C>
where
    O: OutputPin,
    I: InputPin,
    SPI: SpiDevice,
    C: Clock,
{
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: None,
            shared: None,
            pins: core::array::from_fn(|_| AxisPins::none()),
            endstops: core::array::from_fn(|_| (None, None)),
            galvo: None,
            clock: None,
        }
    }

    /// Use a system configuration. Defaults apply when not set.
    pub fn from_config(mut self, config: &SystemConfig) -> Self {
        self.config = Some(config.clone());
        self
    }

    /// Set the shared state the interrupt publishes to.
    pub fn shared(mut self, shared: &'a MotionShared) -> Self {
        self.shared = Some(shared);
        self
    }

    /// Set the output pins of one axis.
    pub fn axis_pins(mut self, axis: Axis, pins: AxisPins<O>) -> Self {
        self.pins[axis.index()] = pins;
        self
    }

    /// Set the limit switch inputs of one axis.
    pub fn endstop_pins(mut self, axis: Axis, min: Option<I>, max: Option<I>) -> Self {
        self.endstops[axis.index()] = (min, max);
        self
    }

    /// Set the beam positioning device.
    pub fn galvo(mut self, spi: SPI) -> Self {
        self.galvo = Some(spi);
        self
    }

    /// Set the millisecond clock used by continuous scan.
    pub fn clock(mut self, clock: C) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the Stepper.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the shared state is
    /// missing, a late-enabled axis has no enable output, a beam axis has no
    /// galvo, or continuous scan has no clock.
    pub fn build(self) -> Result<Stepper<'a, O, I, SPI, C>> {
        let config = self.config.unwrap_or_default();
        validate_config(&config)?;

        let shared = self
            .shared
            .ok_or(Error::Config(ConfigError::Missing("shared motion state")))?;

        for (axis, axis_config) in config.axes.iter() {
            if axis_config.late_enable && self.pins[axis.index()].enable.is_none() {
                return Err(Error::Config(ConfigError::LateEnableWithoutPin(axis.name())));
            }
        }

        let has_beam = config.axes.iter().any(|(_, c)| c.drive == Drive::Beam);
        if has_beam && self.galvo.is_none() {
            return Err(Error::Config(ConfigError::Missing("galvo SPI device")));
        }
        if has_beam && config.output.mode == OutputMode::ContinuousScan && self.clock.is_none() {
            return Err(Error::Config(ConfigError::Missing("clock")));
        }

        let mut endstops = EndstopMonitor::new();
        for (axis, (min, max)) in Axis::ALL.into_iter().zip(self.endstops) {
            match config.axis(axis).endstop {
                Some(ref endstop) => endstops.attach(axis, endstop, min, max),
                None if min.is_some() || max.is_some() => {
                    log::warn!("axis {} has endstop pins but no endstop section", axis.name());
                }
                None => {}
            }
        }

        let output = OutputDriver::new(
            self.pins,
            [
                config.axis(Axis::X),
                config.axis(Axis::Y),
                config.axis(Axis::Z),
                config.axis(Axis::E),
            ],
            &config.output,
            self.galvo,
            self.clock,
        );

        shared.enable_endstops(config.stepper.check_endstops);

        log::info!(
            "stepper ready: {} Hz timer, {:?} kinematics, {:?} output, advance {}",
            config.stepper.timer_frequency_hz,
            config.kinematics,
            config.output.mode,
            if config.advance_enabled() { "on" } else { "off" }
        );

        Ok(Stepper::from_parts(
            shared,
            output,
            endstops,
            StepStrategy::from_config(&config),
            TrapezoidGenerator::new(&config.stepper),
            config.stepper.idle_interval,
            config.stepper.settle_interval,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{NoClock, NoPin, NoSpi};

    type Builder<'a> = StepperBuilder<'a, NoPin, NoPin, NoSpi, NoClock>;

    #[test]
    fn test_missing_shared_state() {
        let result = Builder::new().build();
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::Missing(_)))
        ));
    }

    #[test]
    fn test_late_enable_requires_enable_pin() {
        static SHARED: MotionShared = MotionShared::new();
        let mut config = SystemConfig::default();
        config.axes.z.late_enable = true;

        let result = Builder::new()
            .from_config(&config)
            .shared(&SHARED)
            .axis_pins(Axis::Z, AxisPins::step_dir(NoPin, NoPin))
            .build();
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::LateEnableWithoutPin("Z")))
        ));

        let result = Builder::new()
            .from_config(&config)
            .shared(&SHARED)
            .axis_pins(Axis::Z, AxisPins::step_dir(NoPin, NoPin).with_enable(NoPin))
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_beam_axis_requires_galvo() {
        static SHARED: MotionShared = MotionShared::new();
        let mut config = SystemConfig::default();
        config.axes.x.drive = Drive::Beam;

        let result = Builder::new().from_config(&config).shared(&SHARED).build();
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::Missing("galvo SPI device")))
        ));

        let result = Builder::new()
            .from_config(&config)
            .shared(&SHARED)
            .galvo(NoSpi)
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_build_applies_endstop_checking() {
        static SHARED: MotionShared = MotionShared::new();
        let mut config = SystemConfig::default();
        config.stepper.check_endstops = false;

        let stepper = Builder::new().from_config(&config).shared(&SHARED).build().unwrap();
        assert!(!SHARED.endstops_enabled());
        assert_eq!(stepper.state(), crate::SchedulerState::Idle);
    }
}
