//! Configuration validation.

use crate::error::{ConfigError, Error, Result};
use crate::motion::speed_table::SpeedTable;
use crate::motion::Axis;

use super::{AxisConfig, Drive, OutputConfig, StepperConfig, SystemConfig};

/// Validate a system configuration.
///
/// Checks:
/// - The timer frequency can be served by the reciprocal tables
/// - Step-rate thresholds are ordered
/// - Timer intervals are non-zero
/// - Galvo scalar and pacer frequency are usable
/// - Axis scaling is positive
/// - Beam drive is only used on X and Y
pub fn validate_config(config: &SystemConfig) -> Result<()> {
    validate_stepper(&config.stepper)?;
    validate_output(&config.output)?;

    if let Some(ref advance) = config.advance {
        if advance.frequency_hz == 0 || advance.max_pulses_per_fire == 0 {
            return Err(Error::Config(ConfigError::InvalidPacerFrequency(
                advance.frequency_hz,
            )));
        }
    }

    for (axis, axis_config) in config.axes.iter() {
        validate_axis(axis_config)?;
        if axis_config.drive == Drive::Beam && !matches!(axis, Axis::X | Axis::Y) {
            return Err(Error::Config(ConfigError::InvalidDrive(axis.name())));
        }
    }

    Ok(())
}

fn validate_stepper(config: &StepperConfig) -> Result<()> {
    if !SpeedTable::supports(config.timer_frequency_hz) {
        return Err(Error::Config(ConfigError::InvalidTimerFrequency(
            config.timer_frequency_hz,
        )));
    }

    let double = config.double_step_rate.0;
    let quad = config.quad_step_rate.0;
    let max = config.max_step_frequency.0;
    // The pre-division rate must stay inside the fast table.
    if !(double < quad && quad <= max) || max > u16::MAX as u32 {
        return Err(Error::Config(ConfigError::InvalidStepThresholds { double, quad, max }));
    }

    for (value, name) in [
        (config.min_timer_interval.0, "min_timer_interval"),
        (config.idle_interval.0, "idle_interval"),
        (config.settle_interval.0, "settle_interval"),
    ] {
        if value == 0 {
            return Err(Error::Config(ConfigError::InvalidInterval(name)));
        }
    }

    Ok(())
}

fn validate_output(config: &OutputConfig) -> Result<()> {
    if config.galvo_scalar == 0 {
        return Err(Error::Config(ConfigError::InvalidGalvoScalar(
            config.galvo_scalar,
        )));
    }
    if config.scan_window_ms == 0 {
        return Err(Error::Config(ConfigError::InvalidInterval("scan_window_ms")));
    }
    Ok(())
}

fn validate_axis(config: &AxisConfig) -> Result<()> {
    // Re-check in case the config was built in code rather than parsed.
    super::units::StepsPerUnit::new(config.steps_per_unit.value())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::units::StepRate;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&SystemConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_timer_frequency() {
        let mut config = SystemConfig::default();
        config.stepper.timer_frequency_hz = 16_000_000;

        let result = validate_config(&config);
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidTimerFrequency(16_000_000)))
        ));
    }

    #[test]
    fn test_unordered_thresholds() {
        let mut config = SystemConfig::default();
        config.stepper.double_step_rate = StepRate(30_000);

        assert!(matches!(
            validate_config(&config),
            Err(Error::Config(ConfigError::InvalidStepThresholds { .. }))
        ));
    }

    #[test]
    fn test_beam_drive_on_z_is_rejected() {
        let mut config = SystemConfig::default();
        config.axes.z.drive = Drive::Beam;

        assert!(matches!(
            validate_config(&config),
            Err(Error::Config(ConfigError::InvalidDrive("Z")))
        ));
    }
}
