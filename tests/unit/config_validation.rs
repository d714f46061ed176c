//! Unit tests for configuration validation.

use galvo_stepper::config::{parse_config, validate_config, AdvanceConfig, Drive, SystemConfig};
use galvo_stepper::error::{ConfigError, Error};
use galvo_stepper::{StepRate, TimerTicks};

fn assert_config_error(config: &SystemConfig, check: impl Fn(&ConfigError) -> bool) {
    match validate_config(config) {
        Err(Error::Config(ref e)) if check(e) => {}
        other => panic!("unexpected validation result: {other:?}"),
    }
}

#[test]
fn test_default_config_passes_validation() {
    assert!(validate_config(&SystemConfig::default()).is_ok());
}

#[test]
fn test_supported_timer_frequencies() {
    for hz in [500_000, 1_000_000, 2_000_000] {
        let mut config = SystemConfig::default();
        config.stepper.timer_frequency_hz = hz;
        assert!(validate_config(&config).is_ok(), "{hz} Hz should be accepted");
    }

    let mut config = SystemConfig::default();
    config.stepper.timer_frequency_hz = 1_500_001;
    assert_config_error(&config, |e| {
        matches!(e, ConfigError::InvalidTimerFrequency(1_500_001))
    });
}

#[test]
fn test_max_step_frequency_must_fit_tables() {
    let mut config = SystemConfig::default();
    config.stepper.max_step_frequency = StepRate(70_000);
    assert_config_error(&config, |e| {
        matches!(e, ConfigError::InvalidStepThresholds { max: 70_000, .. })
    });
}

#[test]
fn test_zero_intervals_are_rejected() {
    let mut config = SystemConfig::default();
    config.stepper.settle_interval = TimerTicks(0);
    assert_config_error(&config, |e| {
        matches!(e, ConfigError::InvalidInterval("settle_interval"))
    });
}

#[test]
fn test_zero_galvo_scalar_is_rejected() {
    let mut config = SystemConfig::default();
    config.output.galvo_scalar = 0;
    assert_config_error(&config, |e| matches!(e, ConfigError::InvalidGalvoScalar(0)));
}

#[test]
fn test_pacer_needs_a_rate() {
    let mut config = SystemConfig::default();
    config.advance = Some(AdvanceConfig {
        frequency_hz: 0,
        max_pulses_per_fire: 4,
    });
    assert_config_error(&config, |e| matches!(e, ConfigError::InvalidPacerFrequency(0)));
}

#[test]
fn test_beam_drive_only_on_galvo_axes() {
    let mut config = SystemConfig::default();
    config.axes.e.drive = Drive::Beam;
    assert_config_error(&config, |e| matches!(e, ConfigError::InvalidDrive("E")));

    let parsed = parse_config("[axes.z]\ndrive = \"beam\"\n");
    assert!(matches!(
        parsed,
        Err(Error::Config(ConfigError::InvalidDrive("Z")))
    ));
}
