//! Unit tests for TOML configuration parsing.

use galvo_stepper::config::{load_config, parse_config, Drive, OutputMode};
use galvo_stepper::error::{ConfigError, Error};
use galvo_stepper::{Axis, Kinematics, StepRate, TimerTicks};

/// A full machine description: galvo on X/Y, platform on Z, paced E.
const MACHINE: &str = r#"
kinematics = "cartesian"

[stepper]
timer_frequency_hz = 2000000
max_step_frequency = 40000
double_step_rate = 10000
quad_step_rate = 20000
min_timer_interval = 100
idle_interval = 2000
settle_interval = 4000
check_endstops = true

[output]
mode = "discrete"
galvo_scalar = 45

[advance]
frequency_hz = 10000
max_pulses_per_fire = 2

[axes.x]
steps_per_unit = 14.5
drive = "beam"

[axes.y]
steps_per_unit = 14.5
drive = "beam"

[axes.z]
steps_per_unit = 4000.0
invert_dir = true
late_enable = true

[axes.z.endstop]
min = true
max = true
debounce_samples = 3

[axes.e]
steps_per_unit = 95.0
invert_step = true
"#;

#[test]
fn test_parse_full_machine() {
    let config = parse_config(MACHINE).expect("machine config should parse");

    assert_eq!(config.kinematics, Kinematics::Cartesian);
    assert_eq!(config.stepper.max_step_frequency, StepRate(40_000));
    assert_eq!(config.stepper.settle_interval, TimerTicks(4_000));
    assert_eq!(config.output.mode, OutputMode::Discrete);

    assert_eq!(config.axis(Axis::X).drive, Drive::Beam);
    assert_eq!(config.axis(Axis::Y).drive, Drive::Beam);
    assert_eq!(config.axis(Axis::Z).drive, Drive::Pulse);
    assert_eq!(config.axis(Axis::Z).steps_per_unit.value(), 4000.0);

    let z = config.axis(Axis::Z);
    assert!(z.late_enable);
    assert!(z.dir_level_negative());
    let endstop = z.endstop.expect("z endstop");
    assert!(endstop.min && endstop.max);
    assert_eq!(endstop.debounce_samples.value(), 3);

    assert!(!config.axis(Axis::E).step_active_level());
    assert_eq!(config.advance.as_ref().map(|a| a.max_pulses_per_fire), Some(2));
    assert_eq!(config.endstop_axes().collect::<Vec<_>>(), vec![Axis::Z]);
}

#[test]
fn test_partial_sections_fill_defaults() {
    let config = parse_config(
        r#"
[stepper]
idle_interval = 500

[axes.z.endstop]
"#,
    )
    .unwrap();

    assert_eq!(config.stepper.idle_interval, TimerTicks(500));
    assert_eq!(config.stepper.timer_frequency_hz, 2_000_000);
    assert_eq!(config.output.galvo_scalar, 45);

    let endstop = config.axis(Axis::Z).endstop.unwrap();
    assert!(endstop.min);
    assert!(!endstop.max);
    assert!(!endstop.inverting);
    assert_eq!(endstop.debounce_samples.value(), 2);
}

#[test]
fn test_unknown_axis_field_is_rejected() {
    let result = parse_config(
        r#"
[axes.x]
microsteps = 16
"#,
    );
    assert!(matches!(result, Err(Error::Config(ConfigError::ParseError(_)))));
}

#[test]
fn test_out_of_range_values_are_rejected_while_parsing() {
    let zero_scale = parse_config("[axes.y]\nsteps_per_unit = 0.0\n");
    assert!(matches!(zero_scale, Err(Error::Config(ConfigError::ParseError(_)))));

    let debounce = parse_config("[axes.z.endstop]\ndebounce_samples = 0\n");
    assert!(matches!(debounce, Err(Error::Config(ConfigError::ParseError(_)))));
}

#[test]
fn test_load_config_from_file() {
    let path = std::env::temp_dir().join(format!("galvo-stepper-{}.toml", std::process::id()));
    std::fs::write(&path, MACHINE).unwrap();

    let config = load_config(&path);
    std::fs::remove_file(&path).ok();

    let config = config.expect("file config should load");
    assert!(config.advance_enabled());
}

#[test]
fn test_load_missing_file() {
    let result = load_config("/nonexistent/galvo-stepper/machine.toml");
    assert!(matches!(result, Err(Error::Config(ConfigError::IoError(_)))));
}
