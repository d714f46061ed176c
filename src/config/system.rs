//! System configuration - root configuration structure.

use serde::Deserialize;

use crate::motion::{Axis, Kinematics};

use super::axis::AxisConfig;
use super::output::OutputConfig;
use super::stepper::StepperConfig;

/// Secondary-axis pacer settings. Present in the configuration means enabled.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdvanceConfig {
    /// Fixed firing rate of the pacer timer.
    pub frequency_hz: u32,

    /// Upper bound on pulses emitted per pacer firing.
    pub max_pulses_per_fire: u8,
}

impl Default for AdvanceConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 10_000,
            max_pulses_per_fire: 4,
        }
    }
}

/// Configuration of the four axes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AxesConfig {
    /// X axis.
    pub x: AxisConfig,
    /// Y axis.
    pub y: AxisConfig,
    /// Z axis.
    pub z: AxisConfig,
    /// E axis.
    pub e: AxisConfig,
}

impl AxesConfig {
    /// Configuration of one axis.
    pub fn get(&self, axis: Axis) -> &AxisConfig {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
            Axis::E => &self.e,
        }
    }

    /// Iterate `(axis, config)` pairs in array order.
    pub fn iter(&self) -> impl Iterator<Item = (Axis, &AxisConfig)> {
        Axis::ALL.into_iter().map(move |a| (a, self.get(a)))
    }
}

/// Root configuration structure from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SystemConfig {
    /// Step timer and rate limits.
    #[serde(default)]
    pub stepper: StepperConfig,

    /// Resolution rule for the X/Y step decisions.
    #[serde(default)]
    pub kinematics: Kinematics,

    /// Output driver settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Secondary-axis pacing (disabled when absent).
    #[serde(default)]
    pub advance: Option<AdvanceConfig>,

    /// Per-axis settings.
    #[serde(default)]
    pub axes: AxesConfig,
}

impl SystemConfig {
    /// Get an axis configuration.
    pub fn axis(&self, axis: Axis) -> &AxisConfig {
        self.axes.get(axis)
    }

    /// Whether the secondary axis is paced by its own timer.
    pub fn advance_enabled(&self) -> bool {
        self.advance.is_some()
    }

    /// Axes that have a limit switch configured.
    pub fn endstop_axes(&self) -> impl Iterator<Item = Axis> + '_ {
        self.axes
            .iter()
            .filter(|(_, c)| c.endstop.is_some())
            .map(|(a, _)| a)
    }
}
