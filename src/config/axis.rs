//! Per-axis configuration from TOML.

use serde::Deserialize;

use super::units::{DebounceSamples, StepsPerUnit};

/// How an axis turns step events into physical motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Drive {
    /// One pulse on the STEP output per event.
    #[default]
    Pulse,
    /// One coordinate increment on the beam positioning device per event.
    Beam,
}

/// Limit switch wiring for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndstopConfig {
    /// Switch reads low when triggered.
    #[serde(default)]
    pub inverting: bool,

    /// Check the min switch while moving negative.
    #[serde(default = "default_true")]
    pub min: bool,

    /// Check the max switch while moving positive.
    #[serde(default)]
    pub max: bool,

    /// Consecutive asserted samples required for a hit.
    #[serde(default)]
    pub debounce_samples: DebounceSamples,
}

impl Default for EndstopConfig {
    fn default() -> Self {
        Self {
            inverting: false,
            min: true,
            max: false,
            debounce_samples: DebounceSamples::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Complete axis configuration from TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisConfig {
    /// Steps per physical unit, used for reporting positions.
    #[serde(default)]
    pub steps_per_unit: StepsPerUnit,

    /// Output kind.
    #[serde(default)]
    pub drive: Drive,

    /// Invert direction pin logic.
    #[serde(default)]
    pub invert_dir: bool,

    /// STEP pin idles high and pulses low.
    #[serde(default)]
    pub invert_step: bool,

    /// Enable line is active high (most drivers are active low).
    #[serde(default)]
    pub enable_active_high: bool,

    /// Wait for the driver to settle after enabling before the first step.
    #[serde(default)]
    pub late_enable: bool,

    /// Optional limit switch.
    #[serde(default)]
    pub endstop: Option<EndstopConfig>,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            steps_per_unit: StepsPerUnit::default(),
            drive: Drive::Pulse,
            invert_dir: false,
            invert_step: false,
            enable_active_high: false,
            late_enable: false,
            endstop: None,
        }
    }
}

impl AxisConfig {
    /// Direction pin level for a negative move.
    #[inline]
    pub fn dir_level_negative(&self) -> bool {
        self.invert_dir
    }

    /// STEP pin level while a pulse is active.
    #[inline]
    pub fn step_active_level(&self) -> bool {
        !self.invert_step
    }
}
