//! Output driver configuration.

use serde::Deserialize;

/// How beam axes follow a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Every step event moves the beam one coordinate.
    #[default]
    Discrete,
    /// The beam alternates between block start and end for a fixed window.
    ContinuousScan,
}

/// Output driver settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Emission strategy for beam axes.
    pub mode: OutputMode,

    /// Length of the scan window in continuous-scan mode.
    pub scan_window_ms: u32,

    /// Linear factor from world coordinate to device code.
    pub galvo_scalar: u16,

    /// Largest world coordinate sent to the device.
    pub max_coordinate: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::Discrete,
            scan_window_ms: 1_000,
            galvo_scalar: 45,
            max_coordinate: 0xFEFF,
        }
    }
}
