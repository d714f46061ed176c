//! Step timer and step-rate configuration.

use serde::Deserialize;

use super::units::{StepRate, TimerTicks};

/// Timing parameters of the step interrupt.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StepperConfig {
    /// Step timer tick frequency.
    pub timer_frequency_hz: u32,

    /// Step rates above this are clamped.
    pub max_step_frequency: StepRate,

    /// Above this rate two steps are taken per interrupt.
    pub double_step_rate: StepRate,

    /// Above this rate four steps are taken per interrupt.
    pub quad_step_rate: StepRate,

    /// Shortest interval the interrupt can sustain.
    pub min_timer_interval: TimerTicks,

    /// Re-arm interval while no block is queued.
    pub idle_interval: TimerTicks,

    /// Delay after a late enable before stepping starts.
    pub settle_interval: TimerTicks,

    /// Start with limit switch checking active.
    pub check_endstops: bool,
}

impl Default for StepperConfig {
    fn default() -> Self {
        Self {
            timer_frequency_hz: 2_000_000,
            max_step_frequency: StepRate(40_000),
            double_step_rate: StepRate(10_000),
            quad_step_rate: StepRate(20_000),
            min_timer_interval: TimerTicks(100),
            idle_interval: TimerTicks(2_000),
            settle_interval: TimerTicks(2_000),
            check_endstops: true,
        }
    }
}
