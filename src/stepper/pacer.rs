//! Independently paced secondary axis.
//!
//! With pressure advance the secondary axis is not pulsed inline. The step
//! interrupt adds its step events, plus changes in the advance offset, to a
//! signed pending count in [`MotionShared`]; a second, fixed-rate interrupt
//! drains a few pulses per firing.

use critical_section::CriticalSection;
use embedded_hal::digital::OutputPin;

use crate::config::{AdvanceConfig, AxisConfig, TimerTicks};
use crate::error::HardwareError;
use crate::hal::OneShotTimer;
use crate::motion::{Block, Direction};

use super::output::{AxisOutput, AxisPins};
use super::shared::MotionShared;

/// Advance offset ramp, run in step-interrupt context.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdvanceRamp {
    advance: i32,
    final_advance: i32,
    peak: i32,
    rate: i32,
    // Whole steps already queued for the offset; persists across blocks.
    old_advance: i32,
}

impl AdvanceRamp {
    /// Create a ramp with no offset.
    pub const fn new() -> Self {
        Self {
            advance: 0,
            final_advance: 0,
            peak: 0,
            rate: 0,
            old_advance: 0,
        }
    }

    /// Start a block's ramp and queue the change in offset.
    pub fn reset(&mut self, cs: CriticalSection<'_>, shared: &MotionShared, block: &Block) {
        self.advance = block.advance.initial;
        self.final_advance = block.advance.final_advance;
        self.peak = block.advance.peak.max(block.advance.initial);
        self.rate = block.advance.rate;
        self.publish(cs, shared);
    }

    /// Raise the offset once per step event of the firing, up to the peak.
    pub fn accelerate(&mut self, cs: CriticalSection<'_>, shared: &MotionShared, step_loops: u8) {
        self.advance = self
            .advance
            .saturating_add(self.rate.saturating_mul(step_loops as i32))
            .min(self.peak);
        self.publish(cs, shared);
    }

    /// Lower the offset once per step event of the firing, down to the final value.
    pub fn decelerate(&mut self, cs: CriticalSection<'_>, shared: &MotionShared, step_loops: u8) {
        self.advance = self
            .advance
            .saturating_sub(self.rate.saturating_mul(step_loops as i32))
            .max(self.final_advance);
        self.publish(cs, shared);
    }

    /// Stop ramping after a hard abort.
    ///
    /// The whole steps already queued for the offset are kept, so the next
    /// block's reset retracts them.
    pub fn halt(&mut self) {
        self.advance = 0;
        self.final_advance = 0;
        self.peak = 0;
        self.rate = 0;
    }

    /// Queue one secondary-axis step event.
    #[inline]
    pub fn queue_step(&self, cs: CriticalSection<'_>, shared: &MotionShared, direction: Direction) {
        shared.queue_secondary(cs, direction.sign());
    }

    /// Current offset, 8.8 fixed point.
    #[inline]
    pub fn advance(&self) -> i32 {
        self.advance
    }

    fn publish(&mut self, cs: CriticalSection<'_>, shared: &MotionShared) {
        let whole = self.advance >> 8;
        shared.queue_secondary(cs, whole - self.old_advance);
        self.old_advance = whole;
    }
}

/// Fixed-rate interrupt that pulses the secondary axis.
pub struct SecondaryPacer<'a, O> {
    shared: &'a MotionShared,
    output: AxisOutput<O>,
    max_pulses_per_fire: u8,
    interval: TimerTicks,
}

impl<'a, O: OutputPin> SecondaryPacer<'a, O> {
    /// Create a pacer for the secondary axis.
    ///
    /// `timer_frequency_hz` is the tick rate of the pacer's own timer.
    pub fn new(
        shared: &'a MotionShared,
        step: Option<O>,
        dir: Option<O>,
        axis: &AxisConfig,
        config: &AdvanceConfig,
        timer_frequency_hz: u32,
    ) -> Self {
        let ticks = timer_frequency_hz / config.frequency_hz.max(1);
        Self {
            shared,
            output: AxisOutput::new(
                AxisPins {
                    step,
                    dir,
                    enable: None,
                },
                axis,
            ),
            max_pulses_per_fire: config.max_pulses_per_fire,
            interval: TimerTicks(ticks.clamp(1, u16::MAX as u32) as u16),
        }
    }

    /// Interval the pacer timer is re-armed with.
    #[inline]
    pub fn interval(&self) -> TimerTicks {
        self.interval
    }

    /// Emit up to `max_pulses_per_fire` pending pulses.
    ///
    /// Returns the number of pulses emitted. Pin failures are counted in the
    /// shared diagnostics.
    pub fn fire(&mut self) -> u8 {
        critical_section::with(|cs| {
            let mut emitted = 0;
            while emitted < self.max_pulses_per_fire {
                let Some(direction) = self.shared.take_secondary_step(cs) else {
                    break;
                };
                if self.pulse(direction).is_err() {
                    self.shared.note_pin_fault(cs);
                }
                emitted += 1;
            }
            emitted
        })
    }

    /// Interrupt entry point: fire, then re-arm the pacer timer.
    pub fn on_timer<T: OneShotTimer>(&mut self, timer: &mut T) -> u8 {
        let emitted = self.fire();
        timer.arm(self.interval);
        emitted
    }

    fn pulse(&mut self, direction: Direction) -> Result<(), HardwareError> {
        self.output.set_direction(direction)?;
        self.output.pulse()
    }
}
