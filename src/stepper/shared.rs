//! State shared between the step interrupt and background code.
//!
//! Every field sits behind a [`critical_section::Mutex`]. The interrupt
//! accesses it with the token of the critical section its whole tick runs in;
//! background methods open their own short section, so a reader never sees a
//! half-updated position or a hit flag without its recorded position.

use core::cell::Cell;
use core::fmt;

use critical_section::{CriticalSection, Mutex};

use crate::config::units::{StepRate, Steps};
use crate::config::AxesConfig;
use crate::motion::{Axis, Direction, NUM_AXES};

use super::position::Position;

/// A limit switch hit and where it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EndstopHit {
    /// Axis whose switch triggered.
    pub axis: Axis,
    /// Axis position when the hit was detected.
    pub position: Steps,
}

/// Human-readable summary of endstop hits in physical units.
#[derive(Debug, Clone, PartialEq)]
pub struct EndstopReport {
    hits: heapless::Vec<(Axis, f32), NUM_AXES>,
}

impl EndstopReport {
    /// Hits as `(axis, position in units)`.
    pub fn hits(&self) -> &[(Axis, f32)] {
        &self.hits
    }

    /// Position of the hit on one axis, if any.
    pub fn position_of(&self, axis: Axis) -> Option<f32> {
        self.hits.iter().find(|(a, _)| *a == axis).map(|(_, p)| *p)
    }
}

impl fmt::Display for EndstopReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "endstops hit:")?;
        for (axis, position) in self.hits.iter() {
            write!(f, " {}:{:.3}", axis.name(), position)?;
        }
        Ok(())
    }
}

/// Timing and hardware faults observed by the interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Diagnostics {
    /// Firings whose interval was raised to the minimum.
    pub saturation_count: u32,
    /// Requested rate of the latest saturated firing.
    pub last_saturated_rate: Option<StepRate>,
    /// Pin or bus writes that failed inside the interrupt.
    pub pin_faults: u32,
}

impl Diagnostics {
    const fn new() -> Self {
        Self {
            saturation_count: 0,
            last_saturated_rate: None,
            pin_faults: 0,
        }
    }

    /// Whether nothing has been recorded.
    pub fn is_clear(&self) -> bool {
        self.saturation_count == 0 && self.pin_faults == 0
    }
}

/// Shared motion state. Place one in a `static`.
pub struct MotionShared {
    position: Mutex<Cell<Position>>,
    endstop_hits: Mutex<Cell<[Option<Steps>; NUM_AXES]>>,
    check_endstops: Mutex<Cell<bool>>,
    diagnostics: Mutex<Cell<Diagnostics>>,
    pending_secondary: Mutex<Cell<i32>>,
}

impl MotionShared {
    /// Create cleared state with endstop checking enabled.
    pub const fn new() -> Self {
        Self {
            position: Mutex::new(Cell::new(Position::new())),
            endstop_hits: Mutex::new(Cell::new([None; NUM_AXES])),
            check_endstops: Mutex::new(Cell::new(true)),
            diagnostics: Mutex::new(Cell::new(Diagnostics::new())),
            pending_secondary: Mutex::new(Cell::new(0)),
        }
    }

    // Interrupt side. Callers already hold a critical section.

    pub(crate) fn step_position(&self, cs: CriticalSection<'_>, axis: Axis, direction: Direction) {
        let cell = self.position.borrow(cs);
        let mut position = cell.get();
        position.step(axis, direction);
        cell.set(position);
    }

    pub(crate) fn endstops_enabled_in(&self, cs: CriticalSection<'_>) -> bool {
        self.check_endstops.borrow(cs).get()
    }

    pub(crate) fn record_endstop_hit(&self, cs: CriticalSection<'_>, axis: Axis) {
        let at = self.position.borrow(cs).get().steps(axis);
        let cell = self.endstop_hits.borrow(cs);
        let mut hits = cell.get();
        hits[axis.index()] = Some(at);
        cell.set(hits);
    }

    pub(crate) fn note_saturation(&self, cs: CriticalSection<'_>, rate: StepRate) {
        let cell = self.diagnostics.borrow(cs);
        let mut diag = cell.get();
        diag.saturation_count = diag.saturation_count.saturating_add(1);
        diag.last_saturated_rate = Some(rate);
        cell.set(diag);
    }

    pub(crate) fn note_pin_fault(&self, cs: CriticalSection<'_>) {
        let cell = self.diagnostics.borrow(cs);
        let mut diag = cell.get();
        diag.pin_faults = diag.pin_faults.saturating_add(1);
        cell.set(diag);
    }

    pub(crate) fn queue_secondary(&self, cs: CriticalSection<'_>, delta: i32) {
        let cell = self.pending_secondary.borrow(cs);
        cell.set(cell.get().saturating_add(delta));
    }

    pub(crate) fn take_secondary_step(&self, cs: CriticalSection<'_>) -> Option<Direction> {
        let cell = self.pending_secondary.borrow(cs);
        let pending = cell.get();
        match pending {
            0 => None,
            p if p < 0 => {
                cell.set(p + 1);
                Some(Direction::Negative)
            }
            p => {
                cell.set(p - 1);
                Some(Direction::Positive)
            }
        }
    }

    // Background side.

    /// Snapshot of every axis position.
    pub fn position(&self) -> Position {
        critical_section::with(|cs| self.position.borrow(cs).get())
    }

    /// Position of one axis.
    pub fn position_of(&self, axis: Axis) -> Steps {
        self.position().steps(axis)
    }

    /// Overwrite all four axis positions at once.
    pub fn set_position(&self, counts: [i32; NUM_AXES]) {
        critical_section::with(|cs| self.position.borrow(cs).set(Position::at(counts)));
        log::debug!("position set to {:?}", counts);
    }

    /// Overwrite the secondary axis position only.
    pub fn set_secondary_position(&self, steps: Steps) {
        critical_section::with(|cs| {
            let cell = self.position.borrow(cs);
            let mut position = cell.get();
            position.set_steps(Axis::E, steps);
            cell.set(position);
        });
    }

    /// Turn limit switch checking on or off.
    pub fn enable_endstops(&self, check: bool) {
        critical_section::with(|cs| self.check_endstops.borrow(cs).set(check));
        log::debug!("endstop checking {}", if check { "enabled" } else { "disabled" });
    }

    /// Whether limit switches are checked.
    pub fn endstops_enabled(&self) -> bool {
        critical_section::with(|cs| self.endstops_enabled_in(cs))
    }

    /// Recorded hits, without clearing them.
    pub fn endstop_hits(&self) -> heapless::Vec<EndstopHit, NUM_AXES> {
        let hits = critical_section::with(|cs| self.endstop_hits.borrow(cs).get());
        collect_hits(hits)
    }

    /// Take recorded hits as a report in physical units, clearing them.
    pub fn take_endstop_report(&self, axes: &AxesConfig) -> Option<EndstopReport> {
        let hits = critical_section::with(|cs| self.endstop_hits.borrow(cs).replace([None; NUM_AXES]));
        let hits = collect_hits(hits);
        if hits.is_empty() {
            return None;
        }

        let mut report = EndstopReport {
            hits: heapless::Vec::new(),
        };
        for hit in hits {
            let units = hit.position.to_units(axes.get(hit.axis).steps_per_unit);
            // Capacity equals the number of axes.
            let _ = report.hits.push((hit.axis, units));
        }
        Some(report)
    }

    /// Log and clear any recorded hits.
    pub fn check_hit_endstops(&self, axes: &AxesConfig) -> Option<EndstopReport> {
        let report = self.take_endstop_report(axes)?;
        log::info!("{}", report);
        Some(report)
    }

    /// Clear recorded hits without reporting them (homing moves expect them).
    pub fn endstops_hit_on_purpose(&self) {
        critical_section::with(|cs| self.endstop_hits.borrow(cs).set([None; NUM_AXES]));
    }

    /// Diagnostics recorded so far.
    pub fn diagnostics(&self) -> Diagnostics {
        critical_section::with(|cs| self.diagnostics.borrow(cs).get())
    }

    /// Take and clear the diagnostics.
    pub fn take_diagnostics(&self) -> Diagnostics {
        critical_section::with(|cs| self.diagnostics.borrow(cs).replace(Diagnostics::new()))
    }

    /// Log and clear any recorded interrupt faults.
    pub fn check_stepper_errors(&self) -> Diagnostics {
        let diag = self.take_diagnostics();
        if diag.saturation_count > 0 {
            log::warn!(
                "step rate too high: interval clamped {} times, last requested {} steps/s",
                diag.saturation_count,
                diag.last_saturated_rate.map(|r| r.0).unwrap_or(0)
            );
        }
        if diag.pin_faults > 0 {
            log::error!("{} output writes failed in the step interrupt", diag.pin_faults);
        }
        diag
    }

    /// Secondary-axis steps waiting for the pacer (signed).
    pub fn pending_secondary_steps(&self) -> i32 {
        critical_section::with(|cs| self.pending_secondary.borrow(cs).get())
    }
}

impl Default for MotionShared {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_hits(hits: [Option<Steps>; NUM_AXES]) -> heapless::Vec<EndstopHit, NUM_AXES> {
    Axis::ALL
        .into_iter()
        .filter_map(|axis| {
            hits[axis.index()].map(|position| EndstopHit { axis, position })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StepsPerUnit;

    #[test]
    fn test_set_and_read_position() {
        let shared = MotionShared::new();
        shared.set_position([1, 2, 3, 4]);
        assert_eq!(shared.position().counts(), [1, 2, 3, 4]);

        shared.set_secondary_position(Steps(-9));
        assert_eq!(shared.position().counts(), [1, 2, 3, -9]);
        assert_eq!(shared.position_of(Axis::Y), Steps(2));
    }

    #[test]
    fn test_endstop_hit_recorded_with_position() {
        let shared = MotionShared::new();
        shared.set_position([0, 0, 800, 0]);
        critical_section::with(|cs| shared.record_endstop_hit(cs, Axis::Z));

        let hits = shared.endstop_hits();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0], EndstopHit { axis: Axis::Z, position: Steps(800) });

        let mut axes = AxesConfig::default();
        axes.z.steps_per_unit = StepsPerUnit::new(400.0).unwrap();
        let report = shared.take_endstop_report(&axes).unwrap();
        assert_eq!(report.position_of(Axis::Z), Some(2.0));
        assert_eq!(format!("{}", report), "endstops hit: Z:2.000");

        // Taking the report clears the flags.
        assert!(shared.endstop_hits().is_empty());
        assert!(shared.take_endstop_report(&axes).is_none());
    }

    #[test]
    fn test_hits_on_purpose_are_cleared_silently() {
        let shared = MotionShared::new();
        critical_section::with(|cs| shared.record_endstop_hit(cs, Axis::Z));
        shared.endstops_hit_on_purpose();
        assert!(shared.endstop_hits().is_empty());
    }

    #[test]
    fn test_diagnostics_take_clears() {
        let shared = MotionShared::new();
        critical_section::with(|cs| {
            shared.note_saturation(cs, StepRate(45_000));
            shared.note_saturation(cs, StepRate(41_000));
            shared.note_pin_fault(cs);
        });

        let diag = shared.check_stepper_errors();
        assert_eq!(diag.saturation_count, 2);
        assert_eq!(diag.last_saturated_rate, Some(StepRate(41_000)));
        assert_eq!(diag.pin_faults, 1);
        assert!(shared.diagnostics().is_clear());
    }

    #[test]
    fn test_secondary_queue_drains_toward_zero() {
        let shared = MotionShared::new();
        critical_section::with(|cs| {
            shared.queue_secondary(cs, 2);
            shared.queue_secondary(cs, -3);
            assert_eq!(shared.take_secondary_step(cs), Some(Direction::Negative));
            assert_eq!(shared.take_secondary_step(cs), None);
            shared.queue_secondary(cs, 1);
            assert_eq!(shared.take_secondary_step(cs), Some(Direction::Positive));
        });
        assert_eq!(shared.pending_secondary_steps(), 0);
    }
}
