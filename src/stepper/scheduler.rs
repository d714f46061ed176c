//! The step interrupt state machine.
//!
//! Each firing either idles, loads the next block, or emits one to four step
//! events of the current block and computes the interval until the next
//! firing. The whole firing runs inside one critical section, so background
//! readers of [`MotionShared`] see either the state before it or after it.

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;

use crate::config::TimerTicks;
use crate::error::{Error, Result};
use crate::hal::{Clock, OneShotTimer};
use crate::motion::{
    Axis, Block, BlockExecutor, BlockSource, MotionPhase, StepStrategy, StepTiming,
    TrapezoidGenerator,
};

use super::endstop::EndstopMonitor;
use super::output::{OutputDriver, OutputStatus};
use super::pacer::AdvanceRamp;
use super::shared::MotionShared;

/// What the interrupt is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SchedulerState {
    /// No block; polling the queue at the idle interval.
    Idle,
    /// Block loaded, waiting for late-enabled drivers to settle.
    Loading,
    /// Executing a block. `Complete` means every step event is out and the
    /// outputs are still finishing (continuous scan).
    Running(MotionPhase),
}

/// Step interrupt scheduler.
///
/// Generic over:
/// - `O`: step/dir/enable output pin type
/// - `I`: limit switch input pin type
/// - `SPI`: beam positioning device
/// - `C`: millisecond clock for the scan window
pub struct Stepper<'a, O, I, SPI, C> {
    shared: &'a MotionShared,
    output: OutputDriver<O, SPI, C>,
    endstops: EndstopMonitor<I>,
    strategy: StepStrategy,
    trapezoid: TrapezoidGenerator,
    executor: Option<BlockExecutor>,
    advance: AdvanceRamp,
    state: SchedulerState,
    idle_interval: TimerTicks,
    settle_interval: TimerTicks,
}

impl<'a, O, I, SPI, C> Stepper<'a, O, I, SPI, C>
where
    O: OutputPin,
    I: InputPin,
    SPI: SpiDevice,
    C: Clock,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        shared: &'a MotionShared,
        output: OutputDriver<O, SPI, C>,
        endstops: EndstopMonitor<I>,
        strategy: StepStrategy,
        trapezoid: TrapezoidGenerator,
        idle_interval: TimerTicks,
        settle_interval: TimerTicks,
    ) -> Self {
        Self {
            shared,
            output,
            endstops,
            strategy,
            trapezoid,
            executor: None,
            advance: AdvanceRamp::new(),
            state: SchedulerState::Idle,
            idle_interval,
            settle_interval,
        }
    }

    /// Run one firing and return the interval until the next.
    ///
    /// Never blocks and never fails: output faults and interval saturation
    /// are counted in [`MotionShared`] diagnostics.
    pub fn tick<S: BlockSource>(&mut self, source: &mut S) -> TimerTicks {
        critical_section::with(|cs| {
            if self.executor.is_none() {
                let Some(block) = source.try_get_current_block() else {
                    self.state = SchedulerState::Idle;
                    return self.idle_interval;
                };
                self.load(cs, block);
                if self.strategy.needs_settle(&block) {
                    self.state = SchedulerState::Loading;
                    return self.settle_interval;
                }
            }
            self.run(cs, source)
        })
    }

    /// Interrupt entry point: run one firing and re-arm the timer.
    pub fn on_timer<S: BlockSource, T: OneShotTimer>(
        &mut self,
        source: &mut S,
        timer: &mut T,
    ) -> TimerTicks {
        let interval = self.tick(source);
        timer.arm(interval);
        interval
    }

    fn load(&mut self, cs: critical_section::CriticalSection<'_>, block: Block) {
        let executor = BlockExecutor::start(block, &mut self.trapezoid);
        if self.strategy.is_paced(Axis::E) {
            self.advance.reset(cs, self.shared, &block);
        }
        if self.output.begin_block(&block).is_err() {
            self.shared.note_pin_fault(cs);
        }
        if let Some(rate) = self.trapezoid.take_saturation() {
            self.shared.note_saturation(cs, rate);
        }
        self.state = SchedulerState::Running(executor.phase());
        self.executor = Some(executor);
    }

    fn run<S: BlockSource>(
        &mut self,
        cs: critical_section::CriticalSection<'_>,
        source: &mut S,
    ) -> TimerTicks {
        let shared = self.shared;
        let Some(exec) = self.executor.as_mut() else {
            self.state = SchedulerState::Idle;
            return self.idle_interval;
        };
        let block = *exec.block();
        let holding = exec.is_complete();
        let mut timing: StepTiming = exec.timing();

        if !holding {
            for axis in Axis::ALL {
                if self.strategy.is_paced(axis) {
                    continue;
                }
                if self.output.set_direction(axis, block.direction_of(axis)).is_err() {
                    shared.note_pin_fault(cs);
                }
            }

            let mut stopped = false;
            if shared.endstops_enabled_in(cs) {
                for axis in Axis::ALL {
                    let moving = block.steps_of(axis) > 0;
                    match self.endstops.check(axis, block.direction_of(axis), moving) {
                        Ok(true) => {
                            shared.record_endstop_hit(cs, axis);
                            exec.force_complete();
                            stopped = true;
                        }
                        Ok(false) => {}
                        Err(_) => shared.note_pin_fault(cs),
                    }
                }
            }

            for _ in 0..timing.step_loops {
                let Some(stepping) = exec.next_event(self.strategy.kinematics) else {
                    break;
                };
                for axis in stepping.iter() {
                    let direction = block.direction_of(axis);
                    shared.step_position(cs, axis, direction);
                    if self.strategy.is_paced(axis) {
                        self.advance.queue_step(cs, shared, direction);
                    } else if self.output.emit(axis, direction).is_err() {
                        shared.note_pin_fault(cs);
                    }
                }
            }
            if stopped && self.output.stop_scan().is_err() {
                shared.note_pin_fault(cs);
            }

            timing = exec.update_timing(&mut self.trapezoid);
            if self.strategy.is_paced(Axis::E) {
                match exec.phase() {
                    MotionPhase::Accelerating => {
                        self.advance.accelerate(cs, shared, timing.step_loops)
                    }
                    MotionPhase::Decelerating => {
                        self.advance.decelerate(cs, shared, timing.step_loops)
                    }
                    _ => {}
                }
            }
            if let Some(rate) = self.trapezoid.take_saturation() {
                shared.note_saturation(cs, rate);
            }
        }

        let status = self.output.service().unwrap_or_else(|_| {
            shared.note_pin_fault(cs);
            OutputStatus::Settled
        });

        if !exec.is_complete() {
            self.state = SchedulerState::Running(exec.phase());
            return timing.interval;
        }
        if status == OutputStatus::Scanning {
            self.state = SchedulerState::Running(MotionPhase::Complete);
            return self.idle_interval;
        }

        source.discard_current_block();
        self.executor = None;
        self.state = SchedulerState::Idle;
        if holding {
            self.idle_interval
        } else {
            timing.interval
        }
    }

    /// Abort all motion: discard every queued block and the current one.
    ///
    /// The timer is disabled while the queue is emptied and re-enabled
    /// afterwards. Calling it again with nothing queued changes nothing.
    pub fn quick_stop<S: BlockSource, T: OneShotTimer>(&mut self, source: &mut S, timer: &mut T) {
        timer.disable();
        let mut discarded = 0u32;
        while source.blocks_queued() {
            source.discard_current_block();
            discarded += 1;
        }
        self.executor = None;
        self.advance.halt();
        self.output.abort_scan();
        self.state = SchedulerState::Idle;
        timer.enable();

        if discarded > 0 {
            log::warn!("quick stop: discarded {} queued blocks", discarded);
        }
    }

    /// Polled drain: fire the scheduler until the queue is empty, calling
    /// `maintenance` between firings, then disable every driver.
    ///
    /// For setups where no interrupt runs concurrently; with a live timer
    /// interrupt use [`crate::synchronize`] and [`Stepper::disable_outputs`].
    pub fn finish_and_disable<S: BlockSource>(
        &mut self,
        source: &mut S,
        mut maintenance: impl FnMut(),
    ) -> Result<()> {
        while source.blocks_queued() {
            self.tick(source);
            maintenance();
        }
        self.disable_outputs()
    }

    /// Disable every driver.
    pub fn disable_outputs(&mut self) -> Result<()> {
        self.output.disable_all().map_err(Error::Hardware)?;
        log::info!("stepper drivers disabled");
        Ok(())
    }

    /// Current scheduler state.
    #[inline]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Block being executed, if any.
    pub fn current_block(&self) -> Option<&Block> {
        self.executor.as_ref().map(|e| e.block())
    }

    /// Step events emitted for the current block.
    pub fn step_events_completed(&self) -> u32 {
        self.executor.as_ref().map(|e| e.completed()).unwrap_or(0)
    }

    /// Timing of the next firing of the current block.
    pub fn current_timing(&self) -> Option<StepTiming> {
        self.executor.as_ref().map(|e| e.timing())
    }

    /// Shared state this scheduler publishes to.
    #[inline]
    pub fn shared(&self) -> &'a MotionShared {
        self.shared
    }

    /// Output drivers.
    #[inline]
    pub fn output(&self) -> &OutputDriver<O, SPI, C> {
        &self.output
    }

    /// Move the beam to a world coordinate.
    pub fn move_beam(&mut self, x: i32, y: i32) -> Result<()> {
        self.output.move_beam(x, y).map_err(Error::Hardware)
    }

    /// Overwrite the remembered beam coordinate without moving the beam.
    pub fn set_beam_position(&mut self, x: i32, y: i32) {
        self.output.set_beam_position(x, y);
    }

    /// Retransmit the remembered beam coordinate.
    pub fn refresh_beam(&mut self) -> Result<()> {
        self.output.refresh_beam().map_err(Error::Hardware)
    }
}
