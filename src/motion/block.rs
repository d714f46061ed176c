//! Motion blocks and the queue seam between planner and step interrupt.
//!
//! A [`Block`] is an immutable, pre-planned segment: integer step counts per
//! axis, a direction field and a trapezoidal rate profile. The interrupt
//! borrows the block at the head of a [`BlockSource`] while it executes and
//! releases it once every step event has been emitted.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Deque;

use crate::config::StepRate;
use crate::error::{Error, MotionError, Result};

use super::axis::{Axis, AxisMask, Direction, NUM_AXES};
use super::trapezoid::MotionPhase;

/// Pressure-advance profile of a block, in 8.8 fixed point steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvanceProfile {
    /// Advance at block start.
    pub initial: i32,
    /// Advance the deceleration ramp settles on.
    pub final_advance: i32,
    /// Change per step event while ramping.
    pub rate: i32,
    /// Upper bound reached while accelerating.
    pub peak: i32,
}

/// One planned motion segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Block {
    /// Step count per axis (magnitude).
    pub steps: [u32; NUM_AXES],
    /// Bit set means the axis moves negative.
    pub direction_bits: AxisMask,
    /// Largest per-axis step count; number of step events in the block.
    pub step_event_count: u32,
    /// Step rate at block entry.
    pub initial_rate: StepRate,
    /// Cruise step rate.
    pub nominal_rate: StepRate,
    /// Step rate at block exit.
    pub final_rate: StepRate,
    /// Last step event of the acceleration phase.
    pub accelerate_until: u32,
    /// Step event after which deceleration starts.
    pub decelerate_after: u32,
    /// Acceleration in steps/s² per timer tick, 8.24 fixed point.
    pub acceleration_rate: u32,
    /// Secondary-axis advance ramp.
    pub advance: AdvanceProfile,
    /// Set once the interrupt has started executing the block.
    pub busy: bool,
}

impl Block {
    /// Build a block from signed per-axis step counts.
    ///
    /// The block runs at a constant 1000 steps/s until a rate profile is
    /// attached.
    pub fn from_steps(steps: [i32; NUM_AXES]) -> Self {
        let mut block = Block::default();
        for axis in Axis::ALL {
            let s = steps[axis.index()];
            block.steps[axis.index()] = s.unsigned_abs();
            block.direction_bits = block.direction_bits.with(axis, s < 0);
        }
        block.step_event_count = block.steps.iter().copied().max().unwrap_or(0);
        block.with_constant_rate(StepRate(1000))
    }

    /// Run the whole block at one rate.
    pub fn with_constant_rate(mut self, rate: StepRate) -> Self {
        self.initial_rate = rate;
        self.nominal_rate = rate;
        self.final_rate = rate;
        self.accelerate_until = 0;
        self.decelerate_after = self.step_event_count;
        self.acceleration_rate = 0;
        self
    }

    /// Attach a trapezoidal profile.
    pub fn with_trapezoid(
        mut self,
        initial: StepRate,
        nominal: StepRate,
        final_rate: StepRate,
        accelerate_until: u32,
        decelerate_after: u32,
        acceleration_rate: u32,
    ) -> Self {
        self.initial_rate = initial;
        self.nominal_rate = nominal;
        self.final_rate = final_rate;
        self.accelerate_until = accelerate_until;
        self.decelerate_after = decelerate_after;
        self.acceleration_rate = acceleration_rate;
        self
    }

    /// Attach a secondary-axis advance ramp.
    pub fn with_advance(mut self, advance: AdvanceProfile) -> Self {
        self.advance = advance;
        self
    }

    /// Convert an acceleration in steps/s² to the 8.24 per-tick form.
    pub fn acceleration_rate_for(acceleration: f32, timer_frequency_hz: u32) -> u32 {
        let scaled = acceleration as f64 * (1u64 << 24) as f64 / timer_frequency_hz.max(1) as f64;
        libm::round(scaled.max(0.0)) as u32
    }

    /// Step count of one axis.
    #[inline]
    pub fn steps_of(&self, axis: Axis) -> u32 {
        self.steps[axis.index()]
    }

    /// Direction of one axis.
    #[inline]
    pub fn direction_of(&self, axis: Axis) -> Direction {
        self.direction_bits.direction(axis)
    }

    /// Signed displacement of one axis.
    pub fn displacement(&self, axis: Axis) -> i32 {
        self.steps_of(axis) as i32 * self.direction_of(axis).sign()
    }

    /// Axes with a non-zero step count.
    pub fn moving_axes(&self) -> AxisMask {
        Axis::ALL
            .into_iter()
            .fold(AxisMask::EMPTY, |m, a| m.with(a, self.steps_of(a) > 0))
    }

    /// Ramp phase for a number of completed step events.
    ///
    /// Never returns [`MotionPhase::Complete`]; see [`Block::phase_at`].
    pub fn ramp_phase(&self, completed: u32) -> MotionPhase {
        if completed <= self.accelerate_until {
            MotionPhase::Accelerating
        } else if completed > self.decelerate_after {
            MotionPhase::Decelerating
        } else {
            MotionPhase::Cruising
        }
    }

    /// Phase for a number of completed step events, including completion.
    pub fn phase_at(&self, completed: u32) -> MotionPhase {
        if completed >= self.step_event_count {
            MotionPhase::Complete
        } else {
            self.ramp_phase(completed)
        }
    }

    /// Check the ordering constraints the interrupt relies on.
    ///
    /// # Errors
    ///
    /// Returns `MotionError::InvalidBlock` naming the first violated rule.
    pub fn validate(&self) -> Result<()> {
        let invalid = |why| Err(Error::Motion(MotionError::InvalidBlock(why)));

        if self.step_event_count == 0 {
            return invalid("no step events");
        }
        if self.step_event_count > i32::MAX as u32 {
            return invalid("step event count too large");
        }
        if self.steps.iter().any(|&s| s > self.step_event_count) {
            return invalid("axis step count exceeds step event count");
        }
        if self.accelerate_until > self.decelerate_after
            || self.decelerate_after > self.step_event_count
        {
            return invalid("phase boundaries out of order");
        }
        if self.initial_rate > self.nominal_rate || self.final_rate > self.nominal_rate {
            return invalid("entry or exit rate above nominal rate");
        }
        if self.advance.rate < 0 || self.advance.final_advance > self.advance.peak.max(self.advance.initial)
        {
            return invalid("advance ramp out of range");
        }
        Ok(())
    }
}

/// Where the step interrupt gets its work from.
///
/// Implementations must be safe to call from interrupt context: no blocking,
/// no allocation.
pub trait BlockSource {
    /// Borrow the head block and mark it busy, or `None` when empty.
    fn try_get_current_block(&mut self) -> Option<Block>;

    /// Release the head block.
    fn discard_current_block(&mut self);

    /// Whether any block (including one in progress) is queued.
    fn blocks_queued(&self) -> bool;
}

/// Fixed-capacity FIFO of blocks.
#[derive(Debug)]
pub struct BlockQueue<const N: usize> {
    blocks: Deque<Block, N>,
}

impl<const N: usize> BlockQueue<N> {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            blocks: Deque::new(),
        }
    }

    /// Validate and append a block.
    ///
    /// # Errors
    ///
    /// Returns `MotionError::InvalidBlock` or `MotionError::QueueFull`.
    pub fn push(&mut self, block: Block) -> Result<()> {
        block.validate()?;
        self.blocks
            .push_back(Block { busy: false, ..block })
            .map_err(|_| Error::Motion(MotionError::QueueFull))
    }

    /// Number of queued blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Peek at the head block.
    pub fn head(&self) -> Option<&Block> {
        self.blocks.front()
    }
}

impl<const N: usize> Default for BlockQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> BlockSource for BlockQueue<N> {
    fn try_get_current_block(&mut self) -> Option<Block> {
        let head = self.blocks.front_mut()?;
        head.busy = true;
        Some(*head)
    }

    fn discard_current_block(&mut self) {
        self.blocks.pop_front();
    }

    fn blocks_queued(&self) -> bool {
        !self.blocks.is_empty()
    }
}

/// Block queue shared between a background producer and the step interrupt.
pub struct SharedBlockQueue<const N: usize> {
    inner: Mutex<RefCell<BlockQueue<N>>>,
}

impl<const N: usize> SharedBlockQueue<N> {
    /// Create an empty queue, usable in a `static`.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(BlockQueue::new())),
        }
    }

    /// Validate and append a block.
    ///
    /// # Errors
    ///
    /// Returns `MotionError::InvalidBlock` or `MotionError::QueueFull`.
    pub fn push(&self, block: Block) -> Result<()> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).push(block))
    }

    /// Number of queued blocks.
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow_ref(cs).len())
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<const N: usize> Default for SharedBlockQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> BlockSource for &SharedBlockQueue<N> {
    fn try_get_current_block(&mut self) -> Option<Block> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).try_get_current_block())
    }

    fn discard_current_block(&mut self) {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).discard_current_block())
    }

    fn blocks_queued(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).blocks_queued())
    }
}
