//! Execution state of the block currently being stepped.

use super::axis::AxisMask;
use super::block::Block;
use super::bresenham::{Dda, Kinematics};
use super::trapezoid::{MotionPhase, StepTiming, TrapezoidGenerator};

/// Runtime state while a block executes.
#[derive(Debug, Clone)]
pub struct BlockExecutor {
    /// The block being executed (a copy of the busy queue head).
    block: Block,

    /// Bresenham error terms.
    dda: Dda,

    /// Step events emitted so far.
    completed: u32,

    /// Timing the next firing runs with.
    timing: StepTiming,

    /// Current phase of execution.
    phase: MotionPhase,
}

impl BlockExecutor {
    /// Start executing a block.
    pub fn start(block: Block, trapezoid: &mut TrapezoidGenerator) -> Self {
        let mut dda = Dda::new();
        dda.reset(block.step_event_count);
        let timing = trapezoid.reset(&block);

        Self {
            phase: block.phase_at(0),
            block,
            dda,
            completed: 0,
            timing,
        }
    }

    /// The block being executed.
    #[inline]
    pub fn block(&self) -> &Block {
        &self.block
    }

    /// Check if every step event has been emitted.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.completed >= self.block.step_event_count
    }

    /// Get the number of step events emitted.
    #[inline]
    pub fn completed(&self) -> u32 {
        self.completed
    }

    /// Get step events remaining.
    #[inline]
    pub fn steps_remaining(&self) -> u32 {
        self.block.step_event_count.saturating_sub(self.completed)
    }

    /// Get the current phase.
    #[inline]
    pub fn phase(&self) -> MotionPhase {
        self.phase
    }

    /// Get the timing of the current firing.
    #[inline]
    pub fn timing(&self) -> StepTiming {
        self.timing
    }

    /// Emit the next step event.
    ///
    /// Returns the axes that step, or `None` once the block is complete.
    pub fn next_event(&mut self, kinematics: Kinematics) -> Option<AxisMask> {
        if self.is_complete() {
            return None;
        }
        let stepping = self.dda.step(&self.block, kinematics);
        self.completed += 1;
        Some(stepping)
    }

    /// Mark the block complete without emitting the remaining events.
    pub fn force_complete(&mut self) {
        self.completed = self.block.step_event_count;
        self.phase = MotionPhase::Complete;
    }

    /// Recompute phase and timing after this firing's step events.
    pub fn update_timing(&mut self, trapezoid: &mut TrapezoidGenerator) -> StepTiming {
        self.phase = self.block.phase_at(self.completed);
        self.timing = trapezoid.next(self.completed, &self.block);
        self.timing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StepRate, StepperConfig};
    use crate::motion::Axis;

    #[test]
    fn test_executor_runs_to_completion() {
        let mut trapezoid = TrapezoidGenerator::new(&StepperConfig::default());
        let block = Block::from_steps([0, 0, 3, 0]).with_constant_rate(StepRate(200));
        let mut exec = BlockExecutor::start(block, &mut trapezoid);

        assert_eq!(exec.steps_remaining(), 3);
        let mut z_steps = 0;
        while let Some(stepping) = exec.next_event(Kinematics::Cartesian) {
            if stepping.contains(Axis::Z) {
                z_steps += 1;
            }
        }
        assert_eq!(z_steps, 3);
        assert!(exec.is_complete());
        exec.update_timing(&mut trapezoid);
        assert_eq!(exec.phase(), MotionPhase::Complete);
    }

    #[test]
    fn test_force_complete() {
        let mut trapezoid = TrapezoidGenerator::new(&StepperConfig::default());
        let block = Block::from_steps([0, 0, 100, 0]);
        let mut exec = BlockExecutor::start(block, &mut trapezoid);
        exec.next_event(Kinematics::Cartesian);
        exec.force_complete();
        assert!(exec.is_complete());
        assert_eq!(exec.steps_remaining(), 0);
        assert!(exec.next_event(Kinematics::Cartesian).is_none());
    }
}
