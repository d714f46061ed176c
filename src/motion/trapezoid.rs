//! Trapezoidal rate generation for the step interrupt.
//!
//! The generator integrates acceleration over elapsed timer ticks instead of
//! over step events, so the ramp stays linear in time even though intervals
//! shrink as the rate rises. All arithmetic is integer: rates are steps/s,
//! times are timer ticks and the acceleration is 8.24 fixed point per tick.

use crate::config::{StepRate, StepperConfig, TimerTicks};

use super::block::Block;
use super::speed_table::SpeedTable;

/// Current phase of block execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionPhase {
    /// Rate rising from the entry rate toward nominal.
    Accelerating,
    /// Constant nominal rate.
    Cruising,
    /// Rate falling toward the exit rate.
    Decelerating,
    /// All step events emitted.
    Complete,
}

/// Interval and step batching for one interrupt firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepTiming {
    /// Timer ticks until the next firing.
    pub interval: TimerTicks,
    /// Step events emitted per firing (1, 2 or 4).
    pub step_loops: u8,
    /// Step rate the interval was derived from, after clamping.
    pub rate: StepRate,
}

/// Rate limits taken from [`StepperConfig`].
#[derive(Debug, Clone, Copy)]
struct RateLimits {
    max_step_frequency: u32,
    double_step_rate: u32,
    quad_step_rate: u32,
    min_timer_interval: u16,
}

impl From<&StepperConfig> for RateLimits {
    fn from(config: &StepperConfig) -> Self {
        Self {
            max_step_frequency: config.max_step_frequency.0,
            double_step_rate: config.double_step_rate.0,
            quad_step_rate: config.quad_step_rate.0,
            min_timer_interval: config.min_timer_interval.0,
        }
    }
}

/// Per-block rate state machine.
#[derive(Debug, Clone)]
pub struct TrapezoidGenerator {
    table: SpeedTable,
    limits: RateLimits,
    acc_step_rate: u32,
    acceleration_time: u32,
    deceleration_time: u32,
    nominal: StepTiming,
    saturated: Option<StepRate>,
}

impl TrapezoidGenerator {
    /// Create a generator for a validated stepper configuration.
    pub fn new(config: &StepperConfig) -> Self {
        let table = SpeedTable::new(config.timer_frequency_hz);
        let limits = RateLimits::from(config);
        Self {
            table,
            limits,
            acc_step_rate: 0,
            acceleration_time: 0,
            deceleration_time: 0,
            nominal: StepTiming {
                interval: config.idle_interval,
                step_loops: 1,
                rate: StepRate(0),
            },
            saturated: None,
        }
    }

    /// Map a step rate to an interval and a step batch size.
    ///
    /// Rates above the configured maximum are clamped. Intervals shorter
    /// than the minimum are raised to it and the saturation is remembered
    /// until [`TrapezoidGenerator::take_saturation`].
    pub fn calc_timer(&mut self, rate: u32) -> StepTiming {
        let limits = self.limits;
        let rate = rate.min(limits.max_step_frequency);

        let (step_loops, per_loop) = if rate > limits.quad_step_rate {
            (4, rate >> 2)
        } else if rate > limits.double_step_rate {
            (2, rate >> 1)
        } else {
            (1, rate)
        };

        let mut interval = self.table.interval(per_loop.min(u16::MAX as u32) as u16);
        if interval < limits.min_timer_interval {
            interval = limits.min_timer_interval;
            self.saturated = Some(StepRate(rate));
        }

        StepTiming {
            interval: TimerTicks(interval),
            step_loops,
            rate: StepRate(rate),
        }
    }

    /// Start a new block and return the timing of its first firing.
    pub fn reset(&mut self, block: &Block) -> StepTiming {
        self.deceleration_time = 0;
        self.nominal = self.calc_timer(block.nominal_rate.0);
        self.acc_step_rate = block.initial_rate.0;
        let timing = self.calc_timer(self.acc_step_rate);
        self.acceleration_time = timing.interval.0 as u32;
        timing
    }

    /// Timing for the next firing after `completed` step events.
    pub fn next(&mut self, completed: u32, block: &Block) -> StepTiming {
        match block.ramp_phase(completed) {
            MotionPhase::Accelerating => {
                let gained = mul_time_rate(self.acceleration_time, block.acceleration_rate);
                self.acc_step_rate = gained
                    .saturating_add(block.initial_rate.0)
                    .min(block.nominal_rate.0);
                let timing = self.calc_timer(self.acc_step_rate);
                self.acceleration_time = self
                    .acceleration_time
                    .saturating_add(timing.interval.0 as u32);
                timing
            }
            MotionPhase::Decelerating => {
                let lost = mul_time_rate(self.deceleration_time, block.acceleration_rate);
                let rate = if lost > self.acc_step_rate {
                    block.final_rate.0
                } else {
                    (self.acc_step_rate - lost).max(block.final_rate.0)
                };
                let timing = self.calc_timer(rate);
                self.deceleration_time = self
                    .deceleration_time
                    .saturating_add(timing.interval.0 as u32);
                timing
            }
            _ => self.nominal,
        }
    }

    /// Timing at the nominal rate of the current block.
    #[inline]
    pub fn nominal(&self) -> StepTiming {
        self.nominal
    }

    /// Take the clamped rate of the most recent interval saturation.
    pub fn take_saturation(&mut self) -> Option<StepRate> {
        self.saturated.take()
    }
}

/// `(time * rate) >> 24`, rounded, without overflow.
#[inline]
fn mul_time_rate(time: u32, rate: u32) -> u32 {
    let product = (time as u64 * rate as u64 + (1 << 23)) >> 24;
    product.min(u32::MAX as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::NUM_AXES;

    fn generator() -> TrapezoidGenerator {
        TrapezoidGenerator::new(&StepperConfig::default())
    }

    /// Run a block's rate profile, returning (completed, rate) per firing.
    fn profile(block: &Block) -> heapless::Vec<(u32, u32), 2048> {
        let mut gen = generator();
        let mut out = heapless::Vec::new();
        let mut timing = gen.reset(block);
        out.push((0, timing.rate.0)).unwrap();
        let mut completed = 0;
        while completed < block.step_event_count {
            completed += timing.step_loops as u32;
            timing = gen.next(completed, block);
            out.push((completed, timing.rate.0)).unwrap();
        }
        out
    }

    fn ramp_block() -> Block {
        let mut steps = [0i32; NUM_AXES];
        steps[0] = 1000;
        Block::from_steps(steps).with_trapezoid(
            StepRate(100),
            StepRate(1000),
            StepRate(100),
            300,
            700,
            Block::acceleration_rate_for(1650.0, 2_000_000),
        )
    }

    #[test]
    fn test_step_loops_thresholds() {
        let mut gen = generator();
        assert_eq!(gen.calc_timer(10_000).step_loops, 1);
        assert_eq!(gen.calc_timer(10_001).step_loops, 2);
        assert_eq!(gen.calc_timer(20_000).step_loops, 2);
        assert_eq!(gen.calc_timer(20_001).step_loops, 4);
    }

    #[test]
    fn test_rate_clamped_to_max() {
        let mut gen = generator();
        let timing = gen.calc_timer(60_000);
        assert_eq!(timing.rate, StepRate(40_000));
        assert_eq!(timing.step_loops, 4);
        // 10 kHz per loop at 2 MHz, within table interpolation error.
        assert!((199..=200).contains(&timing.interval.0));
    }

    #[test]
    fn test_interval_floor_records_saturation() {
        let mut config = StepperConfig::default();
        config.min_timer_interval = TimerTicks(250);
        let mut gen = TrapezoidGenerator::new(&config);

        let timing = gen.calc_timer(40_000);
        assert_eq!(timing.interval, TimerTicks(250));
        assert_eq!(gen.take_saturation(), Some(StepRate(40_000)));
        assert_eq!(gen.take_saturation(), None);

        gen.calc_timer(1000);
        assert_eq!(gen.take_saturation(), None);
    }

    #[test]
    fn test_reset_starts_at_initial_rate() {
        let mut gen = generator();
        let block = ramp_block();
        let timing = gen.reset(&block);
        assert_eq!(timing.rate, StepRate(100));
        assert_eq!(gen.nominal().rate, StepRate(1000));
    }

    #[test]
    fn test_ramp_reaches_nominal_near_accelerate_until() {
        let points = profile(&ramp_block());
        let at_300 = points.iter().find(|(c, _)| *c == 300).unwrap().1;
        assert!((950..=1000).contains(&at_300), "rate at 300 was {at_300}");

        let at_150 = points.iter().find(|(c, _)| *c == 150).unwrap().1;
        assert!(at_150 > 100 && at_150 < 1000);
    }

    #[test]
    fn test_profile_monotonic_and_bounded() {
        let block = ramp_block();
        let points = profile(&block);
        let mut last = 0;
        for &(completed, rate) in points.iter() {
            assert!(rate <= block.nominal_rate.0);
            if completed <= block.decelerate_after {
                assert!(rate >= last, "rate fell during ramp-up at {completed}");
            } else {
                assert!(rate <= last, "rate rose during ramp-down at {completed}");
                assert!(rate >= block.final_rate.0);
            }
            last = rate;
        }
        // Deceleration lands close to the exit rate.
        let end = points.last().unwrap().1;
        assert!(end < 200, "exit rate {end}");
    }

    #[test]
    fn test_constant_rate_block_cruises() {
        let mut steps = [0i32; NUM_AXES];
        steps[2] = 50;
        let block = Block::from_steps(steps).with_constant_rate(StepRate(500));
        for &(_, rate) in profile(&block).iter() {
            assert_eq!(rate, 500);
        }
    }
}
