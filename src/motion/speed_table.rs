//! Reciprocal lookup tables mapping a step rate to a timer interval.
//!
//! The interrupt must not divide, so `interval = timer_hz / rate` is read
//! from two tables built once for the configured timer frequency:
//!
//! - the *fast* table covers rates from 2048 steps/s upward, one entry per
//!   256 steps/s, linearly interpolated on the low byte of the rate;
//! - the *slow* table covers rates below 2048 steps/s, one entry per
//!   8 steps/s, interpolated on the low three bits.
//!
//! Each entry is `[interval, gain]` where `gain` is the drop in interval to
//! the next entry.

/// Entries per table.
pub const TABLE_LEN: usize = 256;

/// Rates (after removing the minimum rate) at or above this use the fast table.
pub const FAST_REGION_START: u32 = 8 * 256;

/// Interval at the minimum rate, independent of timer frequency.
const MAX_INTERVAL: u32 = 62_500;

/// Timer frequency the default tables are built for.
pub const DEFAULT_TIMER_FREQUENCY_HZ: u32 = 2_000_000;

/// Precomputed rate-to-interval tables for one timer frequency.
#[derive(Debug, Clone)]
pub struct SpeedTable {
    fast: [[u16; 2]; TABLE_LEN],
    slow: [[u16; 2]; TABLE_LEN],
    min_rate: u32,
}

impl SpeedTable {
    /// Tables for a 2 MHz step timer.
    pub const DEFAULT: SpeedTable = SpeedTable::new(DEFAULT_TIMER_FREQUENCY_HZ);

    /// Whether tables can be built for this timer frequency.
    pub const fn supports(timer_frequency_hz: u32) -> bool {
        timer_frequency_hz >= 500_000
            && timer_frequency_hz <= 2_000_000
            && timer_frequency_hz % MAX_INTERVAL == 0
    }

    /// Build the tables for a timer frequency.
    ///
    /// Unsupported frequencies are clamped to the supported range; validate
    /// with [`SpeedTable::supports`] first.
    pub const fn new(timer_frequency_hz: u32) -> Self {
        let hz = if timer_frequency_hz < 500_000 {
            500_000
        } else if timer_frequency_hz > 2_000_000 {
            2_000_000
        } else {
            timer_frequency_hz
        };
        let min_rate = hz / MAX_INTERVAL;
        Self {
            fast: build_table(hz, 256, min_rate),
            slow: build_table(hz, 8, min_rate),
            min_rate,
        }
    }

    /// Slowest representable step rate.
    #[inline]
    pub const fn min_rate(&self) -> u32 {
        self.min_rate
    }

    /// Interval in timer ticks for a step rate.
    ///
    /// Rates below the minimum are raised to it. The caller clamps the upper
    /// end and splits high rates into multiple steps per interrupt.
    pub fn interval(&self, rate: u16) -> u16 {
        let rate = (rate as u32).max(self.min_rate) - self.min_rate;

        if rate >= FAST_REGION_START {
            let [base, gain] = self.fast[(rate >> 8) as usize & (TABLE_LEN - 1)];
            let fraction = rate & 0xff;
            let delta = (fraction * gain as u32 + 0x80) >> 8;
            (base as u32).saturating_sub(delta) as u16
        } else {
            let [base, gain] = self.slow[(rate >> 3) as usize & (TABLE_LEN - 1)];
            let delta = (gain as u32 * (rate & 0x7)) >> 3;
            (base as u32).saturating_sub(delta) as u16
        }
    }
}

const fn build_table(hz: u32, spacing: u32, min_rate: u32) -> [[u16; 2]; TABLE_LEN] {
    let mut table = [[0u16; 2]; TABLE_LEN];
    let mut i = 0;
    while i < TABLE_LEN {
        let here = hz / (i as u32 * spacing + min_rate);
        let gain = if i + 1 < TABLE_LEN {
            here - hz / ((i as u32 + 1) * spacing + min_rate)
        } else {
            // Last entry repeats the previous slope.
            hz / ((i as u32 - 1) * spacing + min_rate) - here
        };
        table[i] = [here as u16, gain as u16];
        i += 1;
    }
    table
}

// The tables store intervals in 16 bits; this holds for every supported frequency.
const _: () = assert!(MAX_INTERVAL <= u16::MAX as u32);
