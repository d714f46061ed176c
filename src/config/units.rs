//! Unit types for step-domain quantities.
//!
//! Keeps positions, rates, timer intervals and scaling factors apart so a
//! step count can never be passed where a timer interval is expected.

use core::ops::{Add, Sub};

use serde::Deserialize;

use crate::error::ConfigError;

/// Axis position or displacement in steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Steps(pub i32);

impl Steps {
    /// Create a new Steps value.
    #[inline]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Convert to physical units (mm, or beam units for galvo axes).
    #[inline]
    pub fn to_units(self, steps_per_unit: StepsPerUnit) -> f32 {
        self.0 as f32 / steps_per_unit.0
    }
}

impl Add for Steps {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Steps {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

/// Step rate in steps per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepRate(pub u32);

impl StepRate {
    /// Create a new StepRate value.
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }
}

/// Interval between two step-timer firings, in timer ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerTicks(pub u16);

impl TimerTicks {
    /// Create a new TimerTicks value.
    #[inline]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u16 {
        self.0
    }
}

/// Steps per physical unit, validated to be finite and positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct StepsPerUnit(f32);

impl StepsPerUnit {
    /// Create a new StepsPerUnit value with validation.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidStepsPerUnit` for zero, negative or
    /// non-finite values.
    pub fn new(value: f32) -> Result<Self, ConfigError> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(ConfigError::InvalidStepsPerUnit(value))
        }
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }
}

impl Default for StepsPerUnit {
    fn default() -> Self {
        Self(1.0)
    }
}

impl<'de> Deserialize<'de> for StepsPerUnit {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = f32::deserialize(deserializer)?;
        StepsPerUnit::new(value).map_err(de_error)
    }
}

/// Number of consecutive asserted samples before a limit switch counts as hit.
///
/// Two samples reproduces the classic "current and previous" debounce; one
/// sample removes the detection lag at the cost of glitch immunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceSamples(u8);

impl DebounceSamples {
    /// Current-and-previous debounce.
    pub const TWO: Self = Self(2);

    /// Largest accepted sample count.
    pub const MAX: u8 = 8;

    /// Create a new DebounceSamples value with validation.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidDebounce` outside 1..=8.
    pub fn new(value: u8) -> Result<Self, ConfigError> {
        if (1..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ConfigError::InvalidDebounce(value))
        }
    }

    /// Get the raw sample count.
    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Default for DebounceSamples {
    fn default() -> Self {
        Self::TWO
    }
}

impl<'de> Deserialize<'de> for DebounceSamples {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        DebounceSamples::new(value).map_err(de_error)
    }
}

fn de_error<E: serde::de::Error>(e: ConfigError) -> E {
    use core::fmt::Write;
    let mut buf = heapless::String::<128>::new();
    let _ = write!(buf, "{}", e);
    E::custom(buf.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debounce_valid_values() {
        for v in 1..=DebounceSamples::MAX {
            assert!(DebounceSamples::new(v).is_ok());
        }
    }

    #[test]
    fn test_debounce_invalid_values() {
        assert!(DebounceSamples::new(0).is_err());
        assert!(DebounceSamples::new(9).is_err());
    }

    #[test]
    fn test_steps_per_unit_rejects_non_positive() {
        assert!(StepsPerUnit::new(0.0).is_err());
        assert!(StepsPerUnit::new(-4.0).is_err());
        assert!(StepsPerUnit::new(f32::NAN).is_err());
        assert!(StepsPerUnit::new(4000.0).is_ok());
    }

    #[test]
    fn test_steps_unit_conversion() {
        let spu = StepsPerUnit::new(4000.0).unwrap();
        assert!((Steps(1000).to_units(spu) - 0.25).abs() < 1e-6);
        assert!((Steps(-400).to_units(spu) + 0.1).abs() < 1e-6);
    }
}
