//! Platform seams not covered by embedded-hal.
//!
//! GPIO and SPI come from embedded-hal 1.0 directly. The step timer and the
//! millisecond clock used by the continuous scan window are small traits
//! implemented by the board support code.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType as DigitalErrorType, InputPin, OutputPin};
use embedded_hal::spi::{ErrorType as SpiErrorType, Operation, SpiDevice};

use crate::config::TimerTicks;

/// Monotonic millisecond clock.
pub trait Clock {
    /// Milliseconds since an arbitrary epoch. Wraps around.
    fn now_ms(&mut self) -> u32;
}

/// One-shot compare timer driving an interrupt.
pub trait OneShotTimer {
    /// Fire the interrupt again after `ticks`.
    fn arm(&mut self, ticks: TimerTicks);

    /// Stop the interrupt from firing.
    fn disable(&mut self);

    /// Let the interrupt fire again.
    fn enable(&mut self);
}

/// Placeholder for an absent pin.
///
/// Writes are accepted and ignored; reads report low.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPin;

impl DigitalErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl InputPin for NoPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// Placeholder for a machine without a beam positioning device.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSpi;

impl SpiErrorType for NoSpi {
    type Error = Infallible;
}

impl SpiDevice<u8> for NoSpi {
    fn transaction(&mut self, _operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Clock that never advances.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClock;

impl Clock for NoClock {
    fn now_ms(&mut self) -> u32 {
        0
    }
}
