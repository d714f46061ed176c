//! Beam positioning over SPI.
//!
//! The galvo controller is a bank of digital potentiometers. Each beam axis
//! uses three channels: a coarse byte, the coarse byte plus one, and a fine
//! byte. A channel write is one SPI transaction of `[channel, value]`.

use embedded_hal::spi::SpiDevice;

use crate::config::OutputConfig;
use crate::error::HardwareError;
use crate::motion::Direction;

/// One of the two beam axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BeamAxis {
    /// Channels 0, 2, 4.
    X,
    /// Channels 1, 3, 5.
    Y,
}

impl BeamAxis {
    #[inline]
    const fn index(self) -> usize {
        self as usize
    }

    /// Coarse, coarse+1 and fine channel numbers.
    #[inline]
    pub const fn channels(self) -> [u8; 3] {
        let base = self as u8;
        [base, base + 2, base + 4]
    }
}

/// Split a beam coordinate into `(coarse, fine)` potentiometer bytes.
///
/// The coordinate is scaled and truncated to 16 bits. A coarse byte of 0xFF
/// would overflow the coarse+1 channel, so it folds to `(0xFE, 0xFF)`.
pub fn encode(coordinate: u16, scalar: u16) -> (u8, u8) {
    let value = (coordinate as u32).wrapping_mul(scalar as u32) & 0xFFFF;
    let coarse = (value >> 8) as u8;
    let fine = value as u8;
    if coarse == 0xFF {
        (0xFE, 0xFF)
    } else {
        (coarse, fine)
    }
}

/// Galvo driver tracking the beam world coordinate.
pub struct Galvo<SPI> {
    spi: SPI,
    scalar: u16,
    max_coordinate: u16,
    world: [i32; 2],
}

impl<SPI: SpiDevice> Galvo<SPI> {
    /// Create a driver at world coordinate (0, 0). Nothing is transmitted.
    pub fn new(spi: SPI, config: &OutputConfig) -> Self {
        Self {
            spi,
            scalar: config.galvo_scalar,
            max_coordinate: config.max_coordinate,
            world: [0, 0],
        }
    }

    /// Current world coordinate of both axes.
    #[inline]
    pub fn world(&self) -> [i32; 2] {
        self.world
    }

    /// Overwrite the world coordinate without moving the beam.
    pub fn set_world(&mut self, x: i32, y: i32) {
        self.world = [x, y];
    }

    /// Clamp a world coordinate to the device range.
    #[inline]
    pub fn clamp(&self, world: i32) -> u16 {
        world.clamp(0, self.max_coordinate as i32) as u16
    }

    /// Move the world coordinate of one axis one unit without transmitting.
    pub fn shift(&mut self, axis: BeamAxis, direction: Direction) {
        let world = &mut self.world[axis.index()];
        *world = world.saturating_add(direction.sign());
    }

    /// Step one axis one unit and transmit it.
    pub fn step(&mut self, axis: BeamAxis, direction: Direction) -> Result<(), HardwareError> {
        self.shift(axis, direction);
        let coordinate = self.clamp(self.world[axis.index()]);
        self.move_axis(axis, coordinate)
    }

    /// Transmit one axis.
    pub fn move_axis(&mut self, axis: BeamAxis, coordinate: u16) -> Result<(), HardwareError> {
        let (coarse, fine) = encode(coordinate, self.scalar);
        let [c0, c1, c2] = axis.channels();
        self.write_channel(c0, coarse)?;
        self.write_channel(c1, coarse + 1)?;
        self.write_channel(c2, fine)
    }

    /// Transmit both axes, interleaved channel by channel.
    pub fn move_to(&mut self, x: u16, y: u16) -> Result<(), HardwareError> {
        let (x_coarse, x_fine) = encode(x, self.scalar);
        let (y_coarse, y_fine) = encode(y, self.scalar);
        self.write_channel(0, x_coarse)?;
        self.write_channel(1, y_coarse)?;
        self.write_channel(2, x_coarse + 1)?;
        self.write_channel(3, y_coarse + 1)?;
        self.write_channel(4, x_fine)?;
        self.write_channel(5, y_fine)
    }

    /// Retransmit the current world coordinate.
    pub fn refresh(&mut self) -> Result<(), HardwareError> {
        let x = self.clamp(self.world[0]);
        let y = self.clamp(self.world[1]);
        self.move_to(x, y)
    }

    fn write_channel(&mut self, channel: u8, value: u8) -> Result<(), HardwareError> {
        self.spi
            .write(&[channel, value])
            .map_err(|_| HardwareError::BusError)
    }

    /// Release the SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }
}
