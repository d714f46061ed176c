//! Output drivers: step pulses, direction and enable lines, beam moves.
//!
//! In discrete mode every beam-axis event moves the beam one unit. In
//! continuous scan mode a block's beam displacement becomes a single sweep:
//! the beam alternates between the start and end coordinates until the scan
//! window elapses, then parks at the end coordinate.

use embedded_hal::digital::{OutputPin, PinState};
use embedded_hal::spi::SpiDevice;

use crate::config::{AxisConfig, Drive, OutputConfig, OutputMode};
use crate::error::HardwareError;
use crate::hal::Clock;
use crate::motion::{Axis, AxisMask, Block, Direction, NUM_AXES};

use super::galvo::{BeamAxis, Galvo};

/// Output pins of one axis. Absent pins are skipped.
pub struct AxisPins<O> {
    /// STEP output.
    pub step: Option<O>,
    /// DIR output.
    pub dir: Option<O>,
    /// Driver enable output.
    pub enable: Option<O>,
}

impl<O> AxisPins<O> {
    /// No pins.
    pub const fn none() -> Self {
        Self {
            step: None,
            dir: None,
            enable: None,
        }
    }

    /// STEP and DIR without an enable line.
    pub fn step_dir(step: O, dir: O) -> Self {
        Self {
            step: Some(step),
            dir: Some(dir),
            enable: None,
        }
    }

    /// Add an enable line.
    pub fn with_enable(mut self, enable: O) -> Self {
        self.enable = Some(enable);
        self
    }
}

impl<O> Default for AxisPins<O> {
    fn default() -> Self {
        Self::none()
    }
}

/// Output lines of one axis with their configured polarity.
pub(super) struct AxisOutput<O> {
    pins: AxisPins<O>,
    drive: Drive,
    dir_level_negative: bool,
    step_active: bool,
    enable_active: bool,
    // Cached to avoid redundant DIR writes.
    current_direction: Option<Direction>,
}

impl<O: OutputPin> AxisOutput<O> {
    pub(super) fn new(pins: AxisPins<O>, config: &AxisConfig) -> Self {
        Self {
            pins,
            drive: config.drive,
            dir_level_negative: config.dir_level_negative(),
            step_active: config.step_active_level(),
            enable_active: config.enable_active_high,
            current_direction: None,
        }
    }

    pub(super) fn set_direction(&mut self, direction: Direction) -> Result<(), HardwareError> {
        if self.current_direction == Some(direction) {
            return Ok(());
        }
        if let Some(dir) = self.pins.dir.as_mut() {
            let negative = direction == Direction::Negative;
            let level = PinState::from(negative == self.dir_level_negative);
            dir.set_state(level).map_err(|_| HardwareError::PinError)?;
        }
        self.current_direction = Some(direction);
        Ok(())
    }

    pub(super) fn pulse(&mut self) -> Result<(), HardwareError> {
        if let Some(step) = self.pins.step.as_mut() {
            step.set_state(PinState::from(self.step_active))
                .map_err(|_| HardwareError::PinError)?;
            step.set_state(PinState::from(!self.step_active))
                .map_err(|_| HardwareError::PinError)?;
        }
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<(), HardwareError> {
        if let Some(enable) = self.pins.enable.as_mut() {
            let level = PinState::from(enabled == self.enable_active);
            enable.set_state(level).map_err(|_| HardwareError::PinError)?;
        }
        Ok(())
    }
}

#[cfg(test)]
impl<O> AxisOutput<O> {
    pub(super) fn into_pins(self) -> AxisPins<O> {
        self.pins
    }
}

/// Sweep between two beam coordinates while the scan window is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Scan {
    from: [u16; 2],
    to: [u16; 2],
    started_ms: u32,
    at_end: bool,
}

/// Progress of the output side of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputStatus {
    /// Outputs are done with the block.
    Settled,
    /// A continuous scan is still sweeping.
    Scanning,
}

/// All outputs of the machine.
pub struct OutputDriver<O, SPI, C> {
    axes: [AxisOutput<O>; NUM_AXES],
    galvo: Option<Galvo<SPI>>,
    clock: Option<C>,
    mode: OutputMode,
    scan_window_ms: u32,
    scan: Option<Scan>,
}

impl<O, SPI, C> OutputDriver<O, SPI, C>
where
    O: OutputPin,
    SPI: SpiDevice,
    C: Clock,
{
    /// Create the driver. The builder checks that beam axes have a galvo
    /// and that scan mode has a clock.
    pub(crate) fn new(
        pins: [AxisPins<O>; NUM_AXES],
        configs: [&AxisConfig; NUM_AXES],
        output: &OutputConfig,
        galvo: Option<SPI>,
        clock: Option<C>,
    ) -> Self {
        let mut i = 0;
        let axes = pins.map(|p| {
            let out = AxisOutput::new(p, configs[i]);
            i += 1;
            out
        });
        Self {
            axes,
            galvo: galvo.map(|spi| Galvo::new(spi, output)),
            clock,
            mode: output.mode,
            scan_window_ms: output.scan_window_ms,
            scan: None,
        }
    }

    fn beam_axis(&self, axis: Axis) -> Option<BeamAxis> {
        if self.axes[axis.index()].drive != Drive::Beam {
            return None;
        }
        match axis {
            Axis::X => Some(BeamAxis::X),
            Axis::Y => Some(BeamAxis::Y),
            _ => None,
        }
    }

    fn beam_axes(&self) -> AxisMask {
        [Axis::X, Axis::Y]
            .into_iter()
            .fold(AxisMask::EMPTY, |m, a| m.with(a, self.beam_axis(a).is_some()))
    }

    /// Prepare outputs for a newly loaded block.
    ///
    /// Enables the drivers of moving axes and, in scan mode, records the
    /// sweep for the block's beam displacement.
    pub fn begin_block(&mut self, block: &Block) -> Result<(), HardwareError> {
        let moving = block.moving_axes();
        for axis in moving.iter() {
            self.axes[axis.index()].set_enabled(true)?;
        }

        if self.mode == OutputMode::ContinuousScan && moving.intersects(self.beam_axes()) {
            let started_ms = self.clock.as_mut().map(|c| c.now_ms()).unwrap_or(0);
            if let Some(galvo) = self.galvo.as_mut() {
                let from_world = galvo.world();
                let mut to_world = from_world;
                for (i, axis) in [Axis::X, Axis::Y].into_iter().enumerate() {
                    if self.axes[axis.index()].drive == Drive::Beam {
                        to_world[i] = to_world[i].saturating_add(block.displacement(axis));
                    }
                }
                self.scan = Some(Scan {
                    from: [galvo.clamp(from_world[0]), galvo.clamp(from_world[1])],
                    to: [galvo.clamp(to_world[0]), galvo.clamp(to_world[1])],
                    started_ms,
                    at_end: false,
                });
            }
        }
        Ok(())
    }

    /// Enable or disable the driver of one axis.
    pub fn set_enabled(&mut self, axis: Axis, enabled: bool) -> Result<(), HardwareError> {
        self.axes[axis.index()].set_enabled(enabled)
    }

    /// Disable every driver.
    pub fn disable_all(&mut self) -> Result<(), HardwareError> {
        for axis in self.axes.iter_mut() {
            axis.set_enabled(false)?;
        }
        Ok(())
    }

    /// Set the DIR output of one axis.
    pub fn set_direction(&mut self, axis: Axis, direction: Direction) -> Result<(), HardwareError> {
        self.axes[axis.index()].set_direction(direction)
    }

    /// Emit one step event on one axis.
    pub fn emit(&mut self, axis: Axis, direction: Direction) -> Result<(), HardwareError> {
        match self.beam_axis(axis) {
            Some(beam) => {
                if let Some(galvo) = self.galvo.as_mut() {
                    match self.mode {
                        OutputMode::Discrete => galvo.step(beam, direction)?,
                        // The sweep covers the displacement; only track it.
                        OutputMode::ContinuousScan => galvo.shift(beam, direction),
                    }
                }
                Ok(())
            }
            None => self.axes[axis.index()].pulse(),
        }
    }

    /// Drive the scan sweep, if any.
    ///
    /// While the window is open each call toggles the beam between the
    /// sweep endpoints. Once it has elapsed the beam parks at the end
    /// coordinate and the outputs report settled.
    pub fn service(&mut self) -> Result<OutputStatus, HardwareError> {
        let Some(mut scan) = self.scan else {
            return Ok(OutputStatus::Settled);
        };
        let now = self.clock.as_mut().map(|c| c.now_ms()).unwrap_or(scan.started_ms);
        let Some(galvo) = self.galvo.as_mut() else {
            self.scan = None;
            return Ok(OutputStatus::Settled);
        };

        if now.wrapping_sub(scan.started_ms) < self.scan_window_ms {
            let [x, y] = if scan.at_end { scan.from } else { scan.to };
            scan.at_end = !scan.at_end;
            self.scan = Some(scan);
            galvo.move_to(x, y)?;
            Ok(OutputStatus::Scanning)
        } else {
            self.scan = None;
            galvo.move_to(scan.to[0], scan.to[1])?;
            Ok(OutputStatus::Settled)
        }
    }

    /// Drop any sweep in progress without moving the beam.
    ///
    /// The remembered beam coordinate already holds the point the emitted
    /// events reached.
    pub fn abort_scan(&mut self) {
        self.scan = None;
    }

    /// End any sweep in progress at once and park the beam at the point the
    /// emitted events reached.
    pub fn stop_scan(&mut self) -> Result<(), HardwareError> {
        if self.scan.is_none() {
            return Ok(());
        }
        self.abort_scan();
        self.refresh_beam()
    }

    /// Move the beam to a world coordinate and remember it.
    pub fn move_beam(&mut self, x: i32, y: i32) -> Result<(), HardwareError> {
        let galvo = self.galvo.as_mut().ok_or(HardwareError::BusError)?;
        galvo.set_world(x, y);
        galvo.refresh()
    }

    /// Overwrite the remembered beam coordinate without moving it.
    pub fn set_beam_position(&mut self, x: i32, y: i32) {
        if let Some(galvo) = self.galvo.as_mut() {
            galvo.set_world(x, y);
        }
    }

    /// Retransmit the remembered beam coordinate.
    pub fn refresh_beam(&mut self) -> Result<(), HardwareError> {
        match self.galvo.as_mut() {
            Some(galvo) => galvo.refresh(),
            None => Ok(()),
        }
    }

    /// Remembered beam coordinate.
    pub fn beam_position(&self) -> Option<[i32; 2]> {
        self.galvo.as_ref().map(|g| g.world())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AxesConfig;
    use crate::hal::{NoClock, NoSpi};
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};

    fn driver_with_z(
        step: PinMock,
        dir: PinMock,
        enable: PinMock,
        config: &AxisConfig,
    ) -> OutputDriver<PinMock, NoSpi, NoClock> {
        let axes = AxesConfig::default();
        let pins = [
            AxisPins::none(),
            AxisPins::none(),
            AxisPins::step_dir(step, dir).with_enable(enable),
            AxisPins::none(),
        ];
        OutputDriver::new(
            pins,
            [&axes.x, &axes.y, config, &axes.e],
            &OutputConfig::default(),
            None,
            None,
        )
    }

    fn finish(driver: OutputDriver<PinMock, NoSpi, NoClock>) {
        let [_, _, z, _] = driver.axes;
        let AxisPins { step, dir, enable } = z.pins;
        for mut pin in [step, dir, enable].into_iter().flatten() {
            pin.done();
        }
    }

    #[test]
    fn test_pulse_and_cached_direction() {
        let step = PinMock::new(&[
            Transaction::set(State::High),
            Transaction::set(State::Low),
            Transaction::set(State::High),
            Transaction::set(State::Low),
        ]);
        // Active-low enable; negative is DIR low without inversion.
        let dir = PinMock::new(&[Transaction::set(State::Low)]);
        let enable = PinMock::new(&[Transaction::set(State::Low)]);
        let mut driver = driver_with_z(step, dir, enable, &AxisConfig::default());

        driver.set_enabled(Axis::Z, true).unwrap();
        driver.set_direction(Axis::Z, Direction::Negative).unwrap();
        driver.emit(Axis::Z, Direction::Negative).unwrap();
        // Same direction again: no DIR write.
        driver.set_direction(Axis::Z, Direction::Negative).unwrap();
        driver.emit(Axis::Z, Direction::Negative).unwrap();

        finish(driver);
    }

    #[test]
    fn test_inverted_step_and_direction() {
        let config = AxisConfig {
            invert_dir: true,
            invert_step: true,
            enable_active_high: true,
            ..AxisConfig::default()
        };
        let step = PinMock::new(&[Transaction::set(State::Low), Transaction::set(State::High)]);
        let dir = PinMock::new(&[Transaction::set(State::Low)]);
        let enable = PinMock::new(&[Transaction::set(State::High)]);
        let mut driver = driver_with_z(step, dir, enable, &config);

        driver.set_enabled(Axis::Z, true).unwrap();
        driver.set_direction(Axis::Z, Direction::Positive).unwrap();
        driver.emit(Axis::Z, Direction::Positive).unwrap();

        finish(driver);
    }

    #[test]
    fn test_no_scan_is_settled() {
        let step = PinMock::new(&[]);
        let dir = PinMock::new(&[]);
        let enable = PinMock::new(&[]);
        let mut driver = driver_with_z(step, dir, enable, &AxisConfig::default());
        assert_eq!(driver.service(), Ok(OutputStatus::Settled));
        assert!(driver.beam_position().is_none());
        finish(driver);
    }
}
