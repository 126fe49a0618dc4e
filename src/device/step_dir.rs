//! STEP/DIR stepper device.
//!
//! Generic over embedded-hal 1.0 pin types: a pulse on STEP moves one
//! micro-step in the direction selected by DIR.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::error::{Error, Result};

use super::{Direction, Microsteps, StepDevice};

/// Width of the STEP pulse in microseconds. Most driver ICs require >1 us.
const STEP_PULSE_WIDTH_US: u32 = 2;

/// Stepper device driven through STEP and DIR pins.
///
/// Generic over:
/// - `STEP`: STEP pin type (must implement `OutputPin`)
/// - `DIR`: DIR pin type (must implement `OutputPin`)
/// - `DELAY`: Delay provider for the pulse width (must implement `DelayNs`)
pub struct StepDirStepper<STEP, DIR, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    DELAY: DelayNs,
{
    /// STEP pin (pulse to move one step).
    step_pin: STEP,

    /// DIR pin (high = positive, low = negative, or inverted).
    dir_pin: DIR,

    /// Delay provider for the step pulse width.
    delay: DELAY,

    /// Current direction (cached to avoid unnecessary pin writes).
    current_direction: Option<Direction>,

    /// Whether direction pin logic is inverted.
    invert_direction: bool,

    /// Configured micro-step resolution.
    resolution: Microsteps,

    /// Whether the coils are energized.
    enabled: bool,
}

impl<STEP, DIR, DELAY> StepDirStepper<STEP, DIR, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    DELAY: DelayNs,
{
    /// Create a new STEP/DIR device. The device starts disabled.
    pub fn new(step_pin: STEP, dir_pin: DIR, delay: DELAY) -> Self {
        Self {
            step_pin,
            dir_pin,
            delay,
            current_direction: None,
            invert_direction: false,
            resolution: Microsteps::FULL,
            enabled: false,
        }
    }

    /// Invert the DIR pin logic.
    pub fn with_inverted_direction(mut self, invert: bool) -> Self {
        self.invert_direction = invert;
        self
    }

    /// Whether the coils are currently energized.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_direction(&mut self, direction: Direction) -> Result<()> {
        if self.current_direction == Some(direction) {
            return Ok(());
        }

        let pin_high = match direction {
            Direction::Positive => !self.invert_direction,
            Direction::Negative => self.invert_direction,
        };

        if pin_high {
            self.dir_pin.set_high().map_err(|_| Error::Io)?;
        } else {
            self.dir_pin.set_low().map_err(|_| Error::Io)?;
        }

        self.current_direction = Some(direction);
        Ok(())
    }
}

impl<STEP, DIR, DELAY> StepDevice for StepDirStepper<STEP, DIR, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    DELAY: DelayNs,
{
    fn enable(&mut self) -> Result<()> {
        self.enabled = true;
        Ok(())
    }

    fn disable(&mut self) -> Result<()> {
        self.enabled = false;
        Ok(())
    }

    fn step(&mut self, direction: Direction) -> Result<()> {
        if !self.enabled {
            return Err(Error::NotReady);
        }

        self.set_direction(direction)?;

        self.step_pin.set_high().map_err(|_| Error::Io)?;
        self.delay.delay_us(STEP_PULSE_WIDTH_US);
        self.step_pin.set_low().map_err(|_| Error::Io)?;

        Ok(())
    }

    fn set_micro_step_resolution(&mut self, resolution: Microsteps) -> Result<()> {
        self.resolution = resolution;
        Ok(())
    }

    fn get_micro_step_resolution(&self) -> Result<Microsteps> {
        Ok(self.resolution)
    }
}
