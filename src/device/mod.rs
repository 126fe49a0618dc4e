//! Hardware stepper contract.
//!
//! The motion controller drives any backend implementing [`StepDevice`]: the
//! device knows how to energize its coils and emit exactly one micro-step in
//! a given direction, nothing about velocity or scheduling. A ready-made
//! STEP/DIR pin implementation is provided in [`StepDirStepper`].

mod step_dir;

pub use step_dir::StepDirStepper;

use crate::error::{InvalidArgument, Result};

/// Direction of motor motion.
///
/// Used both as the hardware stepping argument and as the position delta per
/// emitted step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Toward larger positions (+1 per step).
    Positive,
    /// Toward smaller positions (-1 per step).
    Negative,
}

impl Direction {
    /// Get direction from a signed step count.
    #[inline]
    pub fn from_steps(steps: i32) -> Self {
        if steps >= 0 {
            Direction::Positive
        } else {
            Direction::Negative
        }
    }

    /// Get the position delta per step.
    #[inline]
    pub fn delta(self) -> i32 {
        match self {
            Direction::Positive => 1,
            Direction::Negative => -1,
        }
    }

    /// Get the opposite direction.
    #[inline]
    pub fn reversed(self) -> Self {
        match self {
            Direction::Positive => Direction::Negative,
            Direction::Negative => Direction::Positive,
        }
    }
}

/// Events delivered through the motion controller's event callback.
///
/// `StepsCompleted` and `Stopped` are produced by the controller itself; the
/// remaining kinds originate in hardware and are forwarded verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepperEvent {
    /// Steps planned by `move_by`/`move_to` have all been executed.
    StepsCompleted,
    /// A decelerated stop has completed.
    Stopped,
    /// Motor stall detected by the driver.
    StallDetected,
    /// Left end switch changed to pressed.
    LeftEndStopDetected,
    /// Right end switch changed to pressed.
    RightEndStopDetected,
    /// Fault reported by the stepper driver.
    FaultDetected,
}

/// Micro-step divisor (1, 2, 4, 8, 16, 32, 64, 128, 256).
///
/// Validated at construction to be a power of 2 within the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Microsteps(u16);

impl Microsteps {
    /// Full step (no microstepping).
    pub const FULL: Self = Self(1);
    /// Half step.
    pub const HALF: Self = Self(2);
    /// Quarter step.
    pub const QUARTER: Self = Self(4);
    /// Eighth step.
    pub const EIGHTH: Self = Self(8);
    /// Sixteenth step.
    pub const SIXTEENTH: Self = Self(16);
    /// Thirty-second step.
    pub const THIRTY_SECOND: Self = Self(32);
    /// Sixty-fourth step.
    pub const SIXTY_FOURTH: Self = Self(64);
    /// 128th step.
    pub const ONE_TWENTY_EIGHTH: Self = Self(128);
    /// 256th step (maximum resolution).
    pub const TWO_FIFTY_SIXTH: Self = Self(256);

    /// Valid micro-step values.
    const VALID_VALUES: [u16; 9] = [1, 2, 4, 8, 16, 32, 64, 128, 256];

    /// Create a new Microsteps value with validation.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidArgument::InvalidMicrosteps`] if the value is not a
    /// valid power of 2.
    pub fn new(value: u16) -> core::result::Result<Self, InvalidArgument> {
        if Self::VALID_VALUES.contains(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidArgument::InvalidMicrosteps(value))
        }
    }

    /// Get the raw divisor value.
    #[inline]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Check if a value is valid.
    #[inline]
    pub fn is_valid(value: u16) -> bool {
        Self::VALID_VALUES.contains(&value)
    }
}

impl Default for Microsteps {
    fn default() -> Self {
        Self::FULL
    }
}

impl TryFrom<u16> for Microsteps {
    type Error = InvalidArgument;

    fn try_from(value: u16) -> core::result::Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de> serde::Deserialize<'de> for Microsteps {
    fn deserialize<D>(deserializer: D) -> core::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use core::fmt::Write;
        let value = u16::deserialize(deserializer)?;
        Microsteps::new(value).map_err(|e| {
            let mut buf = heapless::String::<128>::new();
            let _ = write!(buf, "{}", e);
            serde::de::Error::custom(buf.as_str())
        })
    }
}

/// Contract the motion controller consumes from a hardware stepper.
///
/// `enable`/`disable` gate coil power; `step` emits exactly one micro-step.
/// The micro-step resolution operations are optional and default to
/// [`Error::NotImplemented`](crate::Error::NotImplemented).
pub trait StepDevice {
    /// Energize the coils. Does not move the motor.
    fn enable(&mut self) -> Result<()>;

    /// Cancel any motion and de-energize the coils.
    fn disable(&mut self) -> Result<()>;

    /// Emit exactly one micro-step in the given direction.
    fn step(&mut self, direction: Direction) -> Result<()>;

    /// Set the micro-step resolution.
    fn set_micro_step_resolution(&mut self, _resolution: Microsteps) -> Result<()> {
        Err(crate::error::Error::NotImplemented)
    }

    /// Get the micro-step resolution.
    fn get_micro_step_resolution(&self) -> Result<Microsteps> {
        Err(crate::error::Error::NotImplemented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_from_steps() {
        assert_eq!(Direction::from_steps(10), Direction::Positive);
        assert_eq!(Direction::from_steps(0), Direction::Positive);
        assert_eq!(Direction::from_steps(-1), Direction::Negative);
    }

    #[test]
    fn test_direction_delta() {
        assert_eq!(Direction::Positive.delta(), 1);
        assert_eq!(Direction::Negative.delta(), -1);
        assert_eq!(Direction::Positive.reversed(), Direction::Negative);
    }

    #[test]
    fn test_microsteps_valid_values() {
        for &v in &Microsteps::VALID_VALUES {
            assert!(Microsteps::new(v).is_ok());
        }
    }

    #[test]
    fn test_microsteps_invalid_values() {
        assert!(Microsteps::new(0).is_err());
        assert!(Microsteps::new(3).is_err());
        assert!(Microsteps::new(17).is_err());
        assert!(Microsteps::new(512).is_err());
    }
}
