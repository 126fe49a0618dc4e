//! Velocity ramp generators.
//!
//! A ramp is a pure state machine over step counts and intervals: given a
//! step budget it yields the inter-step interval for each upcoming pulse,
//! and it knows how to plan a decelerated stop from the current interval.
//! Two generators are provided: [`ConstantRamp`] (fixed interval) and
//! [`TrapezoidalRamp`] (integer AVR446 acceleration profile).

mod constant;
mod trapezoidal;

pub use constant::ConstantRamp;
pub use trapezoidal::TrapezoidalRamp;

use serde::Deserialize;

use crate::error::{InvalidArgument, Result};

/// Step budget denoting a continuous move: the ramp runs until stopped.
pub const CONTINUOUS_STEPS: u32 = i32::MAX as u32;

/// Operations every ramp generator implements.
///
/// All three operations are pure over ramp state; the controller invokes
/// them with its lock held.
pub trait RampGenerator {
    /// Initialize the phase counters for a new move of `step_count` steps.
    ///
    /// Returns the number of steps the ramp will emit. Equal to `step_count`
    /// for well-posed inputs; a trapezoidal ramp splits the budget across
    /// pre-deceleration, acceleration, cruise and deceleration phases.
    fn prepare_move(&mut self, step_count: u32) -> Result<u32>;

    /// Reconfigure the ramp to come to rest from the current interval.
    ///
    /// Returns the number of steps emitted before rest; 0 means the stop is
    /// immediate. Non-deceleration phase counters are zeroed.
    fn prepare_stop(&mut self) -> Result<u32>;

    /// Advance one step, returning the interval to wait before the next
    /// step. Returns 0 once the move is finished. Each successful call
    /// decrements exactly one phase counter.
    fn next_interval(&mut self) -> u64;

    /// Interval of the most recently planned step, 0 when at rest.
    fn current_interval(&self) -> u64;

    /// Discard any plan and return to rest.
    fn reset(&mut self);
}

/// Constant-velocity ramp profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ConstantProfile {
    /// Fixed interval between steps in nanoseconds.
    pub interval_ns: u64,
}

impl ConstantProfile {
    /// Check the profile describes a velocity.
    pub fn validate(&self) -> Result<()> {
        if self.interval_ns == 0 {
            return Err(InvalidArgument::ZeroInterval.into());
        }
        Ok(())
    }
}

/// Trapezoidal ramp profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TrapezoidalProfile {
    /// Interval in nanoseconds reached after acceleration and held during
    /// the constant-speed phase (target speed).
    pub interval_ns: u64,

    /// Acceleration rate in steps/s² used during the acceleration phase.
    pub acceleration_rate: u32,

    /// Deceleration rate in steps/s² used during the deceleration phase.
    pub deceleration_rate: u32,
}

impl TrapezoidalProfile {
    /// Check every rate and the cruise interval are non-zero.
    pub fn validate(&self) -> Result<()> {
        if self.interval_ns == 0 {
            return Err(InvalidArgument::ZeroInterval.into());
        }
        if self.acceleration_rate == 0 {
            return Err(InvalidArgument::ZeroAccelerationRate.into());
        }
        if self.deceleration_rate == 0 {
            return Err(InvalidArgument::ZeroDecelerationRate.into());
        }
        Ok(())
    }
}

/// Velocity profile for a ramp generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum RampProfile {
    /// Constant velocity, no acceleration or deceleration.
    Constant(ConstantProfile),
    /// Trapezoidal velocity with integer AVR446 acceleration.
    Trapezoidal(TrapezoidalProfile),
}

impl RampProfile {
    /// Validate the profile parameters.
    pub fn validate(&self) -> Result<()> {
        match self {
            RampProfile::Constant(p) => p.validate(),
            RampProfile::Trapezoidal(p) => p.validate(),
        }
    }
}

/// A ramp generator selected from a [`RampProfile`].
#[derive(Debug, Clone)]
pub enum Ramp {
    /// Constant-velocity generator.
    Constant(ConstantRamp),
    /// Trapezoidal generator.
    Trapezoidal(TrapezoidalRamp),
}

impl Ramp {
    /// Build the generator matching a validated profile.
    pub fn from_profile(profile: &RampProfile) -> Result<Self> {
        match profile {
            RampProfile::Constant(p) => Ok(Ramp::Constant(ConstantRamp::new(p)?)),
            RampProfile::Trapezoidal(p) => Ok(Ramp::Trapezoidal(TrapezoidalRamp::new(p)?)),
        }
    }
}

impl RampGenerator for Ramp {
    fn prepare_move(&mut self, step_count: u32) -> Result<u32> {
        match self {
            Ramp::Constant(r) => r.prepare_move(step_count),
            Ramp::Trapezoidal(r) => r.prepare_move(step_count),
        }
    }

    fn prepare_stop(&mut self) -> Result<u32> {
        match self {
            Ramp::Constant(r) => r.prepare_stop(),
            Ramp::Trapezoidal(r) => r.prepare_stop(),
        }
    }

    fn next_interval(&mut self) -> u64 {
        match self {
            Ramp::Constant(r) => r.next_interval(),
            Ramp::Trapezoidal(r) => r.next_interval(),
        }
    }

    fn current_interval(&self) -> u64 {
        match self {
            Ramp::Constant(r) => r.current_interval(),
            Ramp::Trapezoidal(r) => r.current_interval(),
        }
    }

    fn reset(&mut self) {
        match self {
            Ramp::Constant(r) => r.reset(),
            Ramp::Trapezoidal(r) => r.reset(),
        }
    }
}
