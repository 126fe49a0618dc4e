//! Constant-velocity ramp generator.

use log::debug;

use crate::error::Result;

use super::{ConstantProfile, RampGenerator, CONTINUOUS_STEPS};

/// Ramp generator that steps at a fixed interval.
///
/// Acceleration and deceleration are ignored: the first step already runs at
/// the profile interval and a stop is immediate.
#[derive(Debug, Clone)]
pub struct ConstantRamp {
    interval_ns: u64,
    steps_left: u32,
}

impl ConstantRamp {
    /// Create a generator from a validated profile.
    pub fn new(profile: &ConstantProfile) -> Result<Self> {
        profile.validate()?;
        Ok(Self {
            interval_ns: profile.interval_ns,
            steps_left: 0,
        })
    }
}

impl RampGenerator for ConstantRamp {
    /// Pass [`CONTINUOUS_STEPS`] as `step_count` to run indefinitely until
    /// explicitly stopped.
    fn prepare_move(&mut self, step_count: u32) -> Result<u32> {
        debug!(
            "prepare constant velocity movement by {} steps (continuous: {})",
            step_count,
            step_count == CONTINUOUS_STEPS
        );

        self.steps_left = step_count;
        Ok(step_count)
    }

    /// Stops without deceleration; there are never stop steps to emit.
    fn prepare_stop(&mut self) -> Result<u32> {
        debug!("prepare immediate stop");

        self.steps_left = 0;
        Ok(0)
    }

    fn next_interval(&mut self) -> u64 {
        if self.steps_left > 0 {
            // continuous moves hold the counter to avoid underflow
            if self.steps_left != CONTINUOUS_STEPS {
                self.steps_left -= 1;
            }
            return self.interval_ns;
        }

        // movement finished
        0
    }

    fn current_interval(&self) -> u64 {
        if self.steps_left > 0 {
            self.interval_ns
        } else {
            0
        }
    }

    fn reset(&mut self) {
        self.steps_left = 0;
    }
}
