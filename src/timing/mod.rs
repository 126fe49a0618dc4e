//! Timing source contract.
//!
//! A timing source is a one-shot countdown shared by nothing: one instance
//! per controlled motor. `start` arms it for an interval in nanoseconds;
//! when the interval elapses the embedding invokes
//! [`MotionController::handle_tick`](crate::MotionController::handle_tick)
//! exactly once. `start` on an armed source re-arms it.

#[cfg(feature = "std")]
mod sim;

#[cfg(feature = "std")]
pub use sim::SimTimingSource;

use crate::error::Result;

/// One-shot countdown timer consumed by the motion controller.
pub trait TimingSource {
    /// Prepare the timing source. Called once at controller construction.
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Arm the countdown: the tick fires once after `interval_ns` nanoseconds.
    fn start(&mut self, interval_ns: u64) -> Result<()>;

    /// Disarm the countdown. Pending ticks must not fire.
    fn stop(&mut self) -> Result<()>;

    /// Currently armed interval in nanoseconds, 0 iff disarmed.
    fn interval(&self) -> u64;
}
