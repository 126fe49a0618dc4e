//! Simulated timing source backed by a virtual clock.
//!
//! The clock jumps to each armed deadline: a test harness checks
//! [`interval`](super::TimingSource::interval) and, while it is non-zero,
//! invokes the controller's tick handler, exactly as a hardware counter
//! would. The full sequence of armed intervals is recorded for inspection.

use super::TimingSource;
use crate::error::Result;

/// Virtual-clock timing source for host tests and simulations.
#[derive(Debug, Default)]
pub struct SimTimingSource {
    armed_interval: u64,
    now_ns: u64,
    history: Vec<u64>,
}

impl SimTimingSource {
    /// Create a disarmed timing source at virtual time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed through the most recently armed deadline.
    #[inline]
    pub fn now_ns(&self) -> u64 {
        self.now_ns
    }

    /// Every interval armed so far, in order.
    #[inline]
    pub fn history(&self) -> &[u64] {
        &self.history
    }
}

impl TimingSource for SimTimingSource {
    fn start(&mut self, interval_ns: u64) -> Result<()> {
        self.armed_interval = interval_ns;
        self.now_ns += interval_ns;
        self.history.push(interval_ns);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.armed_interval = 0;
        Ok(())
    }

    fn interval(&self) -> u64 {
        self.armed_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_and_disarm() {
        let mut source = SimTimingSource::new();
        assert_eq!(source.interval(), 0);

        source.start(1_000_000).unwrap();
        assert_eq!(source.interval(), 1_000_000);
        source.start(500_000).unwrap();
        assert_eq!(source.interval(), 500_000);

        source.stop().unwrap();
        assert_eq!(source.interval(), 0);
    }

    #[test]
    fn test_clock_accumulates_armed_intervals() {
        let mut source = SimTimingSource::new();
        source.start(1_000_000).unwrap();
        source.start(2_000_000).unwrap();
        source.stop().unwrap();

        assert_eq!(source.now_ns(), 3_000_000);
        assert_eq!(source.history(), &[1_000_000, 2_000_000]);
    }
}
