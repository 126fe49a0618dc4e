//! Trapezoidal ramp generator.
//!
//! Implements the integer-only step timing recurrence from Atmel application
//! note AVR446: the interval for step `n` of a constant-acceleration profile
//! is derived from the previous interval with one division, carrying the
//! division remainder forward so cumulative timing error stays bounded. No
//! floating point is used anywhere.

use log::debug;

use crate::error::{InvalidArgument, Result};

use super::{RampGenerator, TrapezoidalProfile};

const NSEC_PER_SEC: u64 = 1_000_000_000;

/// Scale for the fixed-point start-interval computation. Chosen so that
/// `2 * ISQRT_SCALE * ISQRT_SCALE` just fits in a u64, maximizing the
/// precision available to `isqrt`.
const ISQRT_SCALE: u64 = 3_037_000_499;

/// Integer square root of a 64-bit value via the Babylonian method.
///
/// Returns the largest integer whose square does not exceed `n`.
pub(crate) fn isqrt(n: u64) -> u32 {
    if n <= 1 {
        return n as u32;
    }

    let mut x = n;
    let mut y = (x + 1) / 2;

    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x as u32
}

/// Interval of the very first step when accelerating from rest.
///
/// AVR446 §2.3.1: `c0 = f * sqrt(2 / a)`, corrected by the factor 0.676 to
/// compensate the error of the inter-step approximation. Division of 2 by
/// the acceleration would truncate to zero, so the formula is evaluated as
/// `f * 0.676 * isqrt(2 * scale² / a) / scale`.
///
/// Returns `None` for a zero acceleration rate.
fn start_interval(rate: u32) -> Option<u64> {
    if rate == 0 {
        return None;
    }

    let scaled = isqrt(2 * ISQRT_SCALE * ISQRT_SCALE / rate as u64) as u64;
    Some(NSEC_PER_SEC * 676 / 1000 * scaled / ISQRT_SCALE)
}

/// Steps needed to change between rest and the velocity described by
/// `interval_ns` at the given rate: `(f / interval)² / (2 * rate)`.
fn steps_needed(interval_ns: u64, rate: u32) -> u32 {
    if interval_ns == 0 || rate == 0 {
        return 0;
    }

    let velocity = NSEC_PER_SEC / interval_ns;
    let steps = velocity * velocity / (2 * rate as u64);
    steps.min(u32::MAX as u64) as u32
}

/// Trapezoidal ramp state.
///
/// A move is split across four phases consumed in order: pre-deceleration
/// (slowing from a faster current speed onto the new cruise speed),
/// acceleration, cruise, deceleration. Counters track the steps left in
/// each phase; the recurrence scratch registers carry the integer-division
/// remainder between steps.
#[derive(Debug, Clone)]
pub struct TrapezoidalRamp {
    profile: TrapezoidalProfile,

    pre_decel_steps_left: u32,
    accel_steps_left: u32,
    run_steps_left: u32,
    decel_steps_left: u32,

    /// Cruise interval of the active plan.
    run_interval: u64,
    /// `c0` for the configured acceleration rate.
    first_acceleration_interval: u64,
    /// `c0` for the configured deceleration rate, forced as the final step.
    last_deceleration_interval: u64,
    /// Remainder carried between recurrence updates.
    interval_calculation_rest: u64,
    /// Index `n` on the acceleration curve.
    acceleration_idx: u32,
    /// Interval planned for the upcoming step, 0 at rest.
    current_interval: u64,
}

impl TrapezoidalRamp {
    /// Create a generator from a validated profile.
    pub fn new(profile: &TrapezoidalProfile) -> Result<Self> {
        profile.validate()?;
        Ok(Self {
            profile: *profile,
            pre_decel_steps_left: 0,
            accel_steps_left: 0,
            run_steps_left: 0,
            decel_steps_left: 0,
            run_interval: 0,
            first_acceleration_interval: 0,
            last_deceleration_interval: 0,
            interval_calculation_rest: 0,
            acceleration_idx: 0,
            current_interval: 0,
        })
    }

    fn next_accel_step(&mut self) {
        self.accel_steps_left -= 1;

        if self.acceleration_idx == 0 {
            self.acceleration_idx = 1;
            self.interval_calculation_rest = 0;
            self.current_interval = self.first_acceleration_interval;
            return;
        }

        let numerator = 2 * self.current_interval + self.interval_calculation_rest;
        let denominator = 4 * self.acceleration_idx as u64 + 1;

        self.interval_calculation_rest = numerator % denominator;
        self.current_interval -= numerator / denominator;
        self.acceleration_idx += 1;
    }

    fn next_pre_decel_step(&mut self) {
        self.pre_decel_steps_left -= 1;

        let numerator = 2 * self.current_interval + self.interval_calculation_rest;
        let denominator =
            4 * (self.pre_decel_steps_left as u64 + self.decel_steps_left as u64);

        if denominator == 0 {
            // deceleration budget rounded to zero steps, hold the interval
            self.interval_calculation_rest = 0;
            return;
        }

        self.interval_calculation_rest = numerator % denominator;
        self.current_interval += numerator / denominator;
    }

    fn next_decel_step(&mut self) {
        self.decel_steps_left -= 1;

        if self.decel_steps_left == 0 {
            self.interval_calculation_rest = 0;
            self.current_interval = self.last_deceleration_interval;
            return;
        }

        let numerator = 2 * self.current_interval + self.interval_calculation_rest;
        let denominator = 4 * self.decel_steps_left as u64;

        self.interval_calculation_rest = numerator % denominator;
        self.current_interval += numerator / denominator;
    }
}

impl RampGenerator for TrapezoidalRamp {
    fn prepare_move(&mut self, step_count: u32) -> Result<u32> {
        debug!(
            "prepare move: current_interval={} run_interval={} step_count={} \
             acceleration_rate={} deceleration_rate={}",
            self.current_interval,
            self.profile.interval_ns,
            step_count,
            self.profile.acceleration_rate,
            self.profile.deceleration_rate
        );

        self.first_acceleration_interval = start_interval(self.profile.acceleration_rate)
            .ok_or(InvalidArgument::ZeroAccelerationRate)?;
        self.last_deceleration_interval = start_interval(self.profile.deceleration_rate)
            .ok_or(InvalidArgument::ZeroDecelerationRate)?;

        // steps needed to stop from the current velocity
        let stop_lim = steps_needed(self.current_interval, self.profile.deceleration_rate);
        // steps needed to speed up from rest to the requested velocity
        let accel_lim = steps_needed(self.profile.interval_ns, self.profile.acceleration_rate);
        // steps needed to decelerate from the requested velocity to rest
        let decel_lim = steps_needed(self.profile.interval_ns, self.profile.deceleration_rate);

        if self.current_interval != 0 && self.current_interval < self.profile.interval_ns {
            // the requested velocity is slower than the current one, slow down
            // onto the cruise speed before cruising
            self.pre_decel_steps_left = stop_lim.saturating_sub(decel_lim);
            self.accel_steps_left = 0;
            self.acceleration_idx = accel_lim;
            self.decel_steps_left = decel_lim;

            let braking_steps =
                self.pre_decel_steps_left as u64 + self.decel_steps_left as u64;
            self.run_steps_left = (step_count as u64).saturating_sub(braking_steps) as u32;
        } else {
            // at rest or slower than requested, speed up
            self.pre_decel_steps_left = 0;
            self.accel_steps_left = accel_lim.saturating_sub(stop_lim);

            if self.accel_steps_left as u64 + decel_lim as u64 >= step_count as u64 {
                // not enough room to reach cruise, split the budget by the
                // acceleration/deceleration rate ratio
                let decel_share = step_count as u64 * self.profile.acceleration_rate as u64
                    / (self.profile.acceleration_rate as u64
                        + self.profile.deceleration_rate as u64);
                self.decel_steps_left = decel_share as u32;
                self.accel_steps_left = step_count - self.decel_steps_left;
                self.run_steps_left = 0;
            } else {
                self.decel_steps_left = decel_lim;
                self.run_steps_left = step_count - self.accel_steps_left - self.decel_steps_left;
            }

            self.acceleration_idx = 0;
        }

        self.run_interval = self.profile.interval_ns;

        debug!(
            "distance profile: pre_decel_steps={} accel_steps={} run_steps={} decel_steps={} \
             for steps={}",
            self.pre_decel_steps_left,
            self.accel_steps_left,
            self.run_steps_left,
            self.decel_steps_left,
            step_count
        );

        let total = self.pre_decel_steps_left as u64
            + self.accel_steps_left as u64
            + self.run_steps_left as u64
            + self.decel_steps_left as u64;
        Ok(total.min(u32::MAX as u64) as u32)
    }

    fn prepare_stop(&mut self) -> Result<u32> {
        debug!("prepare decelerated stop");

        if self.profile.deceleration_rate == 0 {
            return Err(InvalidArgument::ZeroDecelerationRate.into());
        }

        let deceleration_steps =
            steps_needed(self.current_interval, self.profile.deceleration_rate);

        self.pre_decel_steps_left = 0;
        self.accel_steps_left = 0;
        self.run_steps_left = 0;
        self.run_interval = 0;
        self.decel_steps_left = deceleration_steps;

        Ok(deceleration_steps)
    }

    fn next_interval(&mut self) -> u64 {
        if self.pre_decel_steps_left > 0 {
            self.next_pre_decel_step();
        } else if self.accel_steps_left > 0 {
            self.next_accel_step();
        } else if self.run_steps_left > 0 {
            self.run_steps_left -= 1;
            self.current_interval = self.run_interval;
        } else if self.decel_steps_left > 0 {
            self.next_decel_step();
        } else {
            // movement finished
            self.current_interval = 0;
        }

        self.current_interval
    }

    fn current_interval(&self) -> u64 {
        self.current_interval
    }

    fn reset(&mut self) {
        self.pre_decel_steps_left = 0;
        self.accel_steps_left = 0;
        self.run_steps_left = 0;
        self.decel_steps_left = 0;
        self.run_interval = 0;
        self.interval_calculation_rest = 0;
        self.acceleration_idx = 0;
        self.current_interval = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ramp::CONTINUOUS_STEPS;

    fn ramp(interval_ns: u64, acceleration: u32, deceleration: u32) -> TrapezoidalRamp {
        TrapezoidalRamp::new(&TrapezoidalProfile {
            interval_ns,
            acceleration_rate: acceleration,
            deceleration_rate: deceleration,
        })
        .unwrap()
    }

    fn drain(ramp: &mut TrapezoidalRamp) -> Vec<u64> {
        let mut intervals = Vec::new();
        loop {
            let interval = ramp.next_interval();
            if interval == 0 {
                break;
            }
            intervals.push(interval);
            assert!(intervals.len() < 1_000_000, "ramp failed to exhaust");
        }
        intervals
    }

    #[test]
    fn test_isqrt_bounds() {
        let samples: [u64; 12] = [
            0,
            1,
            2,
            3,
            4,
            5,
            24,
            25,
            u32::MAX as u64,
            (u32::MAX as u64) * (u32::MAX as u64),
            (u32::MAX as u64) * (u32::MAX as u64) + 1,
            u64::MAX,
        ];
        for &n in &samples {
            let root = isqrt(n) as u64;
            assert!(root * root <= n, "isqrt({})² exceeds input", n);
            // (root + 1)² > n, guarded against overflow at the top end
            assert!(
                (root + 1).checked_mul(root + 1).map_or(true, |sq| sq > n),
                "isqrt({}) not the floor root",
                n
            );
        }
    }

    #[test]
    fn test_start_interval_exact_values() {
        assert_eq!(start_interval(500), Some(42_753_993));
        assert_eq!(start_interval(1000), Some(30_231_638));
        assert_eq!(start_interval(5000), Some(13_519_999));
        assert_eq!(start_interval(0), None);
    }

    #[test]
    fn test_steps_needed_closed_form() {
        // 1000 steps/s at 500 steps/s²: 1000² / (2 * 500)
        assert_eq!(steps_needed(1_000_000, 500), 1000);
        // 2000 steps/s at 5000 steps/s²
        assert_eq!(steps_needed(500_000, 5000), 400);
        assert_eq!(steps_needed(0, 500), 0);
    }

    #[test]
    fn test_short_move_splits_without_cruise() {
        let mut ramp = ramp(1_000_000, 500, 500);
        assert_eq!(ramp.prepare_move(20).unwrap(), 20);
        assert_eq!(ramp.accel_steps_left, 10);
        assert_eq!(ramp.decel_steps_left, 10);
        assert_eq!(ramp.run_steps_left, 0);

        let intervals = drain(&mut ramp);
        assert_eq!(intervals.len(), 20);
        assert_eq!(intervals[0], 42_753_993);
        // strictly decreasing while accelerating, strictly increasing while
        // decelerating
        for i in 0..9 {
            assert!(intervals[i + 1] < intervals[i], "accel not monotonic at {}", i);
        }
        for i in 10..19 {
            assert!(intervals[i + 1] > intervals[i], "decel not monotonic at {}", i);
        }
        // the final step is forced to c0 of the deceleration rate
        assert_eq!(intervals[19], 42_753_993);
        // exhausted exactly once
        assert_eq!(ramp.next_interval(), 0);
    }

    #[test]
    fn test_long_move_reaches_cruise() {
        let mut ramp = ramp(500_000, 5000, 5000);
        assert_eq!(ramp.prepare_move(1000).unwrap(), 1000);
        assert_eq!(ramp.accel_steps_left, 400);
        assert_eq!(ramp.run_steps_left, 200);
        assert_eq!(ramp.decel_steps_left, 400);

        let intervals = drain(&mut ramp);
        assert_eq!(intervals.len(), 1000);
        for (i, &interval) in intervals[400..600].iter().enumerate() {
            assert_eq!(interval, 500_000, "cruise interval wrong at {}", 400 + i);
        }
        assert!(intervals[399] > 500_000);
        assert!(intervals[600] > 500_000);
    }

    #[test]
    fn test_asymmetric_rates_split_by_ratio() {
        // twice the deceleration rate: the triangle splits 2:1
        let mut ramp = ramp(1_000_000, 1000, 500);
        // accel_lim = 500, decel_lim = 1000, so a 90-step move cannot cruise
        assert_eq!(ramp.prepare_move(90).unwrap(), 90);
        assert_eq!(ramp.decel_steps_left, 90 * 1000 / 1500);
        assert_eq!(ramp.accel_steps_left, 90 - 90 * 1000 / 1500);
        assert_eq!(ramp.run_steps_left, 0);
    }

    #[test]
    fn test_stop_from_partial_acceleration() {
        let mut ramp = ramp(500_000, 500, 500);
        ramp.prepare_move(CONTINUOUS_STEPS).unwrap();

        for _ in 0..51 {
            assert!(ramp.next_interval() > 0);
        }

        let expected = steps_needed(ramp.current_interval(), 500);
        let stop_steps = ramp.prepare_stop().unwrap();
        assert_eq!(stop_steps, expected);
        assert_eq!(stop_steps, 50);
        assert_eq!(ramp.accel_steps_left, 0);
        assert_eq!(ramp.run_steps_left, 0);

        let intervals = drain(&mut ramp);
        assert_eq!(intervals.len(), 50);
        for i in 0..intervals.len() - 1 {
            assert!(intervals[i + 1] >= intervals[i]);
        }
    }

    #[test]
    fn test_stop_at_rest_is_immediate() {
        let mut ramp = ramp(1_000_000, 500, 500);
        assert_eq!(ramp.prepare_stop().unwrap(), 0);
        assert_eq!(ramp.next_interval(), 0);
    }

    #[test]
    fn test_replan_to_slower_cruise_pre_decelerates() {
        let mut ramp = ramp(500_000, 5000, 5000);
        ramp.prepare_move(CONTINUOUS_STEPS).unwrap();
        // run well into the cruise phase
        for _ in 0..500 {
            ramp.next_interval();
        }
        assert_eq!(ramp.current_interval(), 500_000);

        // replan to half the speed: the ramp slows down first
        ramp.profile.interval_ns = 1_000_000;
        ramp.prepare_move(600).unwrap();
        assert!(ramp.pre_decel_steps_left > 0);
        assert_eq!(ramp.accel_steps_left, 0);

        // pre-deceleration raises the interval monotonically onto the new
        // cruise speed (the discrete curve lands within 1% of it)
        let mut previous = ramp.current_interval();
        while ramp.pre_decel_steps_left > 0 {
            let interval = ramp.next_interval();
            assert!(interval >= previous);
            previous = interval;
        }
        assert!(previous > 900_000 && previous < 1_010_000);
        // the cruise phase then runs exactly at the new target interval
        assert_eq!(ramp.next_interval(), 1_000_000);
    }

    #[test]
    fn test_reset_returns_to_rest() {
        let mut ramp = ramp(1_000_000, 500, 500);
        ramp.prepare_move(100).unwrap();
        ramp.next_interval();
        assert!(ramp.current_interval() > 0);

        ramp.reset();
        assert_eq!(ramp.current_interval(), 0);
        assert_eq!(ramp.next_interval(), 0);
    }
}
