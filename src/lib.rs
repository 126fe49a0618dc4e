//! # stepper-control
//!
//! Tick-driven stepper motor motion control with pluggable velocity ramps.
//!
//! ## Features
//!
//! - **Integer-only timing**: step intervals come from the AVR446 integer
//!   recurrence with a carried remainder, deterministic across platforms and
//!   FPU-less targets
//! - **Pluggable ramps**: constant-velocity and trapezoidal generators
//!   behind a small [`RampGenerator`] interface
//! - **Non-blocking API**: mutators plan and arm a one-shot timer, motion
//!   proceeds on tick callbacks
//! - **Position tracking**: signed 32-bit micro-step counter kept exact
//!   across direction reversals, speed changes and stop requests
//! - **embedded-hal 1.0**: bundled STEP/DIR device using `OutputPin` and
//!   `DelayNs`
//! - **no_std compatible**: the core library works without the standard
//!   library
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stepper_control::{
//!     MotionController, RampProfile, StepDirStepper, TrapezoidalProfile,
//! };
//!
//! let device = StepDirStepper::new(step_pin, dir_pin, delay);
//! let mut controller = MotionController::new(device, timing_source)?;
//!
//! controller.set_ramp(&RampProfile::Trapezoidal(TrapezoidalProfile {
//!     interval_ns: 1_000_000,
//!     acceleration_rate: 5_000,
//!     deceleration_rate: 5_000,
//! }))?;
//!
//! controller.enable()?;
//! controller.move_by(3_200)?;
//! // arrange for controller.handle_tick() to run whenever the timing
//! // source's countdown elapses
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): TOML config loading and the simulated timing source
//! - `defmt`: defmt logging support for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

// Core modules
pub mod config;
pub mod controller;
pub mod device;
pub mod error;
pub mod ramp;
pub mod timing;

// Re-exports for ergonomic API
pub use config::{validate_config, ControllerConfig, RampKind, SystemConfig};
pub use controller::{MotionController, MotionState};
pub use device::{Direction, Microsteps, StepDevice, StepDirStepper, StepperEvent};
pub use error::{Error, InvalidArgument, Result};
pub use ramp::{
    ConstantProfile, ConstantRamp, Ramp, RampGenerator, RampProfile, TrapezoidalProfile,
    TrapezoidalRamp, CONTINUOUS_STEPS,
};
pub use timing::TimingSource;

// Configuration loading and simulation helpers (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};
#[cfg(feature = "std")]
pub use timing::SimTimingSource;
