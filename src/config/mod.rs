//! Configuration for stepper-control.
//!
//! Controllers are described in TOML (with the `std` feature) or built from
//! pre-parsed data: each named controller selects a ramp type, a cruise
//! interval and, for trapezoidal ramps, acceleration and deceleration rates.
//!
//! ```toml
//! [controllers.azimuth]
//! name = "Azimuth Drive"
//! ramp = "trapezoidal"
//! interval_ns = 1000000
//! acceleration = 5000
//! deceleration = 5000
//! microsteps = 16
//! ```

#[cfg(feature = "std")]
mod loader;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

use heapless::{FnvIndexMap, String};
use serde::Deserialize;

use crate::device::Microsteps;
use crate::error::{Error, InvalidArgument, Result};
use crate::ramp::{ConstantProfile, RampProfile, TrapezoidalProfile};

/// Ramp generator selection in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RampKind {
    /// Fixed step interval, no acceleration.
    Constant,
    /// Trapezoidal velocity profile.
    Trapezoidal,
}

/// Configuration of one motion controller.
#[derive(Debug, Clone, Deserialize)]
pub struct ControllerConfig {
    /// Human-readable name (max 32 chars).
    pub name: String<32>,

    /// Ramp generator to bind.
    pub ramp: RampKind,

    /// Cruise interval between steps in nanoseconds.
    pub interval_ns: u64,

    /// Acceleration rate in steps/s² (trapezoidal only).
    #[serde(default)]
    pub acceleration: u32,

    /// Deceleration rate in steps/s² (trapezoidal only).
    #[serde(default)]
    pub deceleration: u32,

    /// Micro-step resolution to program into the device.
    #[serde(default)]
    pub microsteps: Microsteps,

    /// Invert direction pin logic.
    #[serde(default)]
    pub invert_direction: bool,
}

impl ControllerConfig {
    /// Build the validated ramp profile this configuration describes.
    pub fn ramp_profile(&self) -> Result<RampProfile> {
        let profile = match self.ramp {
            RampKind::Constant => RampProfile::Constant(ConstantProfile {
                interval_ns: self.interval_ns,
            }),
            RampKind::Trapezoidal => RampProfile::Trapezoidal(TrapezoidalProfile {
                interval_ns: self.interval_ns,
                acceleration_rate: self.acceleration,
                deceleration_rate: self.deceleration,
            }),
        };
        profile.validate()?;
        Ok(profile)
    }
}

/// Root configuration structure from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    /// Named controller configurations.
    pub controllers: FnvIndexMap<String<32>, ControllerConfig, 8>,
}

impl SystemConfig {
    /// Get a controller configuration by name.
    pub fn controller(&self, name: &str) -> Option<&ControllerConfig> {
        self.controllers
            .iter()
            .find(|(k, _)| k.as_str() == name)
            .map(|(_, v)| v)
    }

    /// Get a controller configuration by name, or an error naming the miss.
    pub fn require_controller(&self, name: &str) -> Result<&ControllerConfig> {
        self.controller(name).ok_or_else(|| {
            Error::InvalidArgument(InvalidArgument::ControllerNotFound(
                String::try_from(name).unwrap_or_default(),
            ))
        })
    }

    /// List all controller names.
    pub fn controller_names(&self) -> impl Iterator<Item = &str> {
        self.controllers.keys().map(|s| s.as_str())
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            controllers: FnvIndexMap::new(),
        }
    }
}

/// Validate every controller in a configuration.
///
/// Checks that each described ramp profile is well-formed (non-zero interval
/// and, for trapezoidal ramps, non-zero rates).
pub fn validate_config(config: &SystemConfig) -> Result<()> {
    for (_, controller) in config.controllers.iter() {
        controller.ramp_profile()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, InvalidArgument};

    fn config(ramp: RampKind, acceleration: u32) -> ControllerConfig {
        ControllerConfig {
            name: String::try_from("test").unwrap(),
            ramp,
            interval_ns: 1_000_000,
            acceleration,
            deceleration: acceleration,
            microsteps: Microsteps::FULL,
            invert_direction: false,
        }
    }

    #[test]
    fn test_constant_profile_ignores_rates() {
        let profile = config(RampKind::Constant, 0).ramp_profile().unwrap();
        assert_eq!(
            profile,
            RampProfile::Constant(ConstantProfile {
                interval_ns: 1_000_000
            })
        );
    }

    #[test]
    fn test_trapezoidal_profile_requires_rates() {
        assert!(config(RampKind::Trapezoidal, 5000).ramp_profile().is_ok());
        assert_eq!(
            config(RampKind::Trapezoidal, 0).ramp_profile(),
            Err(Error::InvalidArgument(
                InvalidArgument::ZeroAccelerationRate
            ))
        );
    }

    #[test]
    fn test_validate_config_flags_bad_controller() {
        let mut system = SystemConfig::default();
        let _ = system.controllers.insert(
            String::try_from("ok").unwrap(),
            config(RampKind::Constant, 0),
        );
        assert!(validate_config(&system).is_ok());

        let _ = system.controllers.insert(
            String::try_from("bad").unwrap(),
            config(RampKind::Trapezoidal, 0),
        );
        assert!(validate_config(&system).is_err());
    }
}
