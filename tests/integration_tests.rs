//! Integration tests: TOML configuration through to executed motion.

mod common;

use common::{controller_with_events, drive_to_completion};
use stepper_control::{
    parse_config, validate_config, Error, Microsteps, RampKind, RampProfile, StepperEvent,
};

const FULL_CONFIG: &str = r#"
[controllers.azimuth]
name = "Azimuth Drive"
ramp = "trapezoidal"
interval_ns = 500000
acceleration = 5000
deceleration = 5000
microsteps = 16

[controllers.focuser]
name = "Focuser"
ramp = "constant"
interval_ns = 1000000
invert_direction = true
"#;

#[test]
fn parse_full_config() {
    let config = parse_config(FULL_CONFIG).expect("config should parse");

    let azimuth = config.controller("azimuth").expect("azimuth should exist");
    assert_eq!(azimuth.name.as_str(), "Azimuth Drive");
    assert_eq!(azimuth.ramp, RampKind::Trapezoidal);
    assert_eq!(azimuth.interval_ns, 500_000);
    assert_eq!(azimuth.acceleration, 5000);
    assert_eq!(azimuth.microsteps, Microsteps::SIXTEENTH);

    let focuser = config.controller("focuser").expect("focuser should exist");
    assert_eq!(focuser.ramp, RampKind::Constant);
    assert!(focuser.invert_direction);
    // defaults for omitted fields
    assert_eq!(focuser.acceleration, 0);
    assert_eq!(focuser.microsteps, Microsteps::FULL);

    assert!(config.controller("nonexistent").is_none());
    assert!(config.require_controller("azimuth").is_ok());
    assert!(matches!(
        config.require_controller("nonexistent"),
        Err(Error::InvalidArgument(_))
    ));

    let names: Vec<_> = config.controller_names().collect();
    assert!(names.contains(&"azimuth"));
    assert!(names.contains(&"focuser"));
}

#[test]
fn invalid_microsteps_fail_to_parse() {
    let toml = r#"
[controllers.bad]
name = "Bad"
ramp = "constant"
interval_ns = 1000
microsteps = 3
"#;
    assert!(parse_config(toml).is_err());
}

#[test]
fn zero_rate_trapezoidal_fails_validation() {
    let toml = r#"
[controllers.bad]
name = "Bad"
ramp = "trapezoidal"
interval_ns = 1000
acceleration = 0
deceleration = 100
"#;
    let config: stepper_control::SystemConfig = toml::from_str(toml).unwrap();
    assert!(validate_config(&config).is_err());
    assert!(parse_config(toml).is_err());
}

#[test]
fn missing_config_file_is_io_error() {
    let result = stepper_control::load_config("/nonexistent/motion.toml");
    assert_eq!(result.unwrap_err(), Error::Io);
}

#[test]
fn configured_profile_drives_a_move() {
    let config = parse_config(FULL_CONFIG).unwrap();
    let profile = config.controller("azimuth").unwrap().ramp_profile().unwrap();
    assert!(matches!(profile, RampProfile::Trapezoidal(_)));

    let (mut controller, events) = controller_with_events();
    controller.set_ramp(&profile).unwrap();
    controller.enable().unwrap();

    controller.move_by(1000).unwrap();
    let ticks = drive_to_completion(&mut controller);

    assert_eq!(ticks, 1000);
    assert_eq!(controller.position(), 1000);
    assert_eq!(*events.borrow(), vec![StepperEvent::StepsCompleted]);
}

#[test]
fn constant_controller_config_moves_at_fixed_interval() {
    let config = parse_config(FULL_CONFIG).unwrap();
    let profile = config.controller("focuser").unwrap().ramp_profile().unwrap();

    let (mut controller, _events) = controller_with_events();
    controller.set_ramp(&profile).unwrap();
    controller.enable().unwrap();

    controller.move_by(-3).unwrap();
    drive_to_completion(&mut controller);

    assert_eq!(controller.position(), -3);
    assert_eq!(
        controller.timing_source().history(),
        &[1_000_000, 1_000_000, 1_000_000][..]
    );
}
