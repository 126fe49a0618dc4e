//! Finite trapezoidal move driven entirely on the simulated timing source.
//!
//! Run with: `cargo run --example basic_move`

use stepper_control::{
    Direction, MotionController, RampProfile, Result, SimTimingSource, StepDevice,
    StepperEvent, TimingSource, TrapezoidalProfile,
};

/// Stepper backend that only counts: stands in for real hardware.
#[derive(Default)]
struct CountingStepper {
    steps: u32,
}

impl StepDevice for CountingStepper {
    fn enable(&mut self) -> Result<()> {
        Ok(())
    }

    fn disable(&mut self) -> Result<()> {
        Ok(())
    }

    fn step(&mut self, _direction: Direction) -> Result<()> {
        self.steps += 1;
        Ok(())
    }
}

fn main() -> Result<()> {
    let mut controller =
        MotionController::new(CountingStepper::default(), SimTimingSource::new())?;

    controller.set_ramp(&RampProfile::Trapezoidal(TrapezoidalProfile {
        interval_ns: 500_000,
        acceleration_rate: 5_000,
        deceleration_rate: 5_000,
    }))?;
    controller.set_event_callback(|event: StepperEvent| println!("event: {:?}", event));
    controller.enable()?;

    println!("moving by 1000 micro-steps");
    controller.move_by(1000)?;

    // play the timer hardware: fire the tick whenever the countdown is armed
    while controller.timing_source().interval() > 0 {
        controller.handle_tick();
    }

    println!(
        "done: position={} steps_emitted={} elapsed={} ms",
        controller.position(),
        controller.device().steps,
        controller.timing_source().now_ns() / 1_000_000
    );

    Ok(())
}
