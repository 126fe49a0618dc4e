//! Continuous run followed by a decelerated stop.
//!
//! Run with: `cargo run --example run_and_stop`

use stepper_control::{
    Direction, MotionController, RampProfile, Result, SimTimingSource, StepDevice,
    StepperEvent, TimingSource, TrapezoidalProfile,
};

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
        interval_ns: 250_000,
        acceleration_rate: 10_000,
        deceleration_rate: 10_000,
    }))?;
    controller.set_event_callback(|event: StepperEvent| println!("event: {:?}", event));
    controller.enable()?;

    println!("running continuously in the positive direction");
    controller.run(Direction::Positive)?;

    // let it accelerate to cruise and run for a while
    for _ in 0..2000 {
        controller.handle_tick();
    }
    println!(
        "at position {} after {} ms, stopping",
        controller.position(),
        controller.timing_source().now_ns() / 1_000_000
    );

    controller.stop()?;
    while controller.timing_source().interval() > 0 {
        controller.handle_tick();
    }

    println!(
        "stopped: position={} steps_emitted={} elapsed={} ms",
        controller.position(),
        controller.device().steps,
        controller.timing_source().now_ns() / 1_000_000
    );

    Ok(())
}
