//! Shared test fixtures: a recording step device and tick-driving helpers.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use stepper_control::{
    Direction, MotionController, Result, SimTimingSource, StepDevice, StepperEvent,
    TimingSource,
};

/// Step device that records every emitted step.
#[derive(Debug, Default)]
pub struct MockStepper {
    pub steps: Vec<Direction>,
    pub enabled: bool,
}

impl MockStepper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn steps_in(&self, direction: Direction) -> usize {
        self.steps.iter().filter(|&&d| d == direction).count()
    }
}

impl StepDevice for MockStepper {
    fn enable(&mut self) -> Result<()> {
        self.enabled = true;
        Ok(())
    }

    fn disable(&mut self) -> Result<()> {
        self.enabled = false;
        Ok(())
    }

    fn step(&mut self, direction: Direction) -> Result<()> {
        self.steps.push(direction);
        Ok(())
    }
}

pub type Events = Rc<RefCell<Vec<StepperEvent>>>;
pub type TestController =
    MotionController<MockStepper, SimTimingSource, Box<dyn FnMut(StepperEvent)>>;

/// Build a controller on the simulated timing source with an event recorder
/// attached.
pub fn controller_with_events() -> (TestController, Events) {
    let events: Events = Rc::new(RefCell::new(Vec::new()));
    let mut controller: TestController =
        MotionController::new(MockStepper::new(), SimTimingSource::new()).unwrap();

    let sink = events.clone();
    controller.set_event_callback(Box::new(move |event| sink.borrow_mut().push(event)));

    (controller, events)
}

/// Fire ticks until the timing source disarms. Returns the tick count.
pub fn drive_to_completion(controller: &mut TestController) -> usize {
    let mut ticks = 0;
    while controller.timing_source().interval() > 0 {
        controller.handle_tick();
        ticks += 1;
        assert!(ticks < 10_000_000, "runaway motion");
    }
    ticks
}

/// Fire exactly `count` ticks, asserting the timer stays armed throughout.
pub fn drive_ticks(controller: &mut TestController, count: usize) {
    for i in 0..count {
        assert!(
            controller.timing_source().interval() > 0,
            "timer disarmed after {} of {} ticks",
            i,
            count
        );
        controller.handle_tick();
    }
}
