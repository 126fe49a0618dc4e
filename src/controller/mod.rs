//! Motion controller.
//!
//! Owns position, direction, the relative target and the bound ramp, and
//! orchestrates the timing source and step device: on each tick it commands
//! one micro-step, updates position, asks the ramp for the next interval and
//! re-arms the timer until the move completes.
//!
//! # Concurrency
//!
//! The API is `&mut self`; exclusion between thread-context mutators and the
//! tick (which typically fires in interrupt context on embedded targets) is
//! provided by the embedding, e.g. by placing the controller in a
//! `critical_section::Mutex<RefCell<...>>` and taking the critical section in
//! both paths. A tick dispatched after the plan was cleared is ignored, so a
//! mutator that committed first always wins.

use log::{debug, error};

use crate::device::{Direction, StepDevice, StepperEvent};
use crate::error::{Error, InvalidArgument, Result};
use crate::ramp::{Ramp, RampGenerator, RampProfile, CONTINUOUS_STEPS};
use crate::timing::TimingSource;

/// Current state of the motion controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionState {
    /// No motion planned.
    Idle,
    /// Executing a finite move.
    RunningFinite,
    /// Running continuously until stopped.
    RunningInfinite,
    /// Decelerating to rest after a stop request.
    Decelerating,
    /// Decelerating to rest before starting a move in the opposite
    /// direction.
    Reversing,
}

/// Is the relative target one of the infinite-run markers?
#[inline]
fn is_sentinel(target: i32) -> bool {
    target == i32::MAX || target == i32::MIN
}

/// Motion controller for one stepper motor.
///
/// Generic over:
/// - `D`: the hardware stepper backend (must implement [`StepDevice`])
/// - `T`: the countdown timer driving ticks (must implement [`TimingSource`])
/// - `F`: the event subscriber (defaults to a plain function pointer so the
///   type stays nameable in statics; a capturing closure carries its own
///   user data)
pub struct MotionController<D, T, F = fn(StepperEvent)>
where
    D: StepDevice,
    T: TimingSource,
    F: FnMut(StepperEvent),
{
    device: D,
    timing: T,

    /// Absolute position in micro-steps, ±1 per emitted step.
    position: i32,

    /// Direction of the steps currently being emitted.
    direction: Direction,

    /// Steps remaining in the commanded move, counted down toward 0 by the
    /// tick path. `i32::MAX`/`i32::MIN` mark continuous runs and are never
    /// decremented.
    relative_target: i32,

    ramp: Option<Ramp>,
    state: MotionState,
    enabled: bool,
    event_callback: Option<F>,
}

impl<D, T, F> MotionController<D, T, F>
where
    D: StepDevice,
    T: TimingSource,
    F: FnMut(StepperEvent),
{
    /// Create a controller bound to a step device and timing source.
    ///
    /// The controller starts disabled with position 0 and direction
    /// positive; call [`enable`](Self::enable) before commanding motion.
    pub fn new(device: D, mut timing: T) -> Result<Self> {
        timing.init()?;

        Ok(Self {
            device,
            timing,
            position: 0,
            direction: Direction::Positive,
            relative_target: 0,
            ramp: None,
            state: MotionState::Idle,
            enabled: false,
            event_callback: None,
        })
    }

    /// Get the underlying step device.
    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Get the underlying step device mutably.
    #[inline]
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Get the timing source.
    #[inline]
    pub fn timing_source(&self) -> &T {
        &self.timing
    }

    /// Current absolute position in micro-steps.
    ///
    /// May be read without external locking; the value can be stale by at
    /// most one tick.
    #[inline]
    pub fn position(&self) -> i32 {
        self.position
    }

    /// Replace the position counter. Has no motion side effect.
    pub fn set_position(&mut self, position: i32) {
        self.position = position;
    }

    /// True iff a move is in progress.
    #[inline]
    pub fn is_moving(&self) -> bool {
        self.relative_target != 0
    }

    /// Current controller state.
    #[inline]
    pub fn state(&self) -> MotionState {
        self.state
    }

    /// Bind the ramp used by subsequent moves.
    pub fn set_ramp(&mut self, profile: &RampProfile) -> Result<()> {
        self.ramp = Some(Ramp::from_profile(profile)?);
        Ok(())
    }

    /// Subscribe to motion and hardware events. Replaces any previous
    /// subscriber.
    pub fn set_event_callback(&mut self, callback: F) {
        self.event_callback = Some(callback);
    }

    /// Remove the event subscriber.
    pub fn clear_event_callback(&mut self) {
        self.event_callback = None;
    }

    /// Energize the coils. Does not move the motor.
    pub fn enable(&mut self) -> Result<()> {
        self.device.enable()?;
        self.enabled = true;
        Ok(())
    }

    /// De-energize the coils and cancel any in-flight motion.
    ///
    /// The plan is discarded immediately: the timer is disarmed, the target
    /// zeroed and the next mutator observes an idle controller. Position may
    /// be out of sync with physical reality afterwards.
    pub fn disable(&mut self) -> Result<()> {
        self.device.disable()?;
        self.enabled = false;

        if let Err(e) = self.timing.stop() {
            error!("failed to stop timing source: {}", e);
        }
        if let Some(ramp) = self.ramp.as_mut() {
            ramp.reset();
        }
        self.relative_target = 0;
        self.state = MotionState::Idle;
        Ok(())
    }

    /// Plan a finite relative move of `|micro_steps|` steps in the sign
    /// direction. Non-blocking; completion is signalled by
    /// [`StepperEvent::StepsCompleted`].
    ///
    /// A move against the current direction first decelerates to rest, then
    /// reverses. A move of 0 steps completes immediately.
    pub fn move_by(&mut self, micro_steps: i32) -> Result<()> {
        if !self.enabled {
            return Err(Error::Canceled);
        }
        let Some(ramp) = self.ramp.as_mut() else {
            return Err(Error::NotReady);
        };

        debug!("moving by {} microsteps", micro_steps);

        let direction = Direction::from_steps(micro_steps);

        if self.timing.interval() != 0 && self.direction != direction {
            // moving in the opposite direction: decelerate to rest, the
            // tick handler starts the reversed move once the ramp runs dry
            let stop_steps = ramp.prepare_stop()?;
            if stop_steps > 0 {
                self.relative_target = accumulate_target(self.relative_target, micro_steps);
                self.state = MotionState::Reversing;

                let interval = ramp.next_interval();
                if let Err(e) = self.timing.start(interval) {
                    error!("failed to start timing source: {}", e);
                    return Err(e);
                }
                return Ok(());
            }
            // the stop was immediate, fall through into the new move
        }

        let planned = ramp.prepare_move(micro_steps.unsigned_abs())?;
        self.relative_target = accumulate_target(self.relative_target, micro_steps);

        debug!("movement steps count: {}", planned);

        if planned > 0 {
            self.direction = direction;
            self.state = MotionState::RunningFinite;

            let interval = ramp.next_interval();
            if let Err(e) = self.timing.start(interval) {
                error!("failed to start timing source: {}", e);
                return Err(e);
            }
        } else {
            debug!("motion completed");
            self.relative_target = 0;
            self.state = MotionState::Idle;
            self.emit(StepperEvent::StepsCompleted);
        }

        Ok(())
    }

    /// Move to an absolute position in micro-steps.
    pub fn move_to(&mut self, position: i32) -> Result<()> {
        let delta = position as i64 - self.position as i64;
        let micro_steps =
            i32::try_from(delta).map_err(|_| InvalidArgument::TargetOutOfRange)?;
        self.move_by(micro_steps)
    }

    /// Run continuously in the given direction until stopped.
    pub fn run(&mut self, direction: Direction) -> Result<()> {
        if !self.enabled {
            return Err(Error::Canceled);
        }
        let Some(ramp) = self.ramp.as_mut() else {
            return Err(Error::NotReady);
        };

        let sentinel = match direction {
            Direction::Positive => i32::MAX,
            Direction::Negative => i32::MIN,
        };

        if self.timing.interval() != 0 && self.direction != direction {
            let stop_steps = ramp.prepare_stop()?;
            if stop_steps > 0 {
                self.relative_target = sentinel;
                self.state = MotionState::Reversing;

                let interval = ramp.next_interval();
                if let Err(e) = self.timing.start(interval) {
                    error!("failed to start timing source: {}", e);
                    return Err(e);
                }
                return Ok(());
            }
        }

        ramp.prepare_move(CONTINUOUS_STEPS)?;
        self.relative_target = sentinel;
        self.direction = direction;
        self.state = MotionState::RunningInfinite;

        let interval = ramp.next_interval();
        if let Err(e) = self.timing.start(interval) {
            error!("failed to start timing source: {}", e);
            return Err(e);
        }
        Ok(())
    }

    /// Decelerate to rest using the bound ramp. Returns immediately;
    /// [`StepperEvent::Stopped`] is emitted when the motor is at rest.
    pub fn stop(&mut self) -> Result<()> {
        let Some(ramp) = self.ramp.as_mut() else {
            // nothing was ever planned; just make sure the timer is quiet
            if let Err(e) = self.timing.stop() {
                error!("failed to stop timing source: {}", e);
            }
            self.relative_target = 0;
            self.state = MotionState::Idle;
            self.emit(StepperEvent::Stopped);
            return Ok(());
        };

        let decel_steps = ramp.prepare_stop()?;

        if decel_steps > 0 {
            let steps = decel_steps.min(CONTINUOUS_STEPS - 1) as i32;
            self.relative_target = match self.direction {
                Direction::Positive => steps,
                Direction::Negative => -steps,
            };
            self.state = MotionState::Decelerating;

            let interval = ramp.next_interval();
            if let Err(e) = self.timing.start(interval) {
                error!("failed to start timing source: {}", e);
                return Err(e);
            }
        } else {
            if let Err(e) = self.timing.stop() {
                error!("failed to stop timing source: {}", e);
            }
            self.relative_target = 0;
            self.state = MotionState::Idle;
            self.emit(StepperEvent::Stopped);
        }

        Ok(())
    }

    /// Forward a hardware event (stall, end stop, fault) to the subscriber.
    ///
    /// The embedding wires the step device's event output to this method;
    /// events pass through unchanged.
    pub fn notify_hardware_event(&mut self, event: StepperEvent) {
        self.emit(event);
    }

    /// Advance the motion by one tick. Invoked by the embedding when the
    /// timing source's countdown elapses.
    ///
    /// Emits one micro-step, updates position and target, and re-arms the
    /// timer with the ramp's next interval. When the ramp is exhausted the
    /// timer is disarmed and either a queued/reversed move is started or a
    /// completion event is emitted.
    pub fn handle_tick(&mut self) {
        if self.state == MotionState::Idle {
            // plan was cleared after this tick was dispatched
            return;
        }
        let Some(ramp) = self.ramp.as_mut() else {
            return;
        };

        if let Err(e) = self.device.step(self.direction) {
            error!("failed to step: {}", e);
        }

        let delta = self.direction.delta();
        self.position = self.position.wrapping_add(delta);
        if !is_sentinel(self.relative_target) {
            self.relative_target = self.relative_target.wrapping_sub(delta);
        }

        let next_interval = ramp.next_interval();

        if next_interval > 0 {
            // movement is not finished yet
            if let Err(e) = self.timing.start(next_interval) {
                error!("failed to start timing source: {}", e);
            }
            return;
        }

        if let Err(e) = self.timing.stop() {
            error!("failed to stop timing source: {}", e);
        }

        if self.relative_target != 0 {
            // a queued or reversed move is pending: turn toward the target
            // and keep going
            let direction = Direction::from_steps(self.relative_target);
            let steps = if is_sentinel(self.relative_target) {
                CONTINUOUS_STEPS
            } else {
                self.relative_target.unsigned_abs()
            };

            match ramp.prepare_move(steps) {
                Ok(planned) if planned > 0 => {
                    self.direction = direction;
                    self.state = if is_sentinel(self.relative_target) {
                        MotionState::RunningInfinite
                    } else {
                        MotionState::RunningFinite
                    };

                    let interval = ramp.next_interval();
                    if let Err(e) = self.timing.start(interval) {
                        error!("failed to start timing source: {}", e);
                    }
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    error!("failed to plan queued move: {}", e);
                }
            }
        }

        debug!("motion completed");
        let event = if self.state == MotionState::Decelerating {
            StepperEvent::Stopped
        } else {
            StepperEvent::StepsCompleted
        };
        self.relative_target = 0;
        self.state = MotionState::Idle;
        self.emit(event);
    }

    fn emit(&mut self, event: StepperEvent) {
        if let Some(callback) = self.event_callback.as_mut() {
            callback(event);
        }
    }
}

/// Fold a new relative move into the outstanding target. A sentinel target
/// (continuous run) is replaced rather than accumulated.
fn accumulate_target(target: i32, micro_steps: i32) -> i32 {
    if is_sentinel(target) {
        micro_steps
    } else {
        target.saturating_add(micro_steps)
    }
}
