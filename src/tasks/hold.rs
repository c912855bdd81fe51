//! Hold still for a duration; fail on aggressive motion or early release.

use log::{debug, warn};

use super::{Task, TaskKind, TaskOutcome};
use crate::clock::{FrameTime, Stopwatch};
use crate::config::{HoldCompletion, HoldConfig};
use crate::error::{ConfigError, FailReason};
use crate::gestures::{Classification, GestureValidator};
use crate::input::InputEvent;
use crate::tracker::TaskRuntimeState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldPhase {
    Idle,
    Holding,
    Succeeded,
    Failed,
}

#[derive(Debug)]
pub struct HoldTask {
    validator: GestureValidator,
    required: f32,
    completion: HoldCompletion,
    timer: Stopwatch,
    state: TaskRuntimeState,
    phase: HoldPhase,
}

impl HoldTask {
    pub fn new(cfg: HoldConfig) -> Result<Self, ConfigError> {
        cfg.gesture.validate()?;
        let required = cfg.gesture.require_duration()?;
        Ok(Self {
            validator: GestureValidator::new(cfg.gesture),
            required,
            completion: cfg.completion,
            timer: Stopwatch::new(cfg.clock),
            state: TaskRuntimeState::new(),
            phase: HoldPhase::Idle,
        })
    }

    pub fn phase(&self) -> HoldPhase {
        self.phase
    }

    pub fn elapsed(&self) -> f32 {
        self.timer.elapsed()
    }

    pub fn smoothed_speed(&self) -> f32 {
        self.state.smoothed_speed
    }

    fn succeed(&mut self) -> Option<TaskOutcome> {
        debug!("hold complete after {:.2}s", self.timer.elapsed());
        self.phase = HoldPhase::Succeeded;
        self.timer.stop();
        self.state.end_motion();
        self.state.set_progress(1.0);
        Some(TaskOutcome::Succeeded)
    }

    fn fail(&mut self, reason: FailReason) -> Option<TaskOutcome> {
        warn!("hold failed after {:.2}s: {reason}", self.timer.elapsed());
        self.phase = HoldPhase::Failed;
        self.timer.reset();
        self.state.reset();
        Some(TaskOutcome::Failed(reason))
    }
}

impl Task for HoldTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Hold
    }

    fn on_input(&mut self, ev: &InputEvent) -> Option<TaskOutcome> {
        match (*ev, self.phase) {
            (InputEvent::PointerDown(s), HoldPhase::Idle) if s.is_finite() => {
                self.phase = HoldPhase::Holding;
                self.timer.start();
                self.state.begin_motion(s);
                self.state.set_progress(0.0);
                None
            }
            (InputEvent::PointerMove(s), HoldPhase::Holding) => {
                let reading = self.validator.classify_motion(&mut self.state, s)?;
                if reading.classification == Classification::Aggressive {
                    return self.fail(FailReason::TooFast);
                }
                None
            }
            (InputEvent::PointerUp(_), HoldPhase::Holding) => {
                if self.timer.reached(self.required) {
                    self.succeed()
                } else {
                    self.fail(FailReason::ReleasedEarly)
                }
            }
            _ => None,
        }
    }

    fn tick(&mut self, frame: FrameTime) -> Option<TaskOutcome> {
        if self.phase != HoldPhase::Holding {
            return None;
        }
        let elapsed = self.timer.tick(frame);
        self.state.set_progress(elapsed / self.required);
        if self.completion == HoldCompletion::Tick && self.timer.reached(self.required) {
            return self.succeed();
        }
        None
    }

    fn progress(&self) -> f32 {
        self.state.progress()
    }

    fn engaged(&self) -> bool {
        self.phase == HoldPhase::Holding
    }

    fn suspend(&mut self) {
        // an interrupted hold cannot continue; the player presses again afterwards
        if self.phase == HoldPhase::Holding {
            self.timer.reset();
            self.state.reset();
            self.phase = HoldPhase::Idle;
        }
    }

    fn resume(&mut self) {}

    fn reset_state(&mut self) {
        self.phase = HoldPhase::Idle;
        self.timer.reset();
        self.state.reset();
    }
}
