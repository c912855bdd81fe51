//! Click near an ideal rhythm until the progress bar fills, pass after pass.

use log::{debug, info};

use super::{Task, TaskKind, TaskOutcome};
use crate::clock::FrameTime;
use crate::config::CadenceConfig;
use crate::error::ConfigError;
use crate::gestures::{Classification, GestureValidator};
use crate::input::InputEvent;
use crate::tracker::TaskRuntimeState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CadencePhase {
    Idle,
    Active,
    EscalationRequested,
    Succeeded,
}

#[derive(Debug)]
pub struct CadenceTask {
    validator: GestureValidator,
    good_delta: f32,
    bad_delta: f32,
    passes: Vec<String>,
    pass: usize,
    state: TaskRuntimeState,
    phase: CadencePhase,
    resume_to: Option<CadencePhase>,
}

impl CadenceTask {
    pub fn new(cfg: CadenceConfig) -> Result<Self, ConfigError> {
        cfg.gesture.validate()?;
        cfg.gesture.require_interval()?;
        if cfg.passes.is_empty() {
            return Err(ConfigError::Invalid {
                field: "passes",
                expected: "at least one pass",
                value: 0.0,
            });
        }
        Ok(Self {
            good_delta: cfg.gesture.good_progress_delta,
            bad_delta: cfg.gesture.bad_progress_delta,
            validator: GestureValidator::new(cfg.gesture),
            passes: cfg.passes,
            pass: 0,
            state: TaskRuntimeState::new(),
            phase: CadencePhase::Idle,
            resume_to: None,
        })
    }

    pub fn phase(&self) -> CadencePhase {
        self.phase
    }

    pub fn pass(&self) -> usize {
        self.pass
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    fn on_click(&mut self, t: f64) -> Option<TaskOutcome> {
        let class = self.validator.classify_click(&mut self.state, t)?;
        let delta = match class {
            Classification::Aggressive => {
                // keep the bar; only the spam window starts over
                self.state.clear_spam_history();
                self.phase = CadencePhase::EscalationRequested;
                return Some(TaskOutcome::EscalationRequested);
            }
            Classification::Good => self.good_delta,
            Classification::Bad => self.bad_delta,
        };
        let p = self.state.add_progress(delta);
        debug!("{:?} click at {t:.2}: pass {} at {p:.2}", class, self.pass);

        if !self.state.is_complete() {
            return None;
        }
        if self.pass + 1 < self.passes.len() {
            self.pass += 1;
            self.state.set_progress(0.0);
            self.state.clear_click_history();
            info!("cadence pass cleared, next: {}", self.passes[self.pass]);
            Some(TaskOutcome::PassCleared { pass: self.pass })
        } else {
            self.phase = CadencePhase::Succeeded;
            Some(TaskOutcome::Succeeded)
        }
    }
}

impl Task for CadenceTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Cadence
    }

    fn activate(&mut self) {
        if self.phase == CadencePhase::Idle {
            self.phase = CadencePhase::Active;
        }
    }

    fn on_input(&mut self, ev: &InputEvent) -> Option<TaskOutcome> {
        let InputEvent::Click { t } = *ev else {
            return None;
        };
        match self.phase {
            CadencePhase::Idle => {
                self.phase = CadencePhase::Active;
                self.on_click(t)
            }
            CadencePhase::Active => self.on_click(t),
            CadencePhase::EscalationRequested | CadencePhase::Succeeded => None,
        }
    }

    fn tick(&mut self, _frame: FrameTime) -> Option<TaskOutcome> {
        None
    }

    fn progress(&self) -> f32 {
        self.state.progress()
    }

    fn engaged(&self) -> bool {
        self.phase == CadencePhase::Active
    }

    fn suspend(&mut self) {
        let snapshot = match self.phase {
            CadencePhase::EscalationRequested => CadencePhase::Active,
            p => p,
        };
        self.resume_to = Some(snapshot);
        self.phase = CadencePhase::EscalationRequested;
    }

    fn resume(&mut self) {
        self.phase = self.resume_to.take().unwrap_or(CadencePhase::Active);
    }

    fn reset_state(&mut self) {
        self.pass = 0;
        self.state.reset();
        self.phase = CadencePhase::Idle;
        self.resume_to = None;
    }

    fn pass_name(&self) -> Option<&str> {
        self.passes.get(self.pass).map(String::as_str)
    }
}
