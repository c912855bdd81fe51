//! Gesture tasks: one state machine per kind of patience gesture.

pub mod cadence;
pub mod calm;
pub mod capture;
pub mod hold;

pub use cadence::{CadencePhase, CadenceTask};
pub use calm::{CalmPhase, CalmTask};
pub use capture::{CapturePhase, CaptureTask};
pub use hold::{HoldPhase, HoldTask};

use serde::Serialize;
use std::fmt;

use crate::clock::FrameTime;
use crate::config::TaskConfig;
use crate::error::{ConfigError, FailReason};
use crate::input::InputEvent;

/// Position of a task in its sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TaskId(pub usize);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Hold,
    Cadence,
    Capture,
    Calm,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Hold => "hold",
            TaskKind::Cadence => "cadence",
            TaskKind::Capture => "capture",
            TaskKind::Calm => "calm",
        }
    }
}

/// What a task reports back after an input or a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// A pass of a multi-pass task filled up; `pass` is the next one.
    PassCleared { pass: usize },
    Succeeded,
    Failed(FailReason),
    EscalationRequested,
}

pub trait Task: fmt::Debug {
    fn kind(&self) -> TaskKind;

    /// Called when the task becomes the active stage.
    fn activate(&mut self) {}

    fn on_input(&mut self, ev: &InputEvent) -> Option<TaskOutcome>;

    fn tick(&mut self, frame: FrameTime) -> Option<TaskOutcome>;

    /// Completion in [0, 1].
    fn progress(&self) -> f32;

    /// True while the player is mid-gesture (holding, clicking, calming).
    fn engaged(&self) -> bool;

    /// Freeze for an escalation: drop any in-progress hold and remember the phase.
    fn suspend(&mut self);

    /// Return to the phase saved by [`Task::suspend`].
    fn resume(&mut self);

    /// Back to the initial state; safe to call at any point.
    fn reset_state(&mut self);

    /// Name of the current pass for multi-pass tasks.
    fn pass_name(&self) -> Option<&str> {
        None
    }
}

/// Build the task described by a stage's configuration.
pub fn build(cfg: &TaskConfig) -> Result<Box<dyn Task>, ConfigError> {
    Ok(match cfg {
        TaskConfig::Hold(c) => Box::new(HoldTask::new(c.clone())?),
        TaskConfig::Cadence(c) => Box::new(CadenceTask::new(c.clone())?),
        TaskConfig::Capture(c) => Box::new(CaptureTask::new(c.clone())?),
        TaskConfig::Calm(c) => Box::new(CalmTask::new(c.clone())?),
    })
}
