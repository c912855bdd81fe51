//! Single slow click to pick the subject up; a quick second click scares it off.

use log::warn;

use super::{Task, TaskKind, TaskOutcome};
use crate::clock::{Countdown, FrameTime};
use crate::config::CaptureConfig;
use crate::error::{ConfigError, FailReason};
use crate::input::InputEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    Idle,
    Confirming,
    Succeeded,
    Failed,
}

#[derive(Debug)]
pub struct CaptureTask {
    window: Countdown,
    phase: CapturePhase,
}

impl CaptureTask {
    pub fn new(cfg: CaptureConfig) -> Result<Self, ConfigError> {
        let window = ConfigError::positive("window", cfg.window)?;
        Ok(Self {
            window: Countdown::new(cfg.clock, window),
            phase: CapturePhase::Idle,
        })
    }

    pub fn phase(&self) -> CapturePhase {
        self.phase
    }
}

impl Task for CaptureTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Capture
    }

    fn on_input(&mut self, ev: &InputEvent) -> Option<TaskOutcome> {
        let InputEvent::Click { t } = *ev else {
            return None;
        };
        if !t.is_finite() {
            return None;
        }
        match self.phase {
            CapturePhase::Idle => {
                self.phase = CapturePhase::Confirming;
                self.window.start();
                None
            }
            CapturePhase::Confirming => {
                let into = self.window.duration() - self.window.remaining();
                warn!("second click {into:.2}s into the capture window");
                self.window.cancel();
                self.phase = CapturePhase::Failed;
                Some(TaskOutcome::Failed(FailReason::DoubleClick))
            }
            CapturePhase::Succeeded | CapturePhase::Failed => None,
        }
    }

    fn tick(&mut self, frame: FrameTime) -> Option<TaskOutcome> {
        if self.phase == CapturePhase::Confirming && self.window.tick(frame) {
            self.phase = CapturePhase::Succeeded;
            return Some(TaskOutcome::Succeeded);
        }
        None
    }

    fn progress(&self) -> f32 {
        match self.phase {
            CapturePhase::Confirming => 1.0 - self.window.remaining() / self.window.duration(),
            CapturePhase::Succeeded => 1.0,
            CapturePhase::Idle | CapturePhase::Failed => 0.0,
        }
    }

    fn engaged(&self) -> bool {
        self.phase == CapturePhase::Confirming
    }

    fn suspend(&mut self) {
        if self.phase == CapturePhase::Confirming {
            self.window.cancel();
            self.phase = CapturePhase::Idle;
        }
    }

    fn resume(&mut self) {}

    fn reset_state(&mut self) {
        self.window.cancel();
        self.phase = CapturePhase::Idle;
    }
}
