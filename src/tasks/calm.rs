//! Anxiety meter: rises on its own, each click brings it down.

use log::{debug, warn};

use super::{Task, TaskKind, TaskOutcome};
use crate::clock::FrameTime;
use crate::config::CalmConfig;
use crate::error::{ConfigError, FailReason};
use crate::input::InputEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalmPhase {
    Idle,
    Calming,
    Succeeded,
    Failed,
}

#[derive(Debug)]
pub struct CalmTask {
    cfg: CalmConfig,
    anxiety: f32,
    /// Lowest anxiety reached since activation.
    lowest: f32,
    phase: CalmPhase,
    suspended: bool,
}

impl CalmTask {
    pub fn new(cfg: CalmConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            anxiety: cfg.initial,
            lowest: cfg.initial,
            cfg,
            phase: CalmPhase::Idle,
            suspended: false,
        })
    }

    pub fn phase(&self) -> CalmPhase {
        self.phase
    }

    /// Live meter in [0, 1].
    pub fn anxiety(&self) -> f32 {
        (self.anxiety / self.cfg.max).clamp(0.0, 1.0)
    }

    fn start(&mut self) {
        self.phase = CalmPhase::Calming;
        self.anxiety = self.cfg.initial;
        self.lowest = self.cfg.initial;
        self.suspended = false;
    }
}

impl Task for CalmTask {
    fn kind(&self) -> TaskKind {
        TaskKind::Calm
    }

    fn activate(&mut self) {
        if self.phase == CalmPhase::Idle {
            self.start();
        }
    }

    fn on_input(&mut self, ev: &InputEvent) -> Option<TaskOutcome> {
        if !matches!(ev, InputEvent::Click { .. }) || self.suspended {
            return None;
        }
        match self.phase {
            CalmPhase::Idle => self.start(),
            CalmPhase::Calming => {}
            CalmPhase::Succeeded | CalmPhase::Failed => return None,
        }
        self.anxiety -= self.cfg.relief_per_click;
        self.lowest = self.lowest.min(self.anxiety);
        debug!("calm click: anxiety {:.1}", self.anxiety);
        if self.anxiety <= 0.0 {
            self.anxiety = 0.0;
            self.phase = CalmPhase::Succeeded;
            return Some(TaskOutcome::Succeeded);
        }
        None
    }

    fn tick(&mut self, frame: FrameTime) -> Option<TaskOutcome> {
        if self.phase != CalmPhase::Calming || self.suspended {
            return None;
        }
        self.anxiety += self.cfg.rise_per_second * frame.delta(self.cfg.clock);
        if self.anxiety >= self.cfg.max {
            warn!("anxiety hit {:.0}", self.cfg.max);
            self.anxiety = self.cfg.max;
            self.phase = CalmPhase::Failed;
            return Some(TaskOutcome::Failed(FailReason::Overwhelmed));
        }
        None
    }

    fn progress(&self) -> f32 {
        if self.phase == CalmPhase::Succeeded {
            return 1.0;
        }
        ((self.cfg.initial - self.lowest) / self.cfg.initial).clamp(0.0, 1.0)
    }

    fn engaged(&self) -> bool {
        self.phase == CalmPhase::Calming && !self.suspended
    }

    fn suspend(&mut self) {
        self.suspended = true;
    }

    fn resume(&mut self) {
        self.suspended = false;
    }

    fn reset_state(&mut self) {
        self.phase = CalmPhase::Idle;
        self.anxiety = self.cfg.initial;
        self.lowest = self.cfg.initial;
        self.suspended = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ClockKind;

    fn calm() -> CalmTask {
        CalmTask::new(CalmConfig {
            initial: 30.0,
            max: 100.0,
            rise_per_second: 5.0,
            relief_per_click: 10.0,
            clock: ClockKind::Scaled,
        })
        .unwrap()
    }

    fn click(t: f64) -> InputEvent {
        InputEvent::Click { t }
    }

    #[test]
    fn three_quick_clicks_calm_down() {
        let mut task = calm();
        task.activate();
        assert_eq!(task.on_input(&click(0.0)), None);
        assert_eq!(task.on_input(&click(0.1)), None);
        assert!((task.progress() - 2.0 / 3.0).abs() < 1e-4);
        assert_eq!(task.on_input(&click(0.2)), Some(TaskOutcome::Succeeded));
        assert_eq!(task.progress(), 1.0);
        assert_eq!(task.anxiety(), 0.0);
    }

    #[test]
    fn idle_player_is_overwhelmed() {
        let mut task = calm();
        task.activate();
        // 30 + 5/s reaches 100 on the 14th second
        for _ in 0..13 {
            assert_eq!(task.tick(FrameTime::uniform(1.0)), None);
        }
        assert_eq!(
            task.tick(FrameTime::uniform(1.0)),
            Some(TaskOutcome::Failed(FailReason::Overwhelmed))
        );
        assert_eq!(task.phase(), CalmPhase::Failed);
    }

    #[test]
    fn progress_never_drops_while_anxiety_rises() {
        let mut task = calm();
        task.activate();
        task.on_input(&click(0.0));
        let p = task.progress();
        task.tick(FrameTime::uniform(3.0));
        assert!(task.anxiety() > 0.2);
        assert_eq!(task.progress(), p);
    }

    #[test]
    fn suspended_meter_is_frozen() {
        let mut task = calm();
        task.activate();
        task.suspend();
        assert_eq!(task.tick(FrameTime::uniform(100.0)), None);
        assert_eq!(task.on_input(&click(0.0)), None);
        assert!((task.anxiety() - 0.3).abs() < 1e-4);
        task.resume();
        assert!(task.engaged());
    }
}
