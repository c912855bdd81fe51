//! Forced sub-challenges entered on spam or a struggle roll.
//!
//! Stillness: the player must not react until the countdown ends; a reaction
//! fails the whole sequence. Click quota: the player must click enough times
//! before the timer ends; running out fails only the current stage.

use log::{debug, info, warn};
use serde::Serialize;

use crate::clock::{ClockKind, Countdown, FrameTime};
use crate::config::EscalationConfig;
use crate::error::FailReason;
use crate::input::InputEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationKind {
    Stillness,
    ClickQuota,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", content = "reason", rename_all = "snake_case")]
pub enum EscalationOutcome {
    Survived,
    Failed(FailReason),
}

#[derive(Debug, Clone)]
enum Rule {
    Stillness { motion_counts: bool },
    ClickQuota { needed: u32, clicks: u32 },
}

#[derive(Debug, Clone)]
pub struct EscalationChallenge {
    rule: Rule,
    timer: Countdown,
}

impl EscalationChallenge {
    /// Start a challenge; the countdown is armed immediately.
    pub fn start(cfg: &EscalationConfig) -> Self {
        let (rule, clock, duration) = match *cfg {
            EscalationConfig::Stillness {
                countdown,
                clock,
                motion_counts,
            } => (Rule::Stillness { motion_counts }, clock, countdown),
            EscalationConfig::ClickQuota {
                duration,
                clicks_needed,
                clock,
            } => (
                Rule::ClickQuota {
                    needed: clicks_needed,
                    clicks: 0,
                },
                clock,
                duration,
            ),
        };
        let mut timer = Countdown::new(clock, duration);
        timer.start();
        Self { rule, timer }
    }

    pub fn kind(&self) -> EscalationKind {
        match self.rule {
            Rule::Stillness { .. } => EscalationKind::Stillness,
            Rule::ClickQuota { .. } => EscalationKind::ClickQuota,
        }
    }

    pub fn duration(&self) -> f32 {
        self.timer.duration()
    }

    pub fn remaining(&self) -> f32 {
        self.timer.remaining()
    }

    pub fn clock(&self) -> ClockKind {
        self.timer.clock()
    }

    pub fn clicks(&self) -> u32 {
        match self.rule {
            Rule::ClickQuota { clicks, .. } => clicks,
            Rule::Stillness { .. } => 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_armed()
    }

    pub fn cancel(&mut self) {
        self.timer.cancel();
    }

    pub fn on_input(&mut self, ev: &InputEvent) -> Option<EscalationOutcome> {
        if !self.timer.is_armed() {
            return None;
        }
        match &mut self.rule {
            Rule::Stillness { motion_counts } => {
                if ev.is_press() || *motion_counts {
                    warn!(
                        "{} during stillness with {:.2}s left",
                        ev.label(),
                        self.timer.remaining()
                    );
                    self.timer.cancel();
                    return Some(EscalationOutcome::Failed(FailReason::Panicked));
                }
                None
            }
            Rule::ClickQuota { needed, clicks } => {
                if !matches!(ev, InputEvent::Click { .. }) {
                    return None;
                }
                *clicks += 1;
                debug!("struggle click {clicks}/{needed}");
                if *clicks >= *needed {
                    info!("quota reached with {:.2}s left", self.timer.remaining());
                    self.timer.cancel();
                    return Some(EscalationOutcome::Survived);
                }
                None
            }
        }
    }

    pub fn tick(&mut self, frame: FrameTime) -> Option<EscalationOutcome> {
        if !self.timer.tick(frame) {
            return None;
        }
        match self.rule {
            Rule::Stillness { .. } => Some(EscalationOutcome::Survived),
            Rule::ClickQuota { needed, clicks } if clicks >= needed => {
                Some(EscalationOutcome::Survived)
            }
            Rule::ClickQuota { needed, clicks } => {
                warn!("struggle timed out at {clicks}/{needed} clicks");
                Some(EscalationOutcome::Failed(FailReason::TimeExpired))
            }
        }
    }
}
