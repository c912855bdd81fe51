//! Outbound notifications for presentation and completion hooks.

use log::{info, warn};
use serde::Serialize;

use crate::error::FailReason;
use crate::escalation::{EscalationKind, EscalationOutcome};
use crate::tasks::TaskId;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Pushed after every tick and input that touched the active task.
    Progress { task: TaskId, value: f32 },
    StageStarted { task: TaskId, stage: String },
    /// A multi-pass task moved on to its next pass.
    PassAdvance { task: TaskId, pass: String },
    StageAdvance { task: TaskId, stage: String },
    /// A local failure; the stage is retried.
    StageFailed {
        task: TaskId,
        reason: FailReason,
        slips_remaining: u32,
    },
    SequenceFailed { reason: FailReason },
    SequenceRestarted,
    SequenceCompleted,
    EscalationStarted { kind: EscalationKind, duration: f32 },
    EscalationEnded { outcome: EscalationOutcome },
}

pub trait EventSink {
    fn emit(&mut self, event: EngineEvent);
}

/// Collects events in order; handy for hosts that drain once per frame.
impl EventSink for Vec<EngineEvent> {
    fn emit(&mut self, event: EngineEvent) {
        self.push(event);
    }
}

/// Writes every event through the `log` facade; progress is skipped.
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&mut self, event: EngineEvent) {
        match &event {
            EngineEvent::Progress { .. } => {}
            EngineEvent::StageFailed { .. } | EngineEvent::SequenceFailed { .. } => {
                warn!("{event:?}")
            }
            _ => info!("{event:?}"),
        }
    }
}
