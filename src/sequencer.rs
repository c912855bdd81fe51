//! Runs an ordered list of gesture tasks as one activity.
//!
//! The sequencer owns the only mutable session state: which stage is active,
//! the shared slip budget, any running escalation and the restart timer.
//! Everything happens inside [`StageSequencer::tick`] and
//! [`StageSequencer::handle_input`]; nothing runs in the background.

use log::{debug, info, warn};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;
use std::collections::HashSet;

use crate::clock::{ClockKind, Countdown, FrameTime};
use crate::config::{DEFAULT_RESTART_DELAY, EscalationConfig, Profile, validate_profile};
use crate::error::{ConfigError, FailCategory, FailReason};
use crate::escalation::{EscalationChallenge, EscalationOutcome};
use crate::events::{EngineEvent, EventSink};
use crate::input::InputEvent;
use crate::tasks::{self, Task, TaskId, TaskOutcome};

/// Failures forgiven before the next one restarts everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlipBudget {
    allowed: u32,
    remaining: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlipVerdict {
    Forgiven { remaining: u32 },
    Exhausted,
}

impl SlipBudget {
    pub fn new(allowed: u32) -> Self {
        Self {
            allowed,
            remaining: allowed,
        }
    }

    pub fn allowed(&self) -> u32 {
        self.allowed
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn consume(&mut self) -> SlipVerdict {
        if self.remaining == 0 {
            return SlipVerdict::Exhausted;
        }
        self.remaining -= 1;
        SlipVerdict::Forgiven {
            remaining: self.remaining,
        }
    }

    pub fn reset(&mut self) {
        self.remaining = self.allowed;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SequencePhase {
    Idle,
    Running,
    Escalating,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceState {
    pub current_stage_index: usize,
    pub stage_ids: Vec<String>,
    pub phase: SequencePhase,
}

/// One step of the activity: a task plus what happens when it escalates.
#[derive(Debug)]
pub struct Stage {
    id: String,
    task: Box<dyn Task>,
    escalation: Option<EscalationConfig>,
    struggle_chance: f32,
}

impl Stage {
    pub fn new(id: impl Into<String>, task: impl Task + 'static) -> Self {
        Self::boxed(id, Box::new(task))
    }

    pub fn boxed(id: impl Into<String>, task: Box<dyn Task>) -> Self {
        Self {
            id: id.into(),
            task,
            escalation: None,
            struggle_chance: 0.0,
        }
    }

    pub fn with_escalation(mut self, cfg: EscalationConfig) -> Self {
        self.escalation = Some(cfg);
        self
    }

    /// Chance per second of a forced struggle while the task is engaged.
    pub fn with_struggle_chance(mut self, per_second: f32) -> Self {
        self.struggle_chance = per_second;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn task(&self) -> &dyn Task {
        self.task.as_ref()
    }
}

#[derive(Debug)]
pub struct SequencerBuilder {
    stages: Vec<Stage>,
    allowed_slips: u32,
    restart_delay: f32,
    restart_clock: ClockKind,
    seed: Option<u64>,
}

impl Default for SequencerBuilder {
    fn default() -> Self {
        Self {
            stages: Vec::new(),
            allowed_slips: 0,
            restart_delay: DEFAULT_RESTART_DELAY,
            restart_clock: ClockKind::Unscaled,
            seed: None,
        }
    }
}

impl SequencerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn allowed_slips(mut self, n: u32) -> Self {
        self.allowed_slips = n;
        self
    }

    /// Seconds between a sequence failure and the restart from the first stage.
    pub fn restart_delay(mut self, delay: f32) -> Self {
        self.restart_delay = delay;
        self
    }

    pub fn restart_clock(mut self, clock: ClockKind) -> Self {
        self.restart_clock = clock;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build<S: EventSink>(self, sink: S) -> Result<StageSequencer<S>, ConfigError> {
        if self.stages.is_empty() {
            return Err(ConfigError::EmptySequence);
        }
        let mut seen = HashSet::new();
        for s in &self.stages {
            if s.id.trim().is_empty() {
                return Err(ConfigError::EmptyStageId);
            }
            if !seen.insert(s.id.clone()) {
                return Err(ConfigError::DuplicateStage(s.id.clone()));
            }
            if let Some(e) = &s.escalation {
                e.validate()?;
            }
            ConfigError::unit("struggle_chance_per_second", s.struggle_chance)?;
            if s.struggle_chance > 0.0 && s.escalation.is_none() {
                return Err(ConfigError::StruggleWithoutEscalation(s.id.clone()));
            }
        }
        let restart = Countdown::new(
            self.restart_clock,
            ConfigError::non_negative("restart_delay", self.restart_delay)?,
        );
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(StageSequencer {
            state: SequenceState {
                current_stage_index: 0,
                stage_ids: self.stages.iter().map(|s| s.id.clone()).collect(),
                phase: SequencePhase::Idle,
            },
            stages: self.stages,
            slips: SlipBudget::new(self.allowed_slips),
            escalation: None,
            restart,
            rng,
            last_progress: None,
            sink,
        })
    }
}

pub struct StageSequencer<S: EventSink> {
    stages: Vec<Stage>,
    state: SequenceState,
    slips: SlipBudget,
    escalation: Option<EscalationChallenge>,
    restart: Countdown,
    rng: StdRng,
    last_progress: Option<(TaskId, f32)>,
    sink: S,
}

impl<S: EventSink> StageSequencer<S> {
    /// Build every stage of a profile.
    pub fn from_profile(profile: &Profile, sink: S) -> Result<Self, ConfigError> {
        validate_profile(profile)?;
        let mut b = SequencerBuilder::new()
            .allowed_slips(profile.sequence.allowed_slips)
            .restart_delay(profile.sequence.restart_delay)
            .restart_clock(profile.sequence.clock);
        if let Some(seed) = profile.meta.seed {
            b = b.seed(seed);
        }
        for s in &profile.stages {
            let mut stage = Stage::boxed(s.id.clone(), tasks::build(&s.task)?)
                .with_struggle_chance(s.struggle_chance_per_second);
            if let Some(e) = &s.escalation {
                stage = stage.with_escalation(e.clone());
            }
            b = b.stage(stage);
        }
        b.build(sink)
    }

    // ---- accessors ----

    pub fn state(&self) -> &SequenceState {
        &self.state
    }

    pub fn phase(&self) -> SequencePhase {
        self.state.phase
    }

    pub fn slip_budget(&self) -> SlipBudget {
        self.slips
    }

    pub fn current(&self) -> TaskId {
        TaskId(self.state.current_stage_index)
    }

    pub fn stage(&self, id: TaskId) -> Option<&Stage> {
        self.stages.get(id.0)
    }

    pub fn escalation(&self) -> Option<&EscalationChallenge> {
        self.escalation.as_ref()
    }

    /// Progress of a task in [0, 1]; unknown ids read as 0.
    pub fn progress(&self, id: TaskId) -> f32 {
        self.stages.get(id.0).map_or(0.0, |s| s.task.progress())
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    // ---- driving ----

    pub fn start(&mut self) {
        if self.state.phase != SequencePhase::Idle {
            return;
        }
        info!("sequence started with {} stages", self.stages.len());
        self.state.phase = SequencePhase::Running;
        self.enter_stage(0);
    }

    pub fn handle_input(&mut self, ev: InputEvent) {
        match self.state.phase {
            SequencePhase::Running => {
                let idx = self.state.current_stage_index;
                let outcome = self.stages[idx].task.on_input(&ev);
                if let Some(o) = outcome {
                    self.apply(o);
                }
            }
            SequencePhase::Escalating => {
                let outcome = self.escalation.as_mut().and_then(|c| c.on_input(&ev));
                if let Some(o) = outcome {
                    self.resolve_escalation(o);
                }
            }
            SequencePhase::Idle | SequencePhase::Completed | SequencePhase::Failed => {
                debug!("{} ignored while {:?}", ev.label(), self.state.phase);
            }
        }
        self.push_progress();
    }

    pub fn tick(&mut self, frame: FrameTime) {
        match self.state.phase {
            SequencePhase::Running => {
                let idx = self.state.current_stage_index;
                match self.stages[idx].task.tick(frame) {
                    Some(o) => self.apply(o),
                    None => self.roll_struggle(frame),
                }
            }
            SequencePhase::Escalating => {
                let outcome = self.escalation.as_mut().and_then(|c| c.tick(frame));
                if let Some(o) = outcome {
                    self.resolve_escalation(o);
                }
            }
            SequencePhase::Failed => {
                if self.restart.tick(frame) {
                    self.restart();
                }
            }
            SequencePhase::Idle | SequencePhase::Completed => {}
        }
        self.push_progress();
    }

    /// Report that task `id` finished. Stale ids are ignored.
    pub fn advance_on_success(&mut self, id: TaskId) {
        if self.state.phase != SequencePhase::Running || id != self.current() {
            debug!("ignoring success from {id} (active {}, {:?})", self.current(), self.state.phase);
            return;
        }
        let idx = id.0;
        info!("stage '{}' complete", self.stages[idx].id);
        self.sink.emit(EngineEvent::StageAdvance {
            task: id,
            stage: self.stages[idx].id.clone(),
        });
        if idx + 1 >= self.stages.len() {
            self.state.phase = SequencePhase::Completed;
            info!("sequence completed");
            self.sink.emit(EngineEvent::SequenceCompleted);
        } else {
            self.enter_stage(idx + 1);
        }
    }

    /// Report that task `id` failed. Only the reason's category decides
    /// between a local retry and a full restart.
    pub fn on_fail(&mut self, id: TaskId, reason: FailReason) {
        let live = matches!(
            self.state.phase,
            SequencePhase::Running | SequencePhase::Escalating
        );
        if !live || id != self.current() {
            debug!("ignoring failure from {id}: {reason}");
            return;
        }
        match reason.category() {
            FailCategory::Slip => match self.slips.consume() {
                SlipVerdict::Forgiven { remaining } => {
                    warn!("slip on '{}': {reason} ({remaining} left)", self.stages[id.0].id);
                    self.retry_stage();
                    self.sink.emit(EngineEvent::StageFailed {
                        task: id,
                        reason,
                        slips_remaining: remaining,
                    });
                }
                SlipVerdict::Exhausted => self.fail_sequence(reason),
            },
            FailCategory::Stage => {
                warn!("stage '{}' failed: {reason}", self.stages[id.0].id);
                self.retry_stage();
                self.sink.emit(EngineEvent::StageFailed {
                    task: id,
                    reason,
                    slips_remaining: self.slips.remaining(),
                });
            }
            FailCategory::Sequence => self.fail_sequence(reason),
        }
    }

    /// Back to the first stage with a full slip budget. Any pending
    /// escalation or restart timer is discarded.
    pub fn restart(&mut self) {
        if self.state.phase == SequencePhase::Idle {
            self.start();
            return;
        }
        self.cancel_escalation();
        self.restart.cancel();
        for s in &mut self.stages {
            s.task.reset_state();
        }
        self.slips.reset();
        self.last_progress = None;
        self.state.phase = SequencePhase::Running;
        info!("sequence restarted");
        self.sink.emit(EngineEvent::SequenceRestarted);
        self.enter_stage(0);
    }

    // ---- internals ----

    fn enter_stage(&mut self, idx: usize) {
        self.state.current_stage_index = idx;
        let stage = &mut self.stages[idx];
        stage.task.activate();
        debug!("entering stage '{}' ({})", stage.id, stage.task.kind().as_str());
        self.sink.emit(EngineEvent::StageStarted {
            task: TaskId(idx),
            stage: stage.id.clone(),
        });
    }

    fn apply(&mut self, outcome: TaskOutcome) {
        let id = self.current();
        match outcome {
            TaskOutcome::PassCleared { .. } => {
                let pass = self.stages[id.0].task.pass_name().unwrap_or_default().to_string();
                self.sink.emit(EngineEvent::PassAdvance { task: id, pass });
            }
            TaskOutcome::Succeeded => self.advance_on_success(id),
            TaskOutcome::Failed(reason) => self.on_fail(id, reason),
            TaskOutcome::EscalationRequested => {
                if self.stages[id.0].escalation.is_some() {
                    self.begin_escalation();
                } else {
                    self.on_fail(id, FailReason::Spam);
                }
            }
        }
    }

    fn roll_struggle(&mut self, frame: FrameTime) {
        let stage = &self.stages[self.state.current_stage_index];
        let Some(cfg) = &stage.escalation else {
            return;
        };
        if stage.struggle_chance <= 0.0 || !stage.task.engaged() {
            return;
        }
        let clock = match cfg {
            EscalationConfig::Stillness { clock, .. } | EscalationConfig::ClickQuota { clock, .. } => {
                *clock
            }
        };
        let p = (stage.struggle_chance * frame.delta(clock)).clamp(0.0, 1.0);
        if self.rng.gen_bool(p as f64) {
            warn!("struggle triggered on '{}'", stage.id);
            self.begin_escalation();
        }
    }

    fn begin_escalation(&mut self) {
        let stage = &mut self.stages[self.state.current_stage_index];
        let Some(cfg) = &stage.escalation else {
            return;
        };
        stage.task.suspend();
        let challenge = EscalationChallenge::start(cfg);
        warn!(
            "escalation {:?} on '{}' for {:.1}s",
            challenge.kind(),
            stage.id,
            challenge.duration()
        );
        self.sink.emit(EngineEvent::EscalationStarted {
            kind: challenge.kind(),
            duration: challenge.duration(),
        });
        self.escalation = Some(challenge);
        self.state.phase = SequencePhase::Escalating;
    }

    fn resolve_escalation(&mut self, outcome: EscalationOutcome) {
        self.escalation = None;
        self.sink.emit(EngineEvent::EscalationEnded {
            outcome: outcome.clone(),
        });
        match outcome {
            EscalationOutcome::Survived => {
                info!("escalation survived");
                self.stages[self.state.current_stage_index].task.resume();
                self.state.phase = SequencePhase::Running;
            }
            EscalationOutcome::Failed(reason) => {
                let id = self.current();
                self.on_fail(id, reason);
            }
        }
    }

    fn cancel_escalation(&mut self) {
        if let Some(mut c) = self.escalation.take() {
            c.cancel();
        }
    }

    fn retry_stage(&mut self) {
        self.cancel_escalation();
        let stage = &mut self.stages[self.state.current_stage_index];
        stage.task.reset_state();
        stage.task.activate();
        self.state.phase = SequencePhase::Running;
    }

    fn fail_sequence(&mut self, reason: FailReason) {
        self.cancel_escalation();
        self.state.phase = SequencePhase::Failed;
        warn!("sequence failed: {reason}");
        self.sink.emit(EngineEvent::SequenceFailed { reason });
        if self.restart.duration() <= 0.0 {
            self.restart();
        } else {
            self.restart.start();
        }
    }

    fn push_progress(&mut self) {
        if !matches!(
            self.state.phase,
            SequencePhase::Running | SequencePhase::Escalating
        ) {
            return;
        }
        let id = self.current();
        let value = self.stages[id.0].task.progress();
        if self.last_progress != Some((id, value)) {
            self.last_progress = Some((id, value));
            self.sink.emit(EngineEvent::Progress { task: id, value });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CaptureConfig, GestureConfig, HoldCompletion, HoldConfig};
    use crate::input::PointerSample;
    use crate::tasks::{CaptureTask, HoldTask};

    fn hold_stage(id: &str) -> Stage {
        hold_stage_for(id, 1.0)
    }

    fn hold_stage_for(id: &str, secs: f32) -> Stage {
        Stage::new(
            id,
            HoldTask::new(HoldConfig {
                gesture: GestureConfig {
                    required_duration: Some(secs),
                    ..GestureConfig::default()
                },
                completion: HoldCompletion::Tick,
                clock: ClockKind::Unscaled,
            })
            .unwrap(),
        )
    }

    fn two_holds(slips: u32) -> StageSequencer<Vec<EngineEvent>> {
        SequencerBuilder::new()
            .stage(hold_stage("rinse"))
            .stage(hold_stage("dry"))
            .allowed_slips(slips)
            .seed(1)
            .build(Vec::new())
            .unwrap()
    }

    fn press(seq: &mut StageSequencer<Vec<EngineEvent>>, t: f64) {
        seq.handle_input(InputEvent::PointerDown(PointerSample::new(0.0, 0.0, t)));
    }

    fn release(seq: &mut StageSequencer<Vec<EngineEvent>>, t: f64) {
        seq.handle_input(InputEvent::PointerUp(PointerSample::new(0.0, 0.0, t)));
    }

    #[test]
    fn slip_budget_counts_down_then_exhausts() {
        let mut b = SlipBudget::new(1);
        assert_eq!(b.consume(), SlipVerdict::Forgiven { remaining: 0 });
        assert_eq!(b.consume(), SlipVerdict::Exhausted);
        assert_eq!(b.remaining(), 0);
        b.reset();
        assert_eq!(b.remaining(), 1);
    }

    #[test]
    fn one_slip_is_forgiven_the_second_restarts_everything() {
        let mut seq = two_holds(1);
        seq.start();

        // clear the first stage
        press(&mut seq, 0.0);
        for _ in 0..10 {
            seq.tick(FrameTime::uniform(0.1));
        }
        assert_eq!(seq.current(), TaskId(1));

        // first slip: retried locally
        press(&mut seq, 2.0);
        release(&mut seq, 2.1);
        assert_eq!(seq.current(), TaskId(1));
        assert_eq!(seq.phase(), SequencePhase::Running);
        assert_eq!(seq.slip_budget().remaining(), 0);

        // second slip: the whole sequence fails
        press(&mut seq, 3.0);
        release(&mut seq, 3.1);
        assert_eq!(seq.phase(), SequencePhase::Failed);
        let failures: Vec<_> = seq
            .sink()
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    EngineEvent::StageFailed { .. } | EngineEvent::SequenceFailed { .. }
                )
            })
            .cloned()
            .collect();
        assert_eq!(
            failures,
            vec![
                EngineEvent::StageFailed {
                    task: TaskId(1),
                    reason: FailReason::ReleasedEarly,
                    slips_remaining: 0
                },
                EngineEvent::SequenceFailed {
                    reason: FailReason::ReleasedEarly
                },
            ]
        );

        // input is ignored while the restart is pending
        press(&mut seq, 4.0);
        seq.tick(FrameTime::uniform(0.5));
        assert_eq!(seq.phase(), SequencePhase::Failed);

        seq.tick(FrameTime::uniform(0.5));
        assert_eq!(seq.phase(), SequencePhase::Running);
        assert_eq!(seq.current(), TaskId(0));
        assert_eq!(seq.slip_budget().remaining(), 1);
        assert_eq!(seq.progress(TaskId(0)), 0.0);
    }

    #[test]
    fn stale_reports_are_ignored() {
        let mut seq = two_holds(0);
        seq.start();
        seq.advance_on_success(TaskId(1));
        seq.on_fail(TaskId(1), FailReason::TooFast);
        assert_eq!(seq.current(), TaskId(0));
        assert_eq!(seq.phase(), SequencePhase::Running);
        assert_eq!(seq.slip_budget().remaining(), 0);
    }

    #[test]
    fn external_reports_drive_the_sequence() {
        let mut seq = two_holds(0);
        seq.start();
        seq.advance_on_success(TaskId(0));
        seq.advance_on_success(TaskId(1));
        assert_eq!(seq.phase(), SequencePhase::Completed);
        assert_eq!(seq.sink().last(), Some(&EngineEvent::SequenceCompleted));
    }

    #[test]
    fn restart_delay_is_tick_driven() {
        let mut seq: StageSequencer<Vec<EngineEvent>> = SequencerBuilder::new()
            .stage(hold_stage("place"))
            .restart_delay(2.0)
            .build(Vec::new())
            .unwrap();
        seq.start();
        press(&mut seq, 0.0);
        release(&mut seq, 0.2);
        assert_eq!(seq.phase(), SequencePhase::Failed);

        seq.tick(FrameTime::uniform(1.5));
        assert_eq!(seq.phase(), SequencePhase::Failed);
        seq.tick(FrameTime::uniform(0.5));
        assert_eq!(seq.phase(), SequencePhase::Running);
        assert!(seq.sink().contains(&EngineEvent::SequenceRestarted));
    }

    #[test]
    fn zero_delay_restarts_in_the_same_call() {
        let mut seq: StageSequencer<Vec<EngineEvent>> = SequencerBuilder::new()
            .stage(hold_stage("place"))
            .stage(hold_stage("rinse"))
            .restart_delay(0.0)
            .build(Vec::new())
            .unwrap();
        seq.start();
        seq.advance_on_success(TaskId(0));
        seq.on_fail(TaskId(1), FailReason::Panicked);

        assert_eq!(seq.phase(), SequencePhase::Running);
        assert_eq!(seq.current(), TaskId(0));
        let tail: Vec<_> = seq.sink().iter().rev().take(3).cloned().collect();
        assert_eq!(
            tail,
            vec![
                EngineEvent::StageStarted {
                    task: TaskId(0),
                    stage: "place".into()
                },
                EngineEvent::SequenceRestarted,
                EngineEvent::SequenceFailed {
                    reason: FailReason::Panicked
                },
            ]
        );
    }

    #[test]
    fn restart_discards_a_running_escalation() {
        let stage = hold_stage_for("foam", 5.0)
            .with_escalation(EscalationConfig::Stillness {
                countdown: 3.0,
                clock: ClockKind::Unscaled,
                motion_counts: false,
            })
            .with_struggle_chance(1.0);
        let mut seq: StageSequencer<Vec<EngineEvent>> = SequencerBuilder::new()
            .stage(stage)
            .seed(4)
            .build(Vec::new())
            .unwrap();
        seq.start();
        press(&mut seq, 0.0);
        seq.tick(FrameTime::uniform(1.0));
        assert_eq!(seq.phase(), SequencePhase::Escalating);

        seq.restart();
        assert_eq!(seq.phase(), SequencePhase::Running);
        assert!(seq.escalation().is_none());

        seq.tick(FrameTime::uniform(4.0));
        assert_eq!(seq.phase(), SequencePhase::Running);
        assert_eq!(seq.current(), TaskId(0));
        assert!(
            !seq.sink()
                .iter()
                .any(|e| matches!(e, EngineEvent::EscalationEnded { .. }))
        );
    }

    #[test]
    fn spam_without_escalation_is_a_slip() {
        use crate::config::CadenceConfig;
        use crate::tasks::CadenceTask;

        let cadence = CadenceTask::new(CadenceConfig {
            gesture: GestureConfig {
                ideal_interval: Some(1.0),
                spam_count_threshold: 2,
                ..GestureConfig::default()
            },
            ..CadenceConfig::default()
        })
        .unwrap();
        let mut seq: StageSequencer<Vec<EngineEvent>> = SequencerBuilder::new()
            .stage(Stage::new("wash", cadence))
            .allowed_slips(3)
            .build(Vec::new())
            .unwrap();
        seq.start();
        seq.handle_input(InputEvent::Click { t: 0.0 });
        seq.handle_input(InputEvent::Click { t: 0.1 });
        assert_eq!(seq.slip_budget().remaining(), 2);
        assert!(seq.sink().contains(&EngineEvent::StageFailed {
            task: TaskId(0),
            reason: FailReason::Spam,
            slips_remaining: 2
        }));
    }

    #[test]
    fn certain_struggle_interrupts_an_engaged_hold() {
        let stage = hold_stage_for("foam", 5.0)
            .with_escalation(EscalationConfig::ClickQuota {
                duration: 2.0,
                clicks_needed: 2,
                clock: ClockKind::Unscaled,
            })
            .with_struggle_chance(1.0);
        let mut seq: StageSequencer<Vec<EngineEvent>> = SequencerBuilder::new()
            .stage(stage)
            .seed(9)
            .build(Vec::new())
            .unwrap();
        seq.start();

        // not engaged: no roll
        seq.tick(FrameTime::uniform(1.0));
        assert_eq!(seq.phase(), SequencePhase::Running);

        press(&mut seq, 0.0);
        seq.tick(FrameTime::uniform(1.0));
        assert_eq!(seq.phase(), SequencePhase::Escalating);
        assert_eq!(seq.progress(TaskId(0)), 0.0);

        seq.handle_input(InputEvent::Click { t: 1.1 });
        seq.handle_input(InputEvent::Click { t: 1.2 });
        assert_eq!(seq.phase(), SequencePhase::Running);
        assert!(seq.sink().contains(&EngineEvent::EscalationEnded {
            outcome: EscalationOutcome::Survived
        }));
    }

    #[test]
    fn builder_rejects_bad_layouts() {
        let err = SequencerBuilder::new().build(Vec::<EngineEvent>::new()).err();
        assert_eq!(err, Some(ConfigError::EmptySequence));

        let err = SequencerBuilder::new()
            .stage(hold_stage("a"))
            .stage(hold_stage("a"))
            .build(Vec::<EngineEvent>::new())
            .err();
        assert_eq!(err, Some(ConfigError::DuplicateStage("a".into())));

        let capture = CaptureTask::new(CaptureConfig::default()).unwrap();
        let err = SequencerBuilder::new()
            .stage(Stage::new("grab", capture).with_struggle_chance(0.5))
            .build(Vec::<EngineEvent>::new())
            .err();
        assert_eq!(err, Some(ConfigError::StruggleWithoutEscalation("grab".into())));
    }
}
