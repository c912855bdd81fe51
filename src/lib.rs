//! Tick-driven engine for timed, rate-limited gesture minigames.
//!
//! A [`StageSequencer`] runs an ordered list of [`tasks`] (holds, click
//! cadences, captures, calm meters), screens the player's input through a
//! [`GestureValidator`], and interrupts with an [`EscalationChallenge`] when
//! the input turns spammy. The host feeds it [`InputEvent`]s and one
//! [`FrameTime`] per frame, and listens on an [`EventSink`].
//!
//! [`GestureValidator`]: gestures::GestureValidator
//! [`EscalationChallenge`]: escalation::EscalationChallenge

pub mod clock;
pub mod config;
pub mod error;
pub mod escalation;
pub mod events;
pub mod gestures;
pub mod input;
pub mod sequencer;
pub mod sim;
pub mod tasks;
pub mod tracker;

pub use clock::{ClockKind, FrameTime};
pub use config::Profile;
pub use error::{ConfigError, FailCategory, FailReason};
pub use events::{EngineEvent, EventSink};
pub use input::{InputEvent, PointerSample};
pub use sequencer::{SequencePhase, SequencerBuilder, Stage, StageSequencer};
pub use tasks::{Task, TaskId, TaskOutcome};
