//! Offline replay of a scripted session against a profile.
//!
//! The simulator plays the host's role: it owns a [`ManualClock`], ticks the
//! sequencer once per frame and delivers script events when they fall due.
//!
//! [`ManualClock`]: crate::clock::ManualClock

pub mod dispatch;
pub mod pipeline;
pub mod script;

pub use pipeline::{SimReport, run_script};
pub use script::{Script, ScriptEvent};
