//! Frame timing: scaled/unscaled deltas and tick-driven timers.

use serde::{Deserialize, Serialize};

/// Slack used when comparing accumulated frame time against a duration.
pub const TIME_EPSILON: f32 = 1e-4;

/// Which clock a timer advances on. Scaled time stops while the host is paused
/// (cutscenes, menus); unscaled time keeps running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockKind {
    Scaled,
    #[default]
    Unscaled,
}

/// Elapsed time for one frame, on both clocks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTime {
    pub scaled: f32,
    pub unscaled: f32,
}

impl FrameTime {
    pub fn uniform(dt: f32) -> Self {
        Self {
            scaled: dt,
            unscaled: dt,
        }
    }

    /// A frame while the host's time scale is zero.
    pub fn paused(unscaled: f32) -> Self {
        Self {
            scaled: 0.0,
            unscaled,
        }
    }

    /// Delta on the requested clock. Non-finite or negative deltas read as zero.
    pub fn delta(&self, kind: ClockKind) -> f32 {
        let dt = match kind {
            ClockKind::Scaled => self.scaled,
            ClockKind::Unscaled => self.unscaled,
        };
        if dt.is_finite() && dt > 0.0 { dt } else { 0.0 }
    }
}

/// Host clock as seen by the engine.
pub trait Clock {
    fn now(&self) -> f64;
    fn unscaled_now(&self) -> f64;
}

/// A clock advanced by hand; used by the simulator and tests.
#[derive(Debug, Clone)]
pub struct ManualClock {
    scaled: f64,
    unscaled: f64,
    time_scale: f32,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            scaled: 0.0,
            unscaled: 0.0,
            time_scale: 1.0,
        }
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = if scale.is_finite() { scale.max(0.0) } else { 1.0 };
    }

    /// Advance by `dt` real seconds and return the frame that covers it.
    pub fn advance(&mut self, dt: f32) -> FrameTime {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let frame = FrameTime {
            scaled: dt * self.time_scale,
            unscaled: dt,
        };
        self.scaled += frame.scaled as f64;
        self.unscaled += frame.unscaled as f64;
        frame
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.scaled
    }

    fn unscaled_now(&self) -> f64 {
        self.unscaled
    }
}

/// One-shot countdown advanced by [`Countdown::tick`]. A cancelled countdown
/// never fires, so a pending expiry cannot leak into a later state.
#[derive(Debug, Clone)]
pub struct Countdown {
    clock: ClockKind,
    duration: f32,
    remaining: f32,
    armed: bool,
}

impl Countdown {
    pub fn new(clock: ClockKind, duration: f32) -> Self {
        Self {
            clock,
            duration,
            remaining: duration,
            armed: false,
        }
    }

    pub fn start(&mut self) {
        self.remaining = self.duration;
        self.armed = true;
    }

    pub fn cancel(&mut self) {
        self.armed = false;
        self.remaining = self.duration;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn remaining(&self) -> f32 {
        self.remaining.max(0.0)
    }

    pub fn clock(&self) -> ClockKind {
        self.clock
    }

    /// Returns true on the single tick where the countdown runs out.
    pub fn tick(&mut self, frame: FrameTime) -> bool {
        if !self.armed {
            return false;
        }
        self.remaining -= frame.delta(self.clock);
        if self.remaining <= TIME_EPSILON {
            self.remaining = 0.0;
            self.armed = false;
            return true;
        }
        false
    }
}

/// Accumulates elapsed time while running.
#[derive(Debug, Clone, Default)]
pub struct Stopwatch {
    clock: ClockKind,
    elapsed: f32,
    running: bool,
}

impl Stopwatch {
    pub fn new(clock: ClockKind) -> Self {
        Self {
            clock,
            elapsed: 0.0,
            running: false,
        }
    }

    pub fn start(&mut self) {
        self.elapsed = 0.0;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// True once `elapsed` has reached `duration`, within [`TIME_EPSILON`].
    pub fn reached(&self, duration: f32) -> bool {
        self.elapsed + TIME_EPSILON >= duration
    }

    pub fn tick(&mut self, frame: FrameTime) -> f32 {
        if self.running {
            self.elapsed += frame.delta(self.clock);
        }
        self.elapsed
    }
}
