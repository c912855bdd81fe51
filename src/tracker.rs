//! Per-task runtime state: progress, motion baseline and click history.

use std::collections::VecDeque;

use crate::input::PointerSample;

/// Progress within this distance of 1.0 counts as complete.
pub const PROGRESS_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Default)]
pub struct TaskRuntimeState {
    progress: f32,
    pub smoothed_speed: f32,
    /// Baseline for the next speed measurement.
    pub last_sample: Option<PointerSample>,
    /// Last click that was scored (spam clicks are not).
    pub last_click_at: Option<f64>,
    recent_clicks: VecDeque<f64>, // oldest first
}

impl TaskRuntimeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn set_progress(&mut self, p: f32) {
        self.progress = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
    }

    pub fn add_progress(&mut self, delta: f32) -> f32 {
        self.set_progress(self.progress + delta);
        self.progress
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= 1.0 - PROGRESS_EPSILON
    }

    /// Start a fresh motion measurement at `sample`.
    pub fn begin_motion(&mut self, sample: PointerSample) {
        self.last_sample = Some(sample);
        self.smoothed_speed = 0.0;
    }

    pub fn end_motion(&mut self) {
        self.last_sample = None;
        self.smoothed_speed = 0.0;
    }

    /// Newest click seen, scored or not.
    pub fn latest_click(&self) -> Option<f64> {
        self.recent_clicks.back().copied()
    }

    /// Record a click at `t` and drop entries older than `window`.
    /// Returns the retained count, including this click.
    pub fn record_click(&mut self, t: f64, window: f32) -> usize {
        self.recent_clicks.push_back(t);
        let window = window as f64;
        while let Some(&oldest) = self.recent_clicks.front() {
            if t - oldest > window {
                self.recent_clicks.pop_front();
            } else {
                break;
            }
        }
        self.recent_clicks.len()
    }

    pub fn recent_click_count(&self) -> usize {
        self.recent_clicks.len()
    }

    pub fn clear_spam_history(&mut self) {
        self.recent_clicks.clear();
    }

    /// Forget all timing history (fresh pass or stage).
    pub fn clear_click_history(&mut self) {
        self.recent_clicks.clear();
        self.last_click_at = None;
    }
}
