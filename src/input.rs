//! Input events delivered by the host, one per discrete event.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    pub x: f32,
    pub y: f32,
    /// Monotonic seconds.
    pub t: f64,
}

impl PointerSample {
    pub fn new(x: f32, y: f32, t: f64) -> Self {
        Self { x, y, t }
    }

    pub fn distance_to(&self, other: &PointerSample) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.t.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown(PointerSample),
    PointerMove(PointerSample),
    PointerUp(PointerSample),
    Click { t: f64 },
}

impl InputEvent {
    pub fn timestamp(&self) -> f64 {
        match self {
            InputEvent::PointerDown(s) | InputEvent::PointerMove(s) | InputEvent::PointerUp(s) => {
                s.t
            }
            InputEvent::Click { t } => *t,
        }
    }

    /// Presses are deliberate reactions; moves and releases are not.
    pub fn is_press(&self) -> bool {
        matches!(self, InputEvent::PointerDown(_) | InputEvent::Click { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            InputEvent::PointerDown(_) => "down",
            InputEvent::PointerMove(_) => "move",
            InputEvent::PointerUp(_) => "up",
            InputEvent::Click { .. } => "click",
        }
    }
}
