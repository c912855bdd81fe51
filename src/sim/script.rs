use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::{fs, path::Path};

/// One timed entry of a script. `at` is in unscaled seconds from the start.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptEvent {
    Down {
        at: f64,
        #[serde(default)]
        x: f32,
        #[serde(default)]
        y: f32,
    },
    Move { at: f64, x: f32, y: f32 },
    Up {
        at: f64,
        #[serde(default)]
        x: f32,
        #[serde(default)]
        y: f32,
    },
    Click { at: f64 },
    /// Change the host's time scale; 0 pauses scaled time.
    TimeScale { at: f64, scale: f32 },
}

impl ScriptEvent {
    pub fn at(&self) -> f64 {
        match *self {
            ScriptEvent::Down { at, .. }
            | ScriptEvent::Move { at, .. }
            | ScriptEvent::Up { at, .. }
            | ScriptEvent::Click { at }
            | ScriptEvent::TimeScale { at, .. } => at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    /// Frame length in seconds.
    #[serde(default = "default_frame")]
    pub frame: f32,
    /// Stop time; one second after the last event when absent.
    #[serde(default)]
    pub end: Option<f64>,
    #[serde(default)]
    pub events: Vec<ScriptEvent>,
}

fn default_frame() -> f32 {
    1.0 / 60.0
}

impl Script {
    pub fn from_toml_str(txt: &str) -> Result<Self> {
        let mut script: Script = toml::from_str(txt)?;
        script.validate()?;
        // stable: same-time events keep their written order
        script.events.sort_by(|a, b| a.at().total_cmp(&b.at()));
        Ok(script)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        Self::from_toml_str(&txt)
            .with_context(|| format!("failed to parse script {}", path.display()))
    }

    pub fn end_time(&self) -> f64 {
        self.end.unwrap_or_else(|| {
            self.events
                .iter()
                .map(ScriptEvent::at)
                .fold(0.0, f64::max)
                + 1.0
        })
    }

    fn validate(&self) -> Result<()> {
        if !(self.frame.is_finite() && self.frame > 0.0) {
            bail!("frame must be a positive number of seconds, got {}", self.frame);
        }
        if let Some(end) = self.end {
            if !(end.is_finite() && end >= 0.0) {
                bail!("end must be zero or positive, got {end}");
            }
        }
        for ev in &self.events {
            let at = ev.at();
            if !(at.is_finite() && at >= 0.0) {
                bail!("event time must be zero or positive, got {at}");
            }
            if let ScriptEvent::TimeScale { scale, .. } = ev {
                if !(scale.is_finite() && *scale >= 0.0) {
                    bail!("time_scale at {at} must be zero or positive, got {scale}");
                }
            }
        }
        Ok(())
    }
}
