use anyhow::{Context, Result, anyhow};
use directories::UserDirs;
use log::{info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use crate::clock::ClockKind;
use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    pub name: Option<String>,
    /// Seed for struggle rolls; entropy when absent.
    pub seed: Option<u64>,
}

/// Tolerances for one gesture. Task-defining values are optional here and
/// required by the task kinds that use them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Seconds a hold must last.
    pub required_duration: Option<f32>,
    /// Smoothed pointer speed (units/s) above which motion is aggressive.
    pub aggressive_speed_threshold: f32,
    /// Seconds between well-timed clicks.
    pub ideal_interval: Option<f32>,
    pub interval_tolerance: f32,
    pub good_progress_delta: f32,
    pub bad_progress_delta: f32,
    pub spam_count_threshold: u32,
    pub spam_window_duration: f32,
    /// 1.0 uses raw speed, smaller values smooth harder.
    pub speed_smoothing_factor: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            required_duration: None,
            aggressive_speed_threshold: 1000.0,
            ideal_interval: None,
            interval_tolerance: 0.3,
            good_progress_delta: 0.10,
            bad_progress_delta: 0.02,
            spam_count_threshold: 4,
            spam_window_duration: 1.0,
            speed_smoothing_factor: 1.0,
        }
    }
}

impl GestureConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(d) = self.required_duration {
            ConfigError::positive("required_duration", d)?;
        }
        if let Some(i) = self.ideal_interval {
            ConfigError::positive("ideal_interval", i)?;
        }
        ConfigError::positive("aggressive_speed_threshold", self.aggressive_speed_threshold)?;
        ConfigError::non_negative("interval_tolerance", self.interval_tolerance)?;
        ConfigError::non_negative("good_progress_delta", self.good_progress_delta)?;
        ConfigError::non_negative("bad_progress_delta", self.bad_progress_delta)?;
        ConfigError::positive("spam_window_duration", self.spam_window_duration)?;
        ConfigError::unit("speed_smoothing_factor", self.speed_smoothing_factor)?;
        if self.spam_count_threshold == 0 {
            return Err(ConfigError::Invalid {
                field: "spam_count_threshold",
                expected: "at least 1",
                value: 0.0,
            });
        }
        Ok(())
    }

    pub(crate) fn require_duration(&self) -> Result<f32, ConfigError> {
        let d = self.required_duration.ok_or(ConfigError::Missing {
            field: "required_duration",
            task: "hold",
        })?;
        ConfigError::positive("required_duration", d)
    }

    pub(crate) fn require_interval(&self) -> Result<f32, ConfigError> {
        let i = self.ideal_interval.ok_or(ConfigError::Missing {
            field: "ideal_interval",
            task: "cadence",
        })?;
        ConfigError::positive("ideal_interval", i)
    }
}

/// When a hold is judged complete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoldCompletion {
    /// The frame the timer fills.
    #[default]
    Tick,
    /// On release after the timer has filled.
    Release,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HoldConfig {
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub completion: HoldCompletion,
    #[serde(default)]
    pub clock: ClockKind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CadenceConfig {
    #[serde(default)]
    pub gesture: GestureConfig,
    /// Pass names, or a plain count.
    #[serde(default = "default_passes", deserialize_with = "deserialize_passes")]
    pub passes: Vec<String>,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            gesture: GestureConfig::default(),
            passes: default_passes(),
        }
    }
}

fn default_passes() -> Vec<String> {
    vec!["main".to_string()]
}

// --------- tolerant passes deserializer: `passes = 3` or `passes = ["soap", ...]` ----------
fn deserialize_passes<'de, D>(de: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let val = toml::Value::deserialize(de)?;
    match val {
        toml::Value::Integer(n) if n > 0 => Ok((1..=n).map(|i| format!("pass-{i}")).collect()),
        toml::Value::Array(items) => items
            .into_iter()
            .map(|v| match v {
                toml::Value::String(s) if !s.trim().is_empty() => Ok(s),
                other => Err(serde::de::Error::custom(format!(
                    "pass names must be non-empty strings, got {}",
                    other.type_str()
                ))),
            })
            .collect(),
        other => Err(serde::de::Error::custom(format!(
            "passes must be a positive count or a list of names, got {other}"
        ))),
    }
}
// ------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    /// Seconds after the first click during which a second click fails.
    #[serde(default = "default_capture_window")]
    pub window: f32,
    #[serde(default = "scaled_clock")]
    pub clock: ClockKind,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            window: default_capture_window(),
            clock: ClockKind::Scaled,
        }
    }
}

fn default_capture_window() -> f32 {
    0.5
}

fn scaled_clock() -> ClockKind {
    ClockKind::Scaled
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CalmConfig {
    pub initial: f32,
    pub max: f32,
    pub rise_per_second: f32,
    pub relief_per_click: f32,
    pub clock: ClockKind,
}

impl Default for CalmConfig {
    fn default() -> Self {
        Self {
            initial: 30.0,
            max: 100.0,
            rise_per_second: 5.0,
            relief_per_click: 10.0,
            clock: ClockKind::Scaled,
        }
    }
}

impl CalmConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::positive("max", self.max)?;
        ConfigError::positive("initial", self.initial)?;
        if self.initial >= self.max {
            return Err(ConfigError::Invalid {
                field: "initial",
                expected: "below max",
                value: self.initial,
            });
        }
        ConfigError::non_negative("rise_per_second", self.rise_per_second)?;
        ConfigError::positive("relief_per_click", self.relief_per_click)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TaskConfig {
    Hold(HoldConfig),
    Cadence(CadenceConfig),
    Capture(CaptureConfig),
    Calm(CalmConfig),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EscalationConfig {
    /// Survive `countdown` seconds without reacting.
    Stillness {
        countdown: f32,
        #[serde(default)]
        clock: ClockKind,
        /// Count moves and releases as reactions, not only presses.
        #[serde(default)]
        motion_counts: bool,
    },
    /// Click `clicks_needed` times before `duration` runs out.
    ClickQuota {
        duration: f32,
        clicks_needed: u32,
        #[serde(default = "scaled_clock")]
        clock: ClockKind,
    },
}

impl EscalationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            EscalationConfig::Stillness { countdown, .. } => {
                ConfigError::positive("countdown", *countdown)?;
            }
            EscalationConfig::ClickQuota {
                duration,
                clicks_needed,
                ..
            } => {
                ConfigError::positive("duration", *duration)?;
                if *clicks_needed == 0 {
                    return Err(ConfigError::Invalid {
                        field: "clicks_needed",
                        expected: "at least 1",
                        value: 0.0,
                    });
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StageConfig {
    pub id: String,
    pub task: TaskConfig,
    #[serde(default)]
    pub escalation: Option<EscalationConfig>,
    #[serde(default)]
    pub struggle_chance_per_second: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    pub allowed_slips: u32,
    /// Seconds before a failed sequence restarts from the first stage; 0 restarts at once.
    pub restart_delay: f32,
    pub clock: ClockKind,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            allowed_slips: 0,
            restart_delay: DEFAULT_RESTART_DELAY,
            clock: ClockKind::Unscaled,
        }
    }
}

pub const DEFAULT_RESTART_DELAY: f32 = 1.0;

#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub sequence: SequenceConfig,
    pub stages: Vec<StageConfig>,
}

impl Profile {
    pub fn from_toml_str(txt: &str) -> Result<Self> {
        let profile: Profile = toml::from_str(txt)?;
        validate_profile(&profile)?;
        Ok(profile)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&txt).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn display_name(&self) -> &str {
        self.meta.name.as_deref().unwrap_or("unnamed")
    }

    pub fn summary(&self) -> serde_json::Value {
        let stages: Vec<_> = self
            .stages
            .iter()
            .map(|s| {
                let kind = match &s.task {
                    TaskConfig::Hold(_) => "hold",
                    TaskConfig::Cadence(_) => "cadence",
                    TaskConfig::Capture(_) => "capture",
                    TaskConfig::Calm(_) => "calm",
                };
                let escalation = s.escalation.as_ref().map(|e| match e {
                    EscalationConfig::Stillness { .. } => "stillness",
                    EscalationConfig::ClickQuota { .. } => "click_quota",
                });
                serde_json::json!({
                    "id": s.id,
                    "task": kind,
                    "escalation": escalation,
                    "struggle_chance_per_second": s.struggle_chance_per_second,
                })
            })
            .collect();
        serde_json::json!({
            "name": self.display_name(),
            "allowed_slips": self.sequence.allowed_slips,
            "restart_delay": self.sequence.restart_delay,
            "stages": stages,
        })
    }
}

pub fn validate_profile(p: &Profile) -> Result<(), ConfigError> {
    if p.stages.is_empty() {
        return Err(ConfigError::EmptySequence);
    }
    ConfigError::non_negative("restart_delay", p.sequence.restart_delay)?;

    let mut seen = HashSet::new();
    for s in &p.stages {
        if s.id.trim().is_empty() {
            return Err(ConfigError::EmptyStageId);
        }
        if !seen.insert(s.id.as_str()) {
            return Err(ConfigError::DuplicateStage(s.id.clone()));
        }

        match &s.task {
            TaskConfig::Hold(h) => {
                h.gesture.validate()?;
                h.gesture.require_duration()?;
            }
            TaskConfig::Cadence(c) => {
                c.gesture.validate()?;
                c.gesture.require_interval()?;
            }
            TaskConfig::Capture(c) => {
                ConfigError::positive("window", c.window)?;
            }
            TaskConfig::Calm(c) => c.validate()?,
        }

        if let Some(e) = &s.escalation {
            e.validate()?;
        }
        ConfigError::unit("struggle_chance_per_second", s.struggle_chance_per_second)?;
        if s.struggle_chance_per_second > 0.0 && s.escalation.is_none() {
            return Err(ConfigError::StruggleWithoutEscalation(s.id.clone()));
        }
    }
    Ok(())
}

pub fn default_profile_text() -> &'static str {
    include_str!("../profiles/default.toml")
}

/// Profile directory on disk, `~/.config/patience/profiles`.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    pub profiles_dir: PathBuf,
}

impl ProfileStore {
    pub fn from_home() -> Result<Self> {
        let dirs = UserDirs::new().ok_or_else(|| anyhow!("could not resolve home directory"))?;
        let dir = dirs.home_dir().join(".config").join("patience").join("profiles");
        Ok(Self::at(dir))
    }

    pub fn at(profiles_dir: impl Into<PathBuf>) -> Self {
        Self {
            profiles_dir: profiles_dir.into(),
        }
    }

    /// Write the bundled default profile unless one already exists.
    pub fn install_default(&self) -> Result<PathBuf> {
        fs::create_dir_all(&self.profiles_dir)?;
        let path = self.profiles_dir.join("default.toml");
        if path.exists() {
            info!("default profile already present at {}", path.display());
        } else {
            fs::write(&path, default_profile_text())?;
            info!("installed default profile at {}", path.display());
        }
        Ok(path)
    }

    pub fn list_profiles(&self) -> Vec<String> {
        let mut v = Vec::new();
        if let Ok(rd) = fs::read_dir(&self.profiles_dir) {
            for e in rd.flatten() {
                let p = e.path();
                if p.extension().is_some_and(|ext| ext == "toml") {
                    if let Some(stem) = p.file_stem().and_then(|s| s.to_str()) {
                        v.push(stem.to_string());
                    }
                }
            }
        }
        v.sort();
        v
    }

    /// `arg` is a path to a profile file or the name of one in the store.
    pub fn resolve(&self, arg: &str) -> Result<PathBuf> {
        let direct = PathBuf::from(arg);
        if direct.is_file() {
            return Ok(direct);
        }
        let named = self.profiles_dir.join(format!("{arg}.toml"));
        if named.is_file() {
            return Ok(named);
        }
        warn!("profile '{arg}' not found as a file or in {}", self.profiles_dir.display());
        Err(anyhow!("profile not found: {arg}"))
    }

    pub fn load(&self, arg: &str) -> Result<Profile> {
        Profile::load(&self.resolve(arg)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_profiles_parse() {
        for txt in [
            default_profile_text(),
            include_str!("../profiles/bath.toml"),
            include_str!("../profiles/calm.toml"),
        ] {
            let p = Profile::from_toml_str(txt).unwrap();
            assert!(!p.stages.is_empty());
        }
    }

    #[test]
    fn default_profile_is_capture_then_wash() {
        let p = Profile::from_toml_str(default_profile_text()).unwrap();
        let ids: Vec<_> = p.stages.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["capture", "wash"]);
        let TaskConfig::Cadence(c) = &p.stages[1].task else {
            panic!("wash should be a cadence task");
        };
        assert_eq!(c.passes, vec!["soap", "rinse", "dry"]);
        assert_eq!(c.gesture.ideal_interval, Some(1.0));
        assert!(matches!(
            p.stages[1].escalation,
            Some(EscalationConfig::Stillness { countdown, .. }) if countdown == 3.0
        ));
    }

    #[test]
    fn passes_accept_a_count() {
        let p = Profile::from_toml_str(
            r#"
            [[stages]]
            id = "wash"
            [stages.task]
            kind = "cadence"
            passes = 2
            [stages.task.gesture]
            ideal_interval = 0.8
            "#,
        )
        .unwrap();
        let TaskConfig::Cadence(c) = &p.stages[0].task else {
            panic!("expected cadence");
        };
        assert_eq!(c.passes, vec!["pass-1", "pass-2"]);
    }

    #[test]
    fn hold_without_duration_is_rejected() {
        let err = Profile::from_toml_str(
            r#"
            [[stages]]
            id = "place"
            [stages.task]
            kind = "hold"
            "#,
        )
        .unwrap_err();
        let cfg_err = err.downcast_ref::<ConfigError>().unwrap();
        assert_eq!(
            *cfg_err,
            ConfigError::Missing {
                field: "required_duration",
                task: "hold"
            }
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        let cases = [
            (
                r#"[[stages]]
                id = "a"
                [stages.task]
                kind = "hold"
                [stages.task.gesture]
                required_duration = -1.0"#,
                "required_duration",
            ),
            (
                r#"[[stages]]
                id = "a"
                [stages.task]
                kind = "cadence"
                [stages.task.gesture]
                ideal_interval = 1.0
                speed_smoothing_factor = 1.5"#,
                "speed_smoothing_factor",
            ),
            (
                r#"[[stages]]
                id = "a"
                [stages.task]
                kind = "calm"
                initial = 120.0"#,
                "initial",
            ),
        ];
        for (txt, field) in cases {
            let err = Profile::from_toml_str(txt).unwrap_err();
            match err.downcast_ref::<ConfigError>() {
                Some(ConfigError::Invalid { field: f, .. }) => assert_eq!(*f, field),
                other => panic!("unexpected error for {field}: {other:?}"),
            }
        }
    }

    #[test]
    fn structural_errors() {
        let dup = r#"
            [[stages]]
            id = "a"
            [stages.task]
            kind = "capture"
            [[stages]]
            id = "a"
            [stages.task]
            kind = "capture"
        "#;
        let err = Profile::from_toml_str(dup).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::DuplicateStage("a".into()))
        );

        let struggle = r#"
            [[stages]]
            id = "foam"
            struggle_chance_per_second = 0.2
            [stages.task]
            kind = "hold"
            [stages.task.gesture]
            required_duration = 3.0
        "#;
        let err = Profile::from_toml_str(struggle).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::StruggleWithoutEscalation("foam".into()))
        );

        let empty = Profile {
            meta: Meta::default(),
            sequence: SequenceConfig::default(),
            stages: vec![],
        };
        assert_eq!(validate_profile(&empty), Err(ConfigError::EmptySequence));
    }

    #[test]
    fn restart_delay_defaults_to_one_second() {
        let stage = r#"
            [[stages]]
            id = "grab"
            [stages.task]
            kind = "capture"
        "#;
        let p = Profile::from_toml_str(stage).unwrap();
        assert_eq!(p.sequence.restart_delay, DEFAULT_RESTART_DELAY);

        let negative = format!("[sequence]\nrestart_delay = -0.5\n{stage}");
        let err = Profile::from_toml_str(&negative).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Invalid {
                field: "restart_delay",
                ..
            })
        ));
    }

    #[test]
    fn store_installs_lists_and_resolves() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ProfileStore::at(tmp.path().join("profiles"));
        assert!(store.list_profiles().is_empty());

        let path = store.install_default().unwrap();
        assert!(path.is_file());
        fs::write(store.profiles_dir.join("calm.toml"), include_str!("../profiles/calm.toml"))
            .unwrap();
        fs::write(store.profiles_dir.join("notes.txt"), "ignored").unwrap();

        assert_eq!(store.list_profiles(), vec!["calm", "default"]);
        assert_eq!(store.resolve("default").unwrap(), path);
        assert_eq!(store.resolve(path.to_str().unwrap()).unwrap(), path);
        assert!(store.resolve("missing").is_err());
        assert_eq!(store.load("calm").unwrap().stages[0].id, "breathe");
    }
}
