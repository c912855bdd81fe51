//! Failure taxonomy and configuration errors.

use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Raised while building tasks or a sequence from configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} is required for {task} tasks")]
    Missing {
        field: &'static str,
        task: &'static str,
    },
    #[error("{field} must be {expected}, got {value}")]
    Invalid {
        field: &'static str,
        expected: &'static str,
        value: f32,
    },
    #[error("sequence has no stages")]
    EmptySequence,
    #[error("stage id must not be empty")]
    EmptyStageId,
    #[error("duplicate stage id '{0}'")]
    DuplicateStage(String),
    #[error("stage '{0}' sets struggle_chance_per_second but has no escalation")]
    StruggleWithoutEscalation(String),
}

impl ConfigError {
    pub(crate) fn positive(field: &'static str, value: f32) -> Result<f32, ConfigError> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(ConfigError::Invalid {
                field,
                expected: "a positive number",
                value,
            })
        }
    }

    pub(crate) fn non_negative(field: &'static str, value: f32) -> Result<f32, ConfigError> {
        if value.is_finite() && value >= 0.0 {
            Ok(value)
        } else {
            Err(ConfigError::Invalid {
                field,
                expected: "zero or positive",
                value,
            })
        }
    }

    pub(crate) fn unit(field: &'static str, value: f32) -> Result<f32, ConfigError> {
        if (0.0..=1.0).contains(&value) {
            Ok(value)
        } else {
            Err(ConfigError::Invalid {
                field,
                expected: "within [0, 1]",
                value,
            })
        }
    }
}

/// How far a failure reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailCategory {
    /// Consumes one slip; the stage is retried while budget remains.
    Slip,
    /// Restarts the current stage without touching the slip budget.
    Stage,
    /// Restarts the whole sequence.
    Sequence,
}

/// Why a task or challenge failed. The message is for people; control flow
/// only looks at [`FailReason::category`].
#[derive(Debug, Clone, PartialEq)]
pub enum FailReason {
    TooFast,
    ReleasedEarly,
    DoubleClick,
    Spam,
    Overwhelmed,
    TimeExpired,
    Panicked,
}

impl FailReason {
    pub fn category(&self) -> FailCategory {
        match self {
            FailReason::TimeExpired => FailCategory::Stage,
            FailReason::Panicked => FailCategory::Sequence,
            _ => FailCategory::Slip,
        }
    }
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailReason::TooFast => f.write_str("moved too fast"),
            FailReason::ReleasedEarly => f.write_str("released too early"),
            FailReason::DoubleClick => f.write_str("clicked too fast"),
            FailReason::Spam => f.write_str("clicked too often"),
            FailReason::Overwhelmed => f.write_str("anxiety overwhelmed"),
            FailReason::TimeExpired => f.write_str("time expired"),
            FailReason::Panicked => f.write_str("reacted during the escape"),
        }
    }
}

impl Serialize for FailReason {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_reason_has_a_distinct_message() {
        let reasons = [
            FailReason::TooFast,
            FailReason::ReleasedEarly,
            FailReason::DoubleClick,
            FailReason::Spam,
            FailReason::Overwhelmed,
            FailReason::TimeExpired,
            FailReason::Panicked,
        ];
        let mut msgs: Vec<String> = reasons.iter().map(|r| r.to_string()).collect();
        msgs.sort();
        msgs.dedup();
        assert_eq!(msgs.len(), reasons.len());
    }

    #[test]
    fn categories() {
        assert_eq!(FailReason::TooFast.category(), FailCategory::Slip);
        assert_eq!(FailReason::Spam.category(), FailCategory::Slip);
        assert_eq!(FailReason::Overwhelmed.category(), FailCategory::Slip);
        assert_eq!(FailReason::TimeExpired.category(), FailCategory::Stage);
        assert_eq!(FailReason::Panicked.category(), FailCategory::Sequence);
    }
}
