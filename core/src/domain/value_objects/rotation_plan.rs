//! Rotation recommendation produced by the rotation planner.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the operator should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationAction {
    /// No key exists yet
    Initialize,
    /// Current key is still fresh
    Wait,
    /// Current key is due for rotation
    Rotate,
}

/// How soon the action should happen
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationUrgency {
    Low,
    Medium,
    High,
}

impl fmt::Display for RotationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RotationAction::Initialize => "initialize",
            RotationAction::Wait => "wait",
            RotationAction::Rotate => "rotate",
        })
    }
}

impl fmt::Display for RotationUrgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RotationUrgency::Low => "low",
            RotationUrgency::Medium => "medium",
            RotationUrgency::High => "high",
        })
    }
}

/// Recommended rotation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPlan {
    pub action: RotationAction,
    pub urgency: RotationUrgency,
    pub message: String,
    /// Remaining time before rotation is due; only set when waiting
    pub time_until_rotation: Option<Duration>,
}
