//! Rotation recommendations from the age of the active key

use chrono::Duration;

use crate::domain::value_objects::{RotationAction, RotationPlan, RotationStatus, RotationUrgency};

/// Recommends the next rotation step
///
/// * no active key: initialize (high urgency, nothing can be signed)
/// * age at or past `interval + grace`: rotate, high urgency
/// * age at or past `interval`: rotate, medium urgency
/// * otherwise: wait, with the time left until rotation is due
pub fn plan_rotation(active_key_age: Option<Duration>, interval: Duration, grace: Duration) -> RotationPlan {
    let age = match active_key_age {
        Some(age) => age,
        None => {
            return RotationPlan {
                action: RotationAction::Initialize,
                urgency: RotationUrgency::High,
                message: "No active key found. Generate and activate a key first.".to_string(),
                time_until_rotation: None,
            }
        }
    };

    if age >= interval + grace {
        return RotationPlan {
            action: RotationAction::Rotate,
            urgency: RotationUrgency::High,
            message: format!(
                "Active key is {} old, past the rotation interval and grace period. Rotate now.",
                format_duration(age)
            ),
            time_until_rotation: None,
        };
    }

    if age >= interval {
        return RotationPlan {
            action: RotationAction::Rotate,
            urgency: RotationUrgency::Medium,
            message: format!(
                "Active key is {} old. Rotation recommended.",
                format_duration(age)
            ),
            time_until_rotation: None,
        };
    }

    let remaining = interval - age;
    RotationPlan {
        action: RotationAction::Wait,
        urgency: RotationUrgency::Low,
        message: format!("Key rotation due in {}", format_duration(remaining)),
        time_until_rotation: Some(remaining),
    }
}

/// Plan for a key manager snapshot
pub fn plan_rotation_for(status: &RotationStatus, interval: Duration) -> RotationPlan {
    plan_rotation(status.active_key_age, interval, status.grace_period)
}

/// Renders a duration as days and hours, e.g. `3d 4h`
pub fn format_duration(duration: Duration) -> String {
    let total_hours = duration.num_hours().max(0);
    let days = total_hours / 24;
    let hours = total_hours % 24;
    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h", hours)
    } else {
        format!("{}m", duration.num_minutes().max(0))
    }
}
