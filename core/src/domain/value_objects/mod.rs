//! Value objects representing immutable domain concepts.

pub mod key_summary;
pub mod rotation_plan;

pub use key_summary::{KeySummary, RotatedKey, RotationStatus};
pub use rotation_plan::{RotationAction, RotationPlan, RotationUrgency};
