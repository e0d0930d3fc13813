//! Secret-free views of the key store.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tk_shared::SigningAlgorithm;

use crate::domain::entities::KeyStatus;

/// Listing entry for one key generation, without its material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySummary {
    pub id: String,
    pub algorithm: SigningAlgorithm,
    pub status: KeyStatus,
    pub created_at: DateTime<Utc>,
    pub activated_at: Option<DateTime<Utc>>,
    pub demoted_at: Option<DateTime<Utc>>,
    pub rotation_count: u32,
}

/// Result of a rotation
///
/// Carries the new secret so the caller can hand it to an operator.
/// `Debug` never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct RotatedKey {
    pub key_id: String,
    pub algorithm: SigningAlgorithm,
    pub secret: String,
    /// Key that was active before the rotation, if any
    pub previous_key_id: Option<String>,
}

impl std::fmt::Debug for RotatedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatedKey")
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm)
            .field("previous_key_id", &self.previous_key_id)
            .finish_non_exhaustive()
    }
}

/// Point-in-time rotation snapshot of a key manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationStatus {
    pub active_key_id: Option<String>,
    /// Time since the active key was first activated
    pub active_key_age: Option<Duration>,
    /// Most recently demoted key still inside its grace window
    pub previous_key_id: Option<String>,
    pub previous_grace_remaining: Option<Duration>,
    pub total_keys: usize,
    /// Keys that are not the active key (pending, previous or retired)
    pub inactive_keys: usize,
    /// Total rotations recorded across all keys
    pub rotation_count: u32,
    pub grace_period: Duration,
}

impl RotationStatus {
    pub fn has_active_key(&self) -> bool {
        self.active_key_id.is_some()
    }
}
