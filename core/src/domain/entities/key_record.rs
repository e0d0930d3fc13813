//! Key generation record: one secret (or key pair) and its lifecycle state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tk_shared::SigningAlgorithm;

use crate::domain::value_objects::KeySummary;

/// Lifecycle state of a key generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    /// Generated but never used for signing
    Pending,
    /// The single key used for new signatures
    Active,
    /// Superseded, still accepted for verification during the grace window
    Previous,
    /// Superseded and outside the grace window
    Retired,
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            KeyStatus::Pending => "pending",
            KeyStatus::Active => "active",
            KeyStatus::Previous => "previous",
            KeyStatus::Retired => "retired",
        };
        f.write_str(label)
    }
}

/// Secret material of a key generation
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KeyMaterial {
    /// Shared secret for MAC based signing
    Symmetric { secret: String },
    /// PEM encoded RSA key pair
    Asymmetric {
        private_key_pem: String,
        public_key_pem: String,
    },
}

impl KeyMaterial {
    /// The value an operator must protect: the shared secret or the private key
    pub fn secret(&self) -> &str {
        match self {
            KeyMaterial::Symmetric { secret } => secret,
            KeyMaterial::Asymmetric { private_key_pem, .. } => private_key_pem,
        }
    }

    /// Whether the material fits the given algorithm
    pub fn matches(&self, algorithm: SigningAlgorithm) -> bool {
        matches!(
            (self, algorithm),
            (KeyMaterial::Symmetric { .. }, SigningAlgorithm::Hs256)
                | (KeyMaterial::Asymmetric { .. }, SigningAlgorithm::Rs256)
        )
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMaterial::Symmetric { secret } => f
                .debug_struct("Symmetric")
                .field("secret_len", &secret.len())
                .finish(),
            KeyMaterial::Asymmetric { .. } => f.debug_struct("Asymmetric").finish_non_exhaustive(),
        }
    }
}

/// One cryptographic key generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    /// Unique, never reused identifier
    pub id: String,
    /// Secret or key pair
    pub material: KeyMaterial,
    /// Algorithm fixed at generation time
    pub algorithm: SigningAlgorithm,
    /// When the key was generated
    pub created_at: DateTime<Utc>,
    /// First activation; never reset by later re-activation
    pub activated_at: Option<DateTime<Utc>>,
    /// Start of the current grace window
    #[serde(default)]
    pub demoted_at: Option<DateTime<Utc>>,
    /// Lifecycle state
    pub status: KeyStatus,
    /// How many rotations superseded this key
    #[serde(default)]
    pub rotation_count: u32,
}

impl KeyRecord {
    /// Creates a pending record
    pub fn new(
        id: impl Into<String>,
        material: KeyMaterial,
        algorithm: SigningAlgorithm,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            material,
            algorithm,
            created_at,
            activated_at: None,
            demoted_at: None,
            status: KeyStatus::Pending,
            rotation_count: 0,
        }
    }

    /// Whether this is the signing key
    pub fn is_active(&self) -> bool {
        self.status == KeyStatus::Active
    }

    /// Age measured from first activation, or creation if never activated
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.activated_at.unwrap_or(self.created_at)
    }

    /// Instant after which a demoted key stops verifying tokens
    pub fn grace_expires_at(&self, grace_period: Duration) -> Option<DateTime<Utc>> {
        self.demoted_at.map(|demoted| demoted + grace_period)
    }

    /// Whether a demoted key is still accepted for verification at `now`
    ///
    /// The window is inclusive: a token is still accepted at exactly
    /// `demoted_at + grace_period`.
    pub fn is_within_grace(&self, now: DateTime<Utc>, grace_period: Duration) -> bool {
        matches!(self.status, KeyStatus::Previous)
            && self
                .grace_expires_at(grace_period)
                .map_or(false, |expires| now <= expires)
    }

    /// Secret-free view of the record
    pub fn summary(&self) -> KeySummary {
        KeySummary {
            id: self.id.clone(),
            algorithm: self.algorithm,
            status: self.status,
            created_at: self.created_at,
            activated_at: self.activated_at,
            demoted_at: self.demoted_at,
            rotation_count: self.rotation_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> KeyRecord {
        KeyRecord::new(
            "key-1",
            KeyMaterial::Symmetric {
                secret: "s3cr3t-material".to_string(),
            },
            SigningAlgorithm::Hs256,
            Utc::now(),
        )
    }

    #[test]
    fn test_new_record_is_pending() {
        let record = record();
        assert_eq!(record.status, KeyStatus::Pending);
        assert!(record.activated_at.is_none());
        assert!(!record.is_active());
    }

    #[test]
    fn test_age_prefers_activation_time() {
        let mut record = record();
        let now = record.created_at + Duration::days(10);
        assert_eq!(record.age(now), Duration::days(10));

        record.activated_at = Some(record.created_at + Duration::days(4));
        assert_eq!(record.age(now), Duration::days(6));
    }

    #[test]
    fn test_grace_window_is_inclusive() {
        let mut record = record();
        let demoted = record.created_at + Duration::hours(1);
        record.status = KeyStatus::Previous;
        record.demoted_at = Some(demoted);

        let grace = Duration::hours(24);
        assert!(record.is_within_grace(demoted + grace, grace));
        assert!(!record.is_within_grace(demoted + grace + Duration::seconds(1), grace));
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let rendered = format!("{:?}", record());
        assert!(!rendered.contains("s3cr3t-material"));
    }

    #[test]
    fn test_material_matches_algorithm() {
        let material = KeyMaterial::Symmetric {
            secret: "x".to_string(),
        };
        assert!(material.matches(SigningAlgorithm::Hs256));
        assert!(!material.matches(SigningAlgorithm::Rs256));
    }
}
