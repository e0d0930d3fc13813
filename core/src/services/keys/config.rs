//! Configuration for the key manager

use chrono::Duration;
use tk_shared::{JwtConfig, SigningAlgorithm};

use crate::errors::DomainResult;
use crate::services::secret::SecretPolicy;
use crate::services::token::duration_setting;

/// Default length of generated symmetric secrets
pub const DEFAULT_SECRET_LENGTH: usize = 64;

/// Configuration for the key manager
#[derive(Debug, Clone)]
pub struct KeyManagerConfig {
    /// How long a demoted key keeps verifying tokens
    pub grace_period: Duration,
    /// Age at which the active key is due for rotation
    pub rotation_interval: Duration,
    /// Algorithm used when a caller does not name one
    pub default_algorithm: SigningAlgorithm,
    /// Length of generated symmetric secrets when a caller does not name one
    pub default_secret_length: usize,
    /// Policy every generated symmetric secret must pass
    pub secret_policy: SecretPolicy,
}

impl Default for KeyManagerConfig {
    fn default() -> Self {
        Self {
            grace_period: Duration::hours(24),
            rotation_interval: Duration::days(30),
            default_algorithm: SigningAlgorithm::Hs256,
            default_secret_length: DEFAULT_SECRET_LENGTH,
            secret_policy: SecretPolicy::default(),
        }
    }
}

impl KeyManagerConfig {
    /// Derives the key manager settings, rejecting out-of-range durations
    pub fn from_jwt_config(config: &JwtConfig) -> DomainResult<Self> {
        config.validate()?;
        Ok(Self {
            grace_period: duration_setting(
                "JWT_KEY_ROTATION_GRACE_HOURS",
                Duration::try_hours(config.grace_period_hours),
            )?,
            rotation_interval: duration_setting(
                "JWT_KEY_ROTATION_INTERVAL_DAYS",
                Duration::try_days(config.rotation_interval_days),
            )?,
            default_algorithm: config.algorithm,
            default_secret_length: DEFAULT_SECRET_LENGTH,
            secret_policy: SecretPolicy::new(config.strict_mode),
        })
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }
}
