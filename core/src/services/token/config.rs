//! Configuration for the token service

use chrono::Duration;
use tk_shared::JwtConfig;
use tracing::warn;

use crate::errors::{DomainError, DomainResult, KeyError};
use crate::services::secret::SecretPolicy;

/// Configuration for the token service
#[derive(Clone)]
pub struct TokenServiceConfig {
    /// Default token lifetime
    pub access_token_expiry: Duration,
    /// Whether signed tokens are additionally encrypted
    pub enable_encryption: bool,
    /// Dedicated encryption secret; without it the key is derived from the
    /// signing key material
    pub encryption_secret: Option<String>,
    /// Enables extra checks on verified tokens
    pub strict_mode: bool,
    /// Tolerance applied to `exp`, `nbf` and `iat`
    pub max_clock_skew: Duration,
    /// Claims every verified token must carry
    pub required_claims: Vec<String>,
}

impl std::fmt::Debug for TokenServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenServiceConfig")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("enable_encryption", &self.enable_encryption)
            .field("encryption_secret", &self.encryption_secret.as_ref().map(|_| "<redacted>"))
            .field("strict_mode", &self.strict_mode)
            .field("max_clock_skew", &self.max_clock_skew)
            .field("required_claims", &self.required_claims)
            .finish()
    }
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self {
            access_token_expiry: Duration::minutes(30),
            enable_encryption: false,
            encryption_secret: None,
            strict_mode: true,
            max_clock_skew: Duration::seconds(300),
            required_claims: Vec::new(),
        }
    }
}

impl TokenServiceConfig {
    /// Derives the token settings, rejecting out-of-range durations
    pub fn from_jwt_config(config: &JwtConfig) -> DomainResult<Self> {
        config.validate()?;
        Ok(Self {
            access_token_expiry: duration_setting(
                "JWT_EXPIRE_MINUTES",
                Duration::try_minutes(config.access_token_expiry_minutes),
            )?,
            enable_encryption: config.enable_encryption,
            encryption_secret: config.encryption_secret.clone().filter(|s| !s.is_empty()),
            strict_mode: config.strict_mode,
            max_clock_skew: duration_setting(
                "JWT_MAX_CLOCK_SKEW",
                Duration::try_seconds(config.max_clock_skew_seconds),
            )?,
            required_claims: config.required_claims.clone(),
        })
    }

    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.access_token_expiry = expiry;
        self
    }

    pub fn with_encryption(mut self, enabled: bool) -> Self {
        self.enable_encryption = enabled;
        self
    }

    pub fn with_encryption_secret(mut self, secret: impl Into<String>) -> Self {
        self.enable_encryption = true;
        self.encryption_secret = Some(secret.into());
        self
    }

    pub fn with_required_claims<I, S>(mut self, claims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_claims = claims.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_clock_skew(mut self, skew: Duration) -> Self {
        self.max_clock_skew = skew;
        self
    }

    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }
}

/// Startup check of the configured shared secrets
///
/// In strict mode a secret that fails the policy is an error; otherwise the
/// failure is logged and startup continues. Strict mode also logs the
/// configuration advisories.
pub fn validate_configured_secrets(config: &JwtConfig) -> DomainResult<()> {
    if config.algorithm.is_symmetric() {
        let policy = SecretPolicy::new(config.strict_mode);
        let secrets = [
            ("JWT_SECRET", Some(config.secret.as_str())),
            ("JWT_SECRET_PREVIOUS", config.previous_secret.as_deref()),
        ];

        for (name, secret) in secrets {
            let Some(secret) = secret.filter(|s| !s.is_empty()) else {
                continue;
            };
            let report = policy.validate(secret);
            if report.valid {
                continue;
            }

            let reasons = if config.strict_mode {
                report.reasons
            } else {
                report.hard_failures().to_vec()
            };
            if reasons.is_empty() {
                continue;
            }
            if config.strict_mode {
                return Err(KeyError::ValidationFailed { reasons }.into());
            }
            warn!(setting = name, reasons = %reasons.join("; "), "Configured secret is weak");
        }
    }

    for advisory in config.advisories() {
        warn!(advisory = %advisory, "Security advisory");
    }
    Ok(())
}

pub(crate) fn duration_setting(key: &str, duration: Option<Duration>) -> DomainResult<Duration> {
    duration.ok_or_else(|| DomainError::Validation {
        message: format!("{} is out of range", key),
    })
}
