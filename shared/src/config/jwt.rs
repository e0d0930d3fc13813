//! Token signing and key rotation configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;

use super::ConfigError;

/// Default key storage file, relative to the working directory
pub const DEFAULT_KEY_STORAGE_PATH: &str = ".jwt_keys.json";

/// Longest accepted token lifetime (one year)
pub const MAX_EXPIRY_MINUTES: i64 = 60 * 24 * 365;
/// Longest accepted rotation grace period (one year)
pub const MAX_GRACE_PERIOD_HOURS: i64 = 24 * 365;
/// Longest accepted rotation interval (ten years)
pub const MAX_ROTATION_INTERVAL_DAYS: i64 = 3650;
/// Largest accepted clock skew tolerance (one hour)
pub const MAX_CLOCK_SKEW_SECONDS: i64 = 3600;

/// Signing algorithm family used for tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum SigningAlgorithm {
    /// Symmetric HMAC-SHA256
    #[serde(rename = "HS256")]
    Hs256,
    /// Asymmetric RSA-SHA256
    #[serde(rename = "RS256")]
    Rs256,
}

impl SigningAlgorithm {
    /// Canonical JOSE name of the algorithm
    pub fn as_str(&self) -> &'static str {
        match self {
            SigningAlgorithm::Hs256 => "HS256",
            SigningAlgorithm::Rs256 => "RS256",
        }
    }

    /// Whether the algorithm uses a shared secret
    pub fn is_symmetric(&self) -> bool {
        matches!(self, SigningAlgorithm::Hs256)
    }
}

impl Default for SigningAlgorithm {
    fn default() -> Self {
        SigningAlgorithm::Hs256
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SigningAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "HS256" => Ok(SigningAlgorithm::Hs256),
            "RS256" => Ok(SigningAlgorithm::Rs256),
            other => Err(ConfigError::InvalidValue {
                key: "JWT_ALGORITHM".to_string(),
                message: format!("unsupported algorithm '{}', only HS256 and RS256 are supported", other),
            }),
        }
    }
}

/// Token issuance, verification and rotation settings
///
/// Secrets are never serialized and are redacted from `Debug` output.
#[derive(Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// Algorithm used when no key manager dictates one
    #[serde(default)]
    pub algorithm: SigningAlgorithm,

    /// Primary signing secret (HS256 static mode)
    #[serde(default, skip_serializing)]
    pub secret: String,

    /// Previous signing secret kept for verification during a manual rotation
    #[serde(default, skip_serializing)]
    pub previous_secret: Option<String>,

    /// PEM private key path (RS256 static mode)
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,

    /// PEM public key path (RS256 static mode)
    #[serde(default)]
    pub public_key_path: Option<PathBuf>,

    /// Wrap signed tokens in an authenticated-encryption layer
    #[serde(default)]
    pub enable_encryption: bool,

    /// Dedicated encryption secret; derived from the signing key when absent
    #[serde(default, skip_serializing)]
    pub encryption_secret: Option<String>,

    /// Access token lifetime in minutes
    #[serde(default = "default_expiry_minutes")]
    pub access_token_expiry_minutes: i64,

    /// How long a demoted key keeps verifying tokens, in hours
    #[serde(default = "default_grace_period_hours")]
    pub grace_period_hours: i64,

    /// Recommended age of the active key before rotation, in days
    #[serde(default = "default_rotation_interval_days")]
    pub rotation_interval_days: i64,

    /// Turn secret-policy warnings into hard failures
    #[serde(default = "default_strict_mode")]
    pub strict_mode: bool,

    /// Maximum tolerated difference between token timestamps and local time
    #[serde(default = "default_max_clock_skew")]
    pub max_clock_skew_seconds: i64,

    /// Where the key manager persists its key store
    #[serde(default = "default_key_storage_path")]
    pub key_storage_path: PathBuf,

    /// Claims every verified token must carry
    #[serde(default)]
    pub required_claims: Vec<String>,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            algorithm: SigningAlgorithm::default(),
            secret: String::new(),
            previous_secret: None,
            private_key_path: None,
            public_key_path: None,
            enable_encryption: false,
            encryption_secret: None,
            access_token_expiry_minutes: default_expiry_minutes(),
            grace_period_hours: default_grace_period_hours(),
            rotation_interval_days: default_rotation_interval_days(),
            strict_mode: default_strict_mode(),
            max_clock_skew_seconds: default_max_clock_skew(),
            key_storage_path: default_key_storage_path(),
            required_claims: Vec::new(),
        }
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("algorithm", &self.algorithm)
            .field("secret", &redacted(!self.secret.is_empty()))
            .field("previous_secret", &redacted(self.previous_secret.is_some()))
            .field("private_key_path", &self.private_key_path)
            .field("public_key_path", &self.public_key_path)
            .field("enable_encryption", &self.enable_encryption)
            .field("encryption_secret", &redacted(self.encryption_secret.is_some()))
            .field("access_token_expiry_minutes", &self.access_token_expiry_minutes)
            .field("grace_period_hours", &self.grace_period_hours)
            .field("rotation_interval_days", &self.rotation_interval_days)
            .field("strict_mode", &self.strict_mode)
            .field("max_clock_skew_seconds", &self.max_clock_skew_seconds)
            .field("key_storage_path", &self.key_storage_path)
            .field("required_claims", &self.required_claims)
            .finish()
    }
}

impl JwtConfig {
    /// Create a new configuration with a primary secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Load configuration from `JWT_*` environment variables
    ///
    /// Unset variables fall back to defaults; malformed numbers fall back as
    /// well, while an unsupported algorithm is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let algorithm = match env::var("JWT_ALGORITHM") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.algorithm,
        };

        let config = Self {
            algorithm,
            secret: env::var("JWT_SECRET").unwrap_or_default(),
            previous_secret: non_empty_var("JWT_SECRET_PREVIOUS"),
            private_key_path: non_empty_var("JWT_PRIVATE_KEY_PATH").map(PathBuf::from),
            public_key_path: non_empty_var("JWT_PUBLIC_KEY_PATH").map(PathBuf::from),
            enable_encryption: bool_var("JWT_ENABLE_JWE", false),
            encryption_secret: non_empty_var("JWT_ENCRYPTION_SECRET"),
            access_token_expiry_minutes: number_var(
                "JWT_EXPIRE_MINUTES",
                defaults.access_token_expiry_minutes,
            ),
            grace_period_hours: number_var(
                "JWT_KEY_ROTATION_GRACE_HOURS",
                defaults.grace_period_hours,
            ),
            rotation_interval_days: number_var(
                "JWT_KEY_ROTATION_INTERVAL_DAYS",
                defaults.rotation_interval_days,
            ),
            strict_mode: bool_var("JWT_STRICT_MODE", defaults.strict_mode),
            max_clock_skew_seconds: number_var(
                "JWT_MAX_CLOCK_SKEW",
                defaults.max_clock_skew_seconds,
            ),
            key_storage_path: non_empty_var("JWT_KEY_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.key_storage_path),
            required_claims: non_empty_var("JWT_REQUIRED_CLAIMS")
                .map(|value| {
                    value
                        .split(',')
                        .map(|claim| claim.trim().to_string())
                        .filter(|claim| !claim.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that every numeric setting is within its accepted range
    ///
    /// Lifetime and rotation interval must be positive; grace period and
    /// clock skew may be zero. All are bounded above.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range(
            "JWT_EXPIRE_MINUTES",
            self.access_token_expiry_minutes,
            1,
            MAX_EXPIRY_MINUTES,
        )?;
        check_range(
            "JWT_KEY_ROTATION_GRACE_HOURS",
            self.grace_period_hours,
            0,
            MAX_GRACE_PERIOD_HOURS,
        )?;
        check_range(
            "JWT_KEY_ROTATION_INTERVAL_DAYS",
            self.rotation_interval_days,
            1,
            MAX_ROTATION_INTERVAL_DAYS,
        )?;
        check_range(
            "JWT_MAX_CLOCK_SKEW",
            self.max_clock_skew_seconds,
            0,
            MAX_CLOCK_SKEW_SECONDS,
        )
    }

    /// Set the previous secret used during a manual rotation
    pub fn with_previous_secret(mut self, secret: impl Into<String>) -> Self {
        self.previous_secret = Some(secret.into());
        self
    }

    /// Set the access token lifetime in minutes
    pub fn with_expiry_minutes(mut self, minutes: i64) -> Self {
        self.access_token_expiry_minutes = minutes;
        self
    }

    /// Set the rotation grace period in hours
    pub fn with_grace_period_hours(mut self, hours: i64) -> Self {
        self.grace_period_hours = hours;
        self
    }

    /// Enable or disable the encrypted token mode
    pub fn with_encryption(mut self, enabled: bool) -> Self {
        self.enable_encryption = enabled;
        self
    }

    /// Enable or disable strict mode
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Set the tolerated clock skew in seconds
    pub fn with_max_clock_skew_seconds(mut self, seconds: i64) -> Self {
        self.max_clock_skew_seconds = seconds;
        self
    }

    /// Set the key storage path
    pub fn with_key_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_storage_path = path.into();
        self
    }

    /// Whether a previous secret is configured for verification
    pub fn key_rotation_enabled(&self) -> bool {
        self.previous_secret.as_deref().map_or(false, |s| !s.is_empty())
    }

    /// Runtime advisories for settings that are allowed but discouraged
    ///
    /// Only reported in strict mode; callers decide how to surface them.
    pub fn advisories(&self) -> Vec<String> {
        if !self.strict_mode {
            return Vec::new();
        }

        let mut advisories = Vec::new();
        if self.algorithm.is_symmetric() && !self.secret.is_empty() && self.secret.len() < 64 {
            advisories.push("consider using a longer signing secret (64+ characters)".to_string());
        }
        if !self.enable_encryption {
            advisories.push("token encryption is disabled; consider enabling it for sensitive claims".to_string());
        }
        if self.access_token_expiry_minutes > 60 {
            advisories.push("token lifetime exceeds one hour; consider shorter lifetimes".to_string());
        }
        advisories
    }
}

fn redacted(present: bool) -> &'static str {
    if present {
        "<redacted>"
    } else {
        "<unset>"
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn bool_var(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes"),
        Err(_) => default,
    }
}

fn check_range(key: &str, value: i64, min: i64, max: i64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{} is outside the accepted range {}..={}", value, min, max),
        })
    }
}

fn number_var(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn default_expiry_minutes() -> i64 {
    30
}

fn default_grace_period_hours() -> i64 {
    24
}

fn default_rotation_interval_days() -> i64 {
    30
}

fn default_strict_mode() -> bool {
    true
}

fn default_max_clock_skew() -> i64 {
    300 // 5 minutes
}

fn default_key_storage_path() -> PathBuf {
    PathBuf::from(DEFAULT_KEY_STORAGE_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_config_default() {
        let config = JwtConfig::default();
        assert_eq!(config.algorithm, SigningAlgorithm::Hs256);
        assert_eq!(config.access_token_expiry_minutes, 30);
        assert_eq!(config.grace_period_hours, 24);
        assert_eq!(config.max_clock_skew_seconds, 300);
        assert!(config.strict_mode);
        assert!(!config.key_rotation_enabled());
        assert_eq!(config.key_storage_path, PathBuf::from(DEFAULT_KEY_STORAGE_PATH));
    }

    #[test]
    fn test_jwt_config_builder() {
        let config = JwtConfig::new("primary")
            .with_previous_secret("older")
            .with_expiry_minutes(10)
            .with_grace_period_hours(2)
            .with_encryption(true);

        assert!(config.key_rotation_enabled());
        assert_eq!(config.access_token_expiry_minutes, 10);
        assert_eq!(config.grace_period_hours, 2);
        assert!(config.enable_encryption);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = JwtConfig::new("super-sensitive-value").with_previous_secret("another-one");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-sensitive-value"));
        assert!(!rendered.contains("another-one"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_serialize_skips_secrets() {
        let config = JwtConfig::new("super-sensitive-value");
        let toml = toml::to_string(&config).unwrap();
        assert!(!toml.contains("super-sensitive-value"));
        assert!(toml.contains("HS256"));
    }

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!("hs256".parse::<SigningAlgorithm>().unwrap(), SigningAlgorithm::Hs256);
        assert_eq!("RS256".parse::<SigningAlgorithm>().unwrap(), SigningAlgorithm::Rs256);
        assert!("ES256".parse::<SigningAlgorithm>().is_err());
    }

    #[test]
    fn test_validate_accepts_defaults_and_bounds() {
        assert!(JwtConfig::default().validate().is_ok());

        let edges = JwtConfig::new("x")
            .with_expiry_minutes(MAX_EXPIRY_MINUTES)
            .with_grace_period_hours(0)
            .with_max_clock_skew_seconds(0);
        assert!(edges.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let cases = [
            JwtConfig::new("x").with_expiry_minutes(0),
            JwtConfig::new("x").with_expiry_minutes(MAX_EXPIRY_MINUTES + 1),
            JwtConfig::new("x").with_grace_period_hours(-1),
            JwtConfig::new("x").with_grace_period_hours(i64::MAX / 1000),
            JwtConfig::new("x").with_max_clock_skew_seconds(-30),
            JwtConfig {
                rotation_interval_days: 0,
                ..JwtConfig::default()
            },
        ];

        for config in cases {
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidValue { .. })),
                "{:?}",
                config
            );
        }
    }

    #[test]
    fn test_advisories_only_in_strict_mode() {
        let config = JwtConfig::new("short").with_expiry_minutes(120);
        assert_eq!(config.advisories().len(), 3);

        let relaxed = config.with_strict_mode(false);
        assert!(relaxed.advisories().is_empty());
    }
}
