//! Configuration module
//!
//! - `environment` - Deployment environment
//! - `jwt` - Token signing, encryption and key rotation configuration
//! - `logging` - Log output settings

pub mod environment;
pub mod jwt;
pub mod logging;

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub use environment::{Environment, ENVIRONMENT_VAR};
pub use jwt::{
    JwtConfig, SigningAlgorithm, DEFAULT_KEY_STORAGE_PATH, MAX_CLOCK_SKEW_SECONDS,
    MAX_EXPIRY_MINUTES, MAX_GRACE_PERIOD_HOURS, MAX_ROTATION_INTERVAL_DAYS,
};
pub use logging::{LogFormat, LoggingConfig};

/// Errors raised while assembling configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Complete configuration for TokenKeep components
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    #[serde(default)]
    pub environment: Environment,

    /// Token and key management configuration
    #[serde(default)]
    pub jwt: JwtConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            environment: env,
            jwt: JwtConfig::default(),
            logging: LoggingConfig::for_environment(env),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = Environment::from_env()?;
        let mut logging = LoggingConfig::for_environment(environment);
        if let Ok(level) = std::env::var("RUST_LOG") {
            logging.level = level;
        }

        let config = Self {
            environment,
            jwt: JwtConfig::from_env()?,
            logging,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the token settings against the deployment environment
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jwt.validate()?;
        if !self.jwt.strict_mode && !self.environment.allows_relaxed_secrets() {
            return Err(ConfigError::InvalidValue {
                key: "JWT_STRICT_MODE".to_string(),
                message: format!("strict mode cannot be disabled in {}", self.environment),
            });
        }
        Ok(())
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_toml_str() {
        let config = AppConfig::from_toml_str(
            r#"
            environment = "production"

            [jwt]
            algorithm = "RS256"
            secret = "from-file"
            grace_period_hours = 48
            key_storage_path = "/var/lib/tokenkeep/keys.json"
            required_claims = ["sub", "role"]

            [logging]
            level = "warn"
            format = "compact"
            "#,
        )
        .unwrap();

        assert!(config.environment.is_production());
        assert_eq!(config.jwt.algorithm, SigningAlgorithm::Rs256);
        assert_eq!(config.jwt.secret, "from-file");
        assert_eq!(config.jwt.grace_period_hours, 48);
        assert_eq!(config.jwt.access_token_expiry_minutes, 30);
        assert_eq!(
            config.jwt.key_storage_path,
            PathBuf::from("/var/lib/tokenkeep/keys.json")
        );
        assert_eq!(config.jwt.required_claims, vec!["sub", "role"]);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert!(config.environment.is_development());
        assert!(config.jwt.strict_mode);
    }

    #[test]
    fn test_out_of_range_toml_value_fails_validation() {
        let config = AppConfig::from_toml_str(
            r#"
            [jwt]
            grace_period_hours = -5
            "#,
        )
        .unwrap();

        assert!(matches!(
            config.jwt.validate(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "JWT_KEY_ROTATION_GRACE_HOURS"
        ));
    }

    #[test]
    fn test_production_rejects_relaxed_secrets() {
        let mut config = AppConfig::from_toml_str(
            r#"
            environment = "production"

            [jwt]
            strict_mode = false
            "#,
        )
        .unwrap();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "JWT_STRICT_MODE"
        ));

        config.environment = Environment::Staging;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_logging_defaults_to_environment_when_omitted() {
        let config = AppConfig::from_toml_str(
            r#"
            [logging]
            level = "info"
            "#,
        )
        .unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = AppConfig::from_file("/definitely/not/here/tokenkeep.toml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
