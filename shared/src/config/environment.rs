//! Deployment environment
//!
//! The environment picks the `.env.<name>` overlay loaded by the CLI, the
//! default logging settings, and whether secret strictness may be relaxed.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

use super::ConfigError;

/// Variable naming the deployment environment
pub const ENVIRONMENT_VAR: &str = "TOKENKEEP_ENV";

/// Deployment environment the key tooling runs in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    /// Reads `TOKENKEEP_ENV`; unset means development
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var(ENVIRONMENT_VAR) {
            Ok(value) if !value.trim().is_empty() => value.parse(),
            _ => Ok(Environment::default()),
        }
    }

    /// Name of the dotenv overlay for this environment
    pub fn env_file(&self) -> String {
        format!(".env.{}", self.as_str())
    }

    /// Production never accepts secrets that fail the strict policy
    pub fn allows_relaxed_secrets(&self) -> bool {
        !self.is_production()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ConfigError::InvalidValue {
                key: ENVIRONMENT_VAR.to_string(),
                message: format!("unknown environment '{}'", other),
            }),
        }
    }
}
