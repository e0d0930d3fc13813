//! Shared configuration for TokenKeep
//!
//! This crate provides the configuration surface consumed by the core
//! token/key services and the command-line tool:
//! - Token signing, encryption and rotation settings
//! - Deployment environment and logging settings

pub mod config;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, ConfigError, Environment, JwtConfig, LogFormat, LoggingConfig, SigningAlgorithm,
};
