//! # TokenKeep Core
//!
//! Key lifecycle and token logic for TokenKeep.
//! This crate contains the key store entities, the key manager and rotation
//! planner, secret validation, the token service, repository interfaces
//! and error types.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::entities::{
    ClaimSet, KeyMaterial, KeyRecord, KeyStatus, KeyStore, TokenWithMetadata,
};
pub use domain::value_objects::*;
pub use errors::*;
pub use repositories::*;
pub use services::{
    authorize, plan_rotation, plan_rotation_for, validate_configured_secrets, validate_secret,
    Clock, KeyManager, KeyManagerConfig, ManualClock, SecretPolicy, SecretValidationReport,
    SigningKeyProvider, StaticKeyProvider, SystemClock, TokenService, TokenServiceConfig,
};
