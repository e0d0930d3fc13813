//! Error types for key management, token handling and key persistence

use thiserror::Error;

/// Key lifecycle errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Key not found: {key_id}")]
    KeyNotFound { key_id: String },

    #[error("Secret validation failed: {}", reasons.join("; "))]
    ValidationFailed { reasons: Vec<String> },

    #[error("No active signing key")]
    NoActiveKey,

    #[error("Key generation failed: {message}")]
    KeyGenerationFailed { message: String },

    #[error("Invalid key material: {message}")]
    InvalidKeyMaterial { message: String },
}

/// Token issuance and verification errors
///
/// Only `VerificationFailed` and `TokenGenerationFailed` leave the token
/// service; the remaining variants describe why a single candidate failed
/// and are used for internal diagnostics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token verification failed")]
    VerificationFailed,

    #[error("Token decryption failed")]
    DecryptionFailed,

    #[error("Token timestamp outside tolerated clock skew: {claim}")]
    ClockSkewExceeded { claim: String },

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid token format")]
    InvalidTokenFormat,

    #[error("Missing claim: {claim}")]
    MissingClaim { claim: String },

    #[error("Token generation failed")]
    TokenGenerationFailed,

    #[error("Token encryption failed")]
    EncryptionFailed,
}

impl TokenError {
    /// Whether the error belongs to the verification failure family
    pub fn is_verification_failure(&self) -> bool {
        !matches!(
            self,
            TokenError::TokenGenerationFailed | TokenError::EncryptionFailed
        )
    }
}

/// Key store persistence errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Key store I/O failed: {message}")]
    Io { message: String, transient: bool },

    #[error("Key store is corrupt: {message}")]
    Corrupt { message: String },

    #[error("Key store serialization failed: {message}")]
    Serialization { message: String },
}

impl PersistenceError {
    /// Whether retrying the operation may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, PersistenceError::Io { transient: true, .. })
    }
}
