//! Domain-specific error types and error handling.

mod types;

pub use types::{KeyError, PersistenceError, TokenError};

use thiserror::Error;

/// Message shown to end users for any token rejection
pub const AUTHENTICATION_FAILED_MESSAGE: &str = "Authentication failed";

/// Core domain errors (general purpose)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl DomainError {
    /// Whether the calling code can correct the problem and retry
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DomainError::Validation { .. }
                | DomainError::Key(KeyError::KeyNotFound { .. })
                | DomainError::Key(KeyError::ValidationFailed { .. })
                | DomainError::Key(KeyError::NoActiveKey)
        )
    }

    /// Message safe to hand to an external caller
    ///
    /// Every token verification or decryption failure collapses to the same
    /// text so the response cannot be used as an oracle.
    pub fn public_message(&self) -> String {
        match self {
            DomainError::Token(err) if err.is_verification_failure() => {
                AUTHENTICATION_FAILED_MESSAGE.to_string()
            }
            DomainError::Persistence(_) | DomainError::Internal { .. } => {
                "Internal error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<tk_shared::ConfigError> for DomainError {
    fn from(err: tk_shared::ConfigError) -> Self {
        DomainError::Validation {
            message: err.to_string(),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
