//! Token service module
//!
//! This module handles all token-related operations including:
//! - Token issuance with the active (or a named) key
//! - Verification against the active key and previous keys in their grace period
//! - Optional AES-256-GCM encryption of signed tokens
//! - Key resolution from a key manager or from static configuration

mod config;
mod encryption;
mod key_provider;
mod service;
mod static_keys;

#[cfg(test)]
mod tests;

pub(crate) use config::duration_setting;
pub use config::{validate_configured_secrets, TokenServiceConfig};
pub use encryption::{decrypt_token, derive_encryption_key, encrypt_token};
pub use key_provider::{SigningKeyProvider, SigningMaterial};
pub use service::TokenService;
pub use static_keys::{static_key_id, StaticKeyProvider};
