//! Signing key resolution for the token service

use jsonwebtoken::{DecodingKey, EncodingKey};
use std::fmt;
use tk_shared::SigningAlgorithm;

use crate::domain::entities::{KeyMaterial, KeyRecord};
use crate::errors::{DomainResult, KeyError};

use super::encryption::derive_encryption_key;

/// Everything needed to sign, verify and encrypt with one key generation
#[derive(Clone)]
pub struct SigningMaterial {
    pub key_id: String,
    pub algorithm: SigningAlgorithm,
    pub encoding_key: EncodingKey,
    pub decoding_key: DecodingKey,
    /// AES-256 key derived from the signing secret
    pub encryption_key: [u8; 32],
}

impl fmt::Debug for SigningMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningMaterial")
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl SigningMaterial {
    /// Shared secret material
    pub fn from_secret(key_id: impl Into<String>, secret: &str) -> Self {
        Self {
            key_id: key_id.into(),
            algorithm: SigningAlgorithm::Hs256,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            encryption_key: derive_encryption_key(secret.as_bytes()),
        }
    }

    /// RSA material from PKCS#1 or PKCS#8 PEM text
    pub fn from_rsa_pem(
        key_id: impl Into<String>,
        private_key_pem: &str,
        public_key_pem: &str,
    ) -> DomainResult<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes()).map_err(|e| {
            KeyError::InvalidKeyMaterial {
                message: format!("Invalid private key format: {}", e),
            }
        })?;
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes()).map_err(|e| {
            KeyError::InvalidKeyMaterial {
                message: format!("Invalid public key format: {}", e),
            }
        })?;

        Ok(Self {
            key_id: key_id.into(),
            algorithm: SigningAlgorithm::Rs256,
            encoding_key,
            decoding_key,
            encryption_key: derive_encryption_key(private_key_pem.as_bytes()),
        })
    }

    /// Material of a stored key generation
    pub fn from_record(record: &KeyRecord) -> DomainResult<Self> {
        match &record.material {
            KeyMaterial::Symmetric { secret } => Ok(Self::from_secret(record.id.clone(), secret)),
            KeyMaterial::Asymmetric {
                private_key_pem,
                public_key_pem,
            } => Self::from_rsa_pem(record.id.clone(), private_key_pem, public_key_pem),
        }
    }
}

/// Source of signing and verification keys
///
/// Implemented by the rotating [`KeyManager`](crate::services::keys::KeyManager)
/// and by [`StaticKeyProvider`](super::StaticKeyProvider) for fixed
/// configuration.
pub trait SigningKeyProvider: Send + Sync {
    /// Key to sign new tokens with
    ///
    /// With `key_id` the named key is used, provided it is still accepted
    /// for verification; otherwise the active key.
    fn signing_key(&self, key_id: Option<&str>) -> DomainResult<SigningMaterial>;

    /// Keys to try when verifying, in order: active first, then previous
    /// keys inside their grace window, most recently demoted first
    fn verification_candidates(&self) -> DomainResult<Vec<SigningMaterial>>;
}
