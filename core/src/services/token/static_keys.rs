//! Fixed key configuration for deployments without a key store

use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tk_shared::{JwtConfig, SigningAlgorithm};

use crate::errors::{DomainError, DomainResult, KeyError};

use super::key_provider::{SigningKeyProvider, SigningMaterial};

/// Key provider over statically configured keys
///
/// Holds a current key and, for manual rotation, an optional previous key
/// that is still accepted for verification. Key ids are the first 16 hex
/// characters of the SHA-256 of the secret (or of the public key).
#[derive(Clone)]
pub struct StaticKeyProvider {
    current: SigningMaterial,
    previous: Option<SigningMaterial>,
}

impl std::fmt::Debug for StaticKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticKeyProvider")
            .field("current", &self.current.key_id)
            .field("previous", &self.previous.as_ref().map(|m| &m.key_id))
            .finish()
    }
}

impl StaticKeyProvider {
    /// Shared secret with an optional previous secret
    pub fn from_secrets(secret: &str, previous_secret: Option<&str>) -> DomainResult<Self> {
        if secret.is_empty() {
            return Err(KeyError::InvalidKeyMaterial {
                message: "signing secret is empty".to_string(),
            }
            .into());
        }

        let previous = previous_secret
            .filter(|previous| !previous.is_empty() && *previous != secret)
            .map(|previous| SigningMaterial::from_secret(static_key_id(previous.as_bytes()), previous));

        Ok(Self {
            current: SigningMaterial::from_secret(static_key_id(secret.as_bytes()), secret),
            previous,
        })
    }

    /// RSA key pair from PEM strings (useful for testing or embedded keys)
    pub fn from_rsa_pem(private_key_pem: &str, public_key_pem: &str) -> DomainResult<Self> {
        let key_id = static_key_id(public_key_pem.trim().as_bytes());
        Ok(Self {
            current: SigningMaterial::from_rsa_pem(key_id, private_key_pem, public_key_pem)?,
            previous: None,
        })
    }

    /// RSA key pair from PEM files
    pub fn from_rsa_files<P: AsRef<Path>>(private_key_path: P, public_key_path: P) -> DomainResult<Self> {
        let private_key_pem = fs::read_to_string(private_key_path.as_ref()).map_err(|e| {
            KeyError::InvalidKeyMaterial {
                message: format!("Failed to read private key: {}", e),
            }
        })?;
        let public_key_pem = fs::read_to_string(public_key_path.as_ref()).map_err(|e| {
            KeyError::InvalidKeyMaterial {
                message: format!("Failed to read public key: {}", e),
            }
        })?;

        Self::from_rsa_pem(&private_key_pem, &public_key_pem)
    }

    /// Provider for the configured algorithm
    pub fn from_jwt_config(config: &JwtConfig) -> DomainResult<Self> {
        match config.algorithm {
            SigningAlgorithm::Hs256 => {
                Self::from_secrets(&config.secret, config.previous_secret.as_deref())
            }
            SigningAlgorithm::Rs256 => match (&config.private_key_path, &config.public_key_path) {
                (Some(private_key_path), Some(public_key_path)) => {
                    Self::from_rsa_files(private_key_path, public_key_path)
                }
                _ => Err(DomainError::Validation {
                    message: "RS256 requires JWT_PRIVATE_KEY_PATH and JWT_PUBLIC_KEY_PATH".to_string(),
                }),
            },
        }
    }

    pub fn current_key_id(&self) -> &str {
        &self.current.key_id
    }

    pub fn previous_key_id(&self) -> Option<&str> {
        self.previous.as_ref().map(|material| material.key_id.as_str())
    }
}

impl SigningKeyProvider for StaticKeyProvider {
    fn signing_key(&self, key_id: Option<&str>) -> DomainResult<SigningMaterial> {
        match key_id {
            None => Ok(self.current.clone()),
            Some(key_id) => std::iter::once(&self.current)
                .chain(self.previous.as_ref())
                .find(|material| material.key_id == key_id)
                .cloned()
                .ok_or_else(|| {
                    KeyError::KeyNotFound {
                        key_id: key_id.to_string(),
                    }
                    .into()
                }),
        }
    }

    fn verification_candidates(&self) -> DomainResult<Vec<SigningMaterial>> {
        Ok(std::iter::once(self.current.clone())
            .chain(self.previous.clone())
            .collect())
    }
}

/// Key id derived from key material
pub fn static_key_id(material: &[u8]) -> String {
    let digest = hex::encode(Sha256::digest(material));
    digest[..16].to_string()
}
