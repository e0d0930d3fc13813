//! Random secret and key pair generation

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::warn;

use crate::errors::KeyError;

use super::validator::SecretPolicy;

/// Upper bound on regeneration when a random draw fails the policy
pub const MAX_GENERATION_ATTEMPTS: usize = 10;

/// RSA modulus size for asymmetric signing keys
pub const RSA_KEY_BITS: usize = 2048;

/// Generates a URL-safe random secret of exactly `length` characters
///
/// Draws are repeated until one passes `policy`, up to
/// [`MAX_GENERATION_ATTEMPTS`] times.
pub fn generate_secret(length: usize, policy: &SecretPolicy) -> Result<String, KeyError> {
    if length < policy.min_length {
        return Err(KeyError::ValidationFailed {
            reasons: vec![format!(
                "requested length {} is below the minimum of {}",
                length, policy.min_length
            )],
        });
    }

    // 4 base64 characters per 3 bytes, rounded up
    let byte_len = (length * 3 + 3) / 4 + 1;
    let mut last_reasons = Vec::new();

    for attempt in 1..=MAX_GENERATION_ATTEMPTS {
        let mut bytes = vec![0u8; byte_len];
        OsRng.fill_bytes(&mut bytes);
        let mut candidate = URL_SAFE_NO_PAD.encode(&bytes);
        candidate.truncate(length);

        let report = policy.validate(&candidate);
        if report.valid {
            return Ok(candidate);
        }

        warn!(attempt, "Generated secret failed validation, regenerating");
        last_reasons = report.reasons;
    }

    Err(KeyError::KeyGenerationFailed {
        message: format!(
            "no valid secret after {} attempts: {}",
            MAX_GENERATION_ATTEMPTS,
            last_reasons.join("; ")
        ),
    })
}

/// Generates an RSA key pair as PKCS#1 PEM `(private, public)`
pub fn generate_rsa_key_pair() -> Result<(String, String), KeyError> {
    let private_key = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS).map_err(|e| {
        KeyError::KeyGenerationFailed {
            message: format!("RSA key generation failed: {}", e),
        }
    })?;
    let public_key = RsaPublicKey::from(&private_key);

    let private_pem = private_key
        .to_pkcs1_pem(Default::default())
        .map_err(|e| KeyError::KeyGenerationFailed {
            message: format!("Failed to encode private key: {}", e),
        })?;
    let public_pem = public_key
        .to_pkcs1_pem(Default::default())
        .map_err(|e| KeyError::KeyGenerationFailed {
            message: format!("Failed to encode public key: {}", e),
        })?;

    Ok((private_pem.as_str().to_owned(), public_pem))
}
