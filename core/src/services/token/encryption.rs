//! Token encryption using AES-256-GCM
//!
//! An encrypted token is `base64url(nonce || ciphertext)` where the
//! ciphertext includes the GCM authentication tag.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::errors::TokenError;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Derives a 256-bit encryption key from secret material
pub fn derive_encryption_key(material: &[u8]) -> [u8; 32] {
    Sha256::digest(material).into()
}

/// Generate a random nonce for AES-GCM
fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Encrypts a signed token
pub fn encrypt_token(signed_token: &str, key: &[u8; 32]) -> Result<String, TokenError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = generate_nonce();

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), signed_token.as_bytes())
        .map_err(|_| TokenError::EncryptionFailed)?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(URL_SAFE_NO_PAD.encode(sealed))
}

/// Decrypts an encrypted token back to the signed token
pub fn decrypt_token(encrypted_token: &str, key: &[u8; 32]) -> Result<String, TokenError> {
    let sealed = URL_SAFE_NO_PAD
        .decode(encrypted_token.trim())
        .map_err(|_| TokenError::InvalidTokenFormat)?;
    if sealed.len() < NONCE_LEN + TAG_LEN {
        return Err(TokenError::InvalidTokenFormat);
    }

    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| TokenError::DecryptionFailed)?;

    String::from_utf8(plaintext).map_err(|_| TokenError::DecryptionFailed)
}
