//! Main token service implementation

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, Header, Validation};
use rand::{rngs::OsRng, RngCore};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tk_shared::SigningAlgorithm;
use tracing::{debug, error, info, warn};

use crate::domain::entities::token::{
    timestamp_claim, CLAIM_EXPIRES_AT, CLAIM_ISSUED_AT, CLAIM_KEY_ID, CLAIM_NOT_BEFORE,
    CLAIM_TOKEN_ID,
};
use crate::domain::entities::{ClaimSet, TokenWithMetadata, TOKEN_TYPE_BEARER};
use crate::errors::{DomainError, DomainResult, TokenError};
use crate::services::clock::Clock;

use super::config::TokenServiceConfig;
use super::encryption::{decrypt_token, derive_encryption_key, encrypt_token};
use super::key_provider::{SigningKeyProvider, SigningMaterial};

/// Tokens issued longer ago than this are reported in strict mode
const OLD_TOKEN_AGE_HOURS: i64 = 24;

/// Service for issuing and verifying signed tokens
pub struct TokenService {
    provider: Arc<dyn SigningKeyProvider>,
    clock: Arc<dyn Clock>,
    config: TokenServiceConfig,
    /// Key from the dedicated encryption secret, if one is configured
    encryption_key: Option<[u8; 32]>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Creates a new token service instance
    ///
    /// # Arguments
    ///
    /// * `provider` - Source of signing and verification keys
    /// * `clock` - Time source for issued-at, expiry and skew checks
    /// * `config` - Token service configuration
    pub fn new(
        provider: Arc<dyn SigningKeyProvider>,
        clock: Arc<dyn Clock>,
        config: TokenServiceConfig,
    ) -> Self {
        let encryption_key = config
            .encryption_secret
            .as_deref()
            .map(|secret| derive_encryption_key(secret.as_bytes()));

        Self {
            provider,
            clock,
            config,
            encryption_key,
        }
    }

    pub fn config(&self) -> &TokenServiceConfig {
        &self.config
    }

    /// Issues a token for `claims`
    ///
    /// Adds `iat`, `nbf`, `exp` and `jti`; caller supplied claims of the same
    /// name take precedence. `kid` always names the signing key.
    ///
    /// # Arguments
    ///
    /// * `claims` - Caller claims
    /// * `expiry` - Lifetime, the configured default when `None`
    /// * `key_id` - Sign with this key instead of the active one
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The signed, and in encrypted mode encrypted, token
    /// * `Err(DomainError)` - Key unavailable or signing failed
    pub fn create_token(
        &self,
        claims: &ClaimSet,
        expiry: Option<Duration>,
        key_id: Option<&str>,
    ) -> DomainResult<String> {
        self.issue(claims, expiry, key_id).map(|issued| issued.token)
    }

    /// Issues a token and reports which key signed it
    pub fn create_token_with_rotation_metadata(
        &self,
        claims: &ClaimSet,
    ) -> DomainResult<TokenWithMetadata> {
        let issued = self.issue(claims, None, None)?;

        Ok(TokenWithMetadata {
            token: issued.token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            key_id: issued.key_id,
            expires_in: issued.expires_in.num_seconds(),
            algorithm: issued.algorithm.as_str().to_string(),
            encrypted: self.config.enable_encryption,
        })
    }

    /// Verifies a token and returns its claims
    ///
    /// The active key is tried first, then previous keys within their grace
    /// period. Every failure, whatever its cause, is reported as
    /// `TokenError::VerificationFailed`.
    pub fn verify_token(&self, token: &str) -> DomainResult<ClaimSet> {
        self.verify_inner(token).map_err(|err| {
            debug!(reason = %err, "Token verification failed");
            DomainError::Token(TokenError::VerificationFailed)
        })
    }

    fn issue(
        &self,
        claims: &ClaimSet,
        expiry: Option<Duration>,
        key_id: Option<&str>,
    ) -> DomainResult<IssuedToken> {
        let expires_in = expiry.unwrap_or(self.config.access_token_expiry);
        if expires_in <= Duration::zero() {
            return Err(DomainError::Validation {
                message: "token lifetime must be positive".to_string(),
            });
        }

        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(expires_in)
            .ok_or_else(|| DomainError::Validation {
                message: "token lifetime is out of range".to_string(),
            })?;

        let material = self.provider.signing_key(key_id)?;
        let full_claims = build_claims(claims, now, expires_at, &material.key_id);

        let mut header = Header::new(jwt_algorithm(material.algorithm));
        header.kid = Some(material.key_id.clone());

        let signed = encode(&header, &full_claims, &material.encoding_key).map_err(|e| {
            error!(error = %e, "Failed to sign token");
            DomainError::Token(TokenError::TokenGenerationFailed)
        })?;

        let token = if self.config.enable_encryption {
            let key = self.encryption_key.unwrap_or(material.encryption_key);
            encrypt_token(&signed, &key)?
        } else {
            signed
        };

        Ok(IssuedToken {
            token,
            key_id: material.key_id,
            algorithm: material.algorithm,
            expires_in,
        })
    }

    fn verify_inner(&self, token: &str) -> Result<ClaimSet, TokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::InvalidTokenFormat);
        }

        let candidates = self.provider.verification_candidates().map_err(|err| {
            error!(error = %err, "Failed to load verification keys");
            TokenError::VerificationFailed
        })?;
        if candidates.is_empty() {
            warn!("No verification keys available");
            return Err(TokenError::VerificationFailed);
        }

        let signed = if self.config.enable_encryption {
            self.decrypt(token, &candidates)?
        } else {
            token.to_string()
        };

        let mut last_error = TokenError::InvalidSignature;
        for (index, candidate) in candidates.iter().enumerate() {
            match decode::<ClaimSet>(&signed, &candidate.decoding_key, &validation_for(candidate)) {
                Ok(data) => {
                    if index > 0 {
                        info!("Token verified with a previous key during rotation grace period");
                    }
                    return self.check_claims(data.claims);
                }
                Err(err) => {
                    last_error = match err.kind() {
                        jsonwebtoken::errors::ErrorKind::InvalidSignature
                        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
                        _ => TokenError::InvalidTokenFormat,
                    };
                }
            }
        }

        Err(last_error)
    }

    fn decrypt(&self, token: &str, candidates: &[SigningMaterial]) -> Result<String, TokenError> {
        if let Some(key) = &self.encryption_key {
            return decrypt_token(token, key);
        }

        let mut last_error = TokenError::DecryptionFailed;
        for candidate in candidates {
            match decrypt_token(token, &candidate.encryption_key) {
                Ok(signed) => return Ok(signed),
                Err(TokenError::InvalidTokenFormat) => return Err(TokenError::InvalidTokenFormat),
                Err(err) => last_error = err,
            }
        }
        Err(last_error)
    }

    fn check_claims(&self, claims: ClaimSet) -> Result<ClaimSet, TokenError> {
        let now = self.clock.now().timestamp();
        let skew = self.config.max_clock_skew.num_seconds();

        let exp = timestamp_claim(&claims, CLAIM_EXPIRES_AT).ok_or_else(|| TokenError::MissingClaim {
            claim: CLAIM_EXPIRES_AT.to_string(),
        })?;
        if now > exp.saturating_add(skew) {
            return Err(TokenError::TokenExpired);
        }

        for claim in [CLAIM_NOT_BEFORE, CLAIM_ISSUED_AT] {
            if let Some(value) = timestamp_claim(&claims, claim) {
                if value > now.saturating_add(skew) {
                    return Err(TokenError::ClockSkewExceeded {
                        claim: claim.to_string(),
                    });
                }
            }
        }

        for required in &self.config.required_claims {
            if !claims.contains_key(required) {
                return Err(TokenError::MissingClaim {
                    claim: required.clone(),
                });
            }
        }

        if self.config.strict_mode {
            if let Some(issued_at) = timestamp_claim(&claims, CLAIM_ISSUED_AT) {
                let age_hours = now.saturating_sub(issued_at) / 3600;
                if age_hours > OLD_TOKEN_AGE_HOURS {
                    warn!(age_hours, "Old token detected");
                }
            }
        }

        Ok(claims)
    }
}

struct IssuedToken {
    token: String,
    key_id: String,
    algorithm: SigningAlgorithm,
    expires_in: Duration,
}

fn build_claims(
    claims: &ClaimSet,
    now: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    key_id: &str,
) -> ClaimSet {
    let mut full = ClaimSet::new();
    full.insert(CLAIM_ISSUED_AT.to_string(), Value::from(now.timestamp()));
    full.insert(CLAIM_NOT_BEFORE.to_string(), Value::from(now.timestamp()));
    full.insert(
        CLAIM_EXPIRES_AT.to_string(),
        Value::from(expires_at.timestamp()),
    );
    full.insert(CLAIM_TOKEN_ID.to_string(), Value::from(generate_token_id()));
    for (name, value) in claims {
        full.insert(name.clone(), value.clone());
    }
    full.insert(CLAIM_KEY_ID.to_string(), Value::from(key_id));
    full
}

/// 128-bit random token id, base64url encoded
fn generate_token_id() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn jwt_algorithm(algorithm: SigningAlgorithm) -> Algorithm {
    match algorithm {
        SigningAlgorithm::Hs256 => Algorithm::HS256,
        SigningAlgorithm::Rs256 => Algorithm::RS256,
    }
}

/// Signature-only validation; time claims are checked against the service clock
fn validation_for(material: &SigningMaterial) -> Validation {
    let mut validation = Validation::new(jwt_algorithm(material.algorithm));
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();
    validation
}
