//! Token entities: the open claim set and issuance metadata.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open JSON claim set carried by a token
pub type ClaimSet = Map<String, Value>;

/// Issued-at claim (unix seconds)
pub const CLAIM_ISSUED_AT: &str = "iat";

/// Not-before claim (unix seconds)
pub const CLAIM_NOT_BEFORE: &str = "nbf";

/// Expiration claim (unix seconds)
pub const CLAIM_EXPIRES_AT: &str = "exp";

/// Unique token identifier claim
pub const CLAIM_TOKEN_ID: &str = "jti";

/// Signing key identifier claim
pub const CLAIM_KEY_ID: &str = "kid";

/// Role claim consulted by the authorization predicate
pub const CLAIM_ROLE: &str = "role";

/// Token type reported with issued tokens
pub const TOKEN_TYPE_BEARER: &str = "bearer";

/// Issued token together with the data a client needs to use it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenWithMetadata {
    /// The token string
    pub token: String,
    /// Always `bearer`
    pub token_type: String,
    /// Id of the key that signed the token
    pub key_id: String,
    /// Lifetime in seconds
    pub expires_in: i64,
    /// JOSE algorithm name
    pub algorithm: String,
    /// Whether the signed token was additionally encrypted
    pub encrypted: bool,
}

/// Reads an integer timestamp claim
///
/// Floats are truncated; anything else is treated as absent.
pub fn timestamp_claim(claims: &ClaimSet, name: &str) -> Option<i64> {
    match claims.get(name)? {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|value| value as i64)),
        _ => None,
    }
}
