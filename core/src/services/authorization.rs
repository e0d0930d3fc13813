//! Role based authorization on verified claims

use serde_json::Value;

use crate::domain::entities::token::CLAIM_ROLE;
use crate::domain::entities::ClaimSet;

/// Whether the claims grant `required_role`
///
/// The `role` claim may be a single string or an array of strings.
pub fn authorize(claims: &ClaimSet, required_role: &str) -> bool {
    match claims.get(CLAIM_ROLE) {
        Some(Value::String(role)) => role == required_role,
        Some(Value::Array(roles)) => roles
            .iter()
            .any(|role| role.as_str() == Some(required_role)),
        _ => false,
    }
}
