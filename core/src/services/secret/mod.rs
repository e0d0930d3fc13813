//! Secret validation and generation
//!
//! - Policy-based scoring of candidate secrets
//! - Random symmetric secrets that always pass the policy
//! - RSA key pairs for asymmetric signing

mod generator;
mod validator;

pub use generator::{generate_rsa_key_pair, generate_secret, MAX_GENERATION_ATTEMPTS, RSA_KEY_BITS};
pub use validator::{
    character_diversity, shannon_entropy, validate_secret, SecretPolicy, SecretValidationReport,
    MAX_REPEATED_RUN, WEAK_PATTERNS,
};
