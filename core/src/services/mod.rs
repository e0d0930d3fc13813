//! Business services containing key lifecycle and token logic.

pub mod authorization;
pub mod clock;
pub mod keys;
pub mod secret;
pub mod token;

// Re-export commonly used types
pub use authorization::authorize;
pub use clock::{Clock, ManualClock, SystemClock};
pub use keys::{plan_rotation, plan_rotation_for, KeyManager, KeyManagerConfig};
pub use secret::{generate_secret, validate_secret, SecretPolicy, SecretValidationReport};
pub use token::{
    validate_configured_secrets, SigningKeyProvider, SigningMaterial, StaticKeyProvider,
    TokenService, TokenServiceConfig,
};
