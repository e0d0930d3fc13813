//! Domain entities representing key generations and tokens.

pub mod key_record;
pub mod key_store;
pub mod token;

pub use key_record::{KeyMaterial, KeyRecord, KeyStatus};
pub use key_store::{KeyStore, KEY_STORE_VERSION};
pub use token::{ClaimSet, TokenWithMetadata, TOKEN_TYPE_BEARER};
