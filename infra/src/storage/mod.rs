//! Key store persistence on the local filesystem

mod file_key_store;
mod retry;

pub use file_key_store::FileKeyStoreRepository;
pub use retry::{with_retry, RetryConfig};
