//! # Infrastructure Layer
//!
//! Concrete implementations of the repository interfaces declared in
//! `tk_core`.
//!
//! - **Storage**: JSON file key store with atomic replacement and bounded
//!   retry of transient I/O failures

pub mod storage;

pub use storage::{FileKeyStoreRepository, RetryConfig};
