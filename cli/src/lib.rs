//! # TokenKeep CLI
//!
//! Operator tooling over the key manager: generate and rotate keys, report
//! rotation status, clean up old keys, and check the configured secrets.

pub mod args;
pub mod commands;
pub mod context;
pub mod logging;

pub use args::{Cli, Commands};
pub use context::CliContext;
