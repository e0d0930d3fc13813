//! Key lifecycle module
//!
//! This module handles all key-related operations including:
//! - Generation of symmetric secrets and RSA key pairs
//! - Activation and rotation with a verification grace period
//! - Cleanup of old inactive keys
//! - Rotation status snapshots and rotation planning

mod config;
mod key_manager;
mod rotation_planner;

#[cfg(test)]
mod tests;

pub use config::{KeyManagerConfig, DEFAULT_SECRET_LENGTH};
pub use key_manager::KeyManager;
pub use rotation_planner::{format_duration, plan_rotation, plan_rotation_for};
