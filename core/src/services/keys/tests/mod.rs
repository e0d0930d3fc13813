//! Tests for the key manager

#[cfg(test)]
mod key_manager_tests;
