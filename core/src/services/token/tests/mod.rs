//! Tests for the token service

#[cfg(test)]
mod rs256_tests;
