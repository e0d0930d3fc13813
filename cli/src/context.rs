//! Composition root for CLI commands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tk_core::{validate_configured_secrets, Clock, KeyManager, KeyManagerConfig, SystemClock};
use tk_infra::FileKeyStoreRepository;
use tk_shared::AppConfig;

/// Loaded configuration plus the services commands are built from
pub struct CliContext {
    pub config: AppConfig,
    clock: Arc<dyn Clock>,
}

impl CliContext {
    /// Loads configuration from `config_path` or the environment
    ///
    /// `storage_path` replaces the configured key storage path when given.
    pub fn load(config_path: Option<&Path>, storage_path: Option<PathBuf>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => AppConfig::from_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
            None => AppConfig::from_env().context("Failed to load configuration from environment")?,
        };

        if let Some(path) = storage_path {
            config.jwt.key_storage_path = path;
        }

        Ok(Self::new(config))
    }

    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn storage_path(&self) -> &Path {
        &self.config.jwt.key_storage_path
    }

    /// Key manager over the configured key store file
    pub fn key_manager(&self) -> Result<KeyManager> {
        let config = KeyManagerConfig::from_jwt_config(&self.config.jwt).context("Invalid key settings")?;
        let repository = Arc::new(FileKeyStoreRepository::new(self.storage_path()));
        KeyManager::new(repository, self.clock.clone(), config)
            .with_context(|| format!("Failed to open key store {}", self.storage_path().display()))
    }

    /// Fails when a configured secret violates the secret policy
    pub fn validate_startup(&self) -> Result<()> {
        validate_configured_secrets(&self.config.jwt).context("Configured secret rejected")
    }
}
