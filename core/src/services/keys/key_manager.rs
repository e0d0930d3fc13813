//! Key lifecycle management with rotation support

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, RwLock, RwLockReadGuard};
use tk_shared::SigningAlgorithm;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::entities::{KeyMaterial, KeyRecord, KeyStore};
use crate::domain::value_objects::{KeySummary, RotatedKey, RotationStatus};
use crate::errors::{DomainError, DomainResult, KeyError};
use crate::repositories::KeyStoreRepository;
use crate::services::clock::Clock;
use crate::services::secret::{generate_rsa_key_pair, generate_secret};
use crate::services::token::{SigningKeyProvider, SigningMaterial};

use super::config::KeyManagerConfig;

/// Owner of all key generations
///
/// Every mutation runs under the write lock on a copy of the store, is
/// persisted through the repository and only then replaces the in-memory
/// store. A failed save leaves the manager exactly as it was.
pub struct KeyManager {
    store: RwLock<KeyStore>,
    repository: Arc<dyn KeyStoreRepository>,
    clock: Arc<dyn Clock>,
    config: KeyManagerConfig,
}

impl std::fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl KeyManager {
    /// Creates a key manager over the persisted store
    ///
    /// # Returns
    ///
    /// * `Ok(KeyManager)` - Store loaded (or empty if nothing was persisted)
    /// * `Err(DomainError)` - Storage unreadable or store corrupt
    pub fn new(
        repository: Arc<dyn KeyStoreRepository>,
        clock: Arc<dyn Clock>,
        config: KeyManagerConfig,
    ) -> DomainResult<Self> {
        let store = match repository.load()? {
            Some(store) => {
                store.validate()?;
                store
            }
            None => KeyStore::new(),
        };

        info!(
            keys = store.len(),
            has_active = store.active_key_id().is_some(),
            "Key manager initialized"
        );

        Ok(Self {
            store: RwLock::new(store),
            repository,
            clock,
            config,
        })
    }

    pub fn config(&self) -> &KeyManagerConfig {
        &self.config
    }

    pub fn grace_period(&self) -> Duration {
        self.config.grace_period
    }

    /// Generates a new pending key generation and persists it
    pub fn generate(&self, algorithm: SigningAlgorithm, length: usize) -> DomainResult<KeyRecord> {
        let material = self.generate_material(algorithm, length)?;

        let record = self.mutate(|store, now| {
            let record = KeyRecord::new(fresh_key_id(store), material, algorithm, now);
            store.insert(record.clone())?;
            Ok(record)
        })?;

        info!(key_id = %record.id, algorithm = %algorithm, "Generated new key");
        Ok(record)
    }

    /// Makes `key_id` the active signing key
    ///
    /// The prior active key stays valid for verification during the grace
    /// period. Activating the active key does nothing.
    pub fn activate(&self, key_id: &str) -> DomainResult<()> {
        let changed = self.mutate(|store, now| Ok(store.activate(key_id, now)?))?;

        if changed {
            info!(key_id = %key_id, "Activated key");
        } else {
            debug!(key_id = %key_id, "Key already active");
        }
        Ok(())
    }

    /// Generates a new key and activates it in one step
    pub fn rotate(
        &self,
        algorithm: Option<SigningAlgorithm>,
        length: Option<usize>,
    ) -> DomainResult<RotatedKey> {
        let algorithm = algorithm.unwrap_or(self.config.default_algorithm);
        let length = length.unwrap_or(self.config.default_secret_length);
        let material = self.generate_material(algorithm, length)?;
        let secret = material.secret().to_string();

        let (key_id, previous_key_id) = self.mutate(|store, now| {
            let previous_key_id = store.active_key_id().map(str::to_string);
            let record = KeyRecord::new(fresh_key_id(store), material, algorithm, now);
            let key_id = record.id.clone();

            store.insert(record)?;
            store.mark_active_superseded();
            store.activate(&key_id, now)?;
            Ok((key_id, previous_key_id))
        })?;

        info!(
            key_id = %key_id,
            previous_key_id = previous_key_id.as_deref().unwrap_or("none"),
            algorithm = %algorithm,
            "Rotated signing key"
        );

        Ok(RotatedKey {
            key_id,
            algorithm,
            secret,
            previous_key_id,
        })
    }

    /// Removes inactive keys older than `max_age_days`
    ///
    /// Only `previous` and `retired` keys qualify; age is measured from first
    /// activation. With `dry_run` the store is left untouched and the keys
    /// that would be removed are returned.
    pub fn cleanup_old_keys(&self, max_age_days: u32, dry_run: bool) -> DomainResult<Vec<String>> {
        let max_age = Duration::days(i64::from(max_age_days));

        if dry_run {
            let store = self.read_store()?;
            let candidates = store.cleanup_candidates(self.clock.now(), max_age);
            debug!(count = candidates.len(), "Cleanup dry run");
            return Ok(candidates);
        }

        let removed = self.mutate(|store, now| {
            let candidates = store.cleanup_candidates(now, max_age);
            Ok(store.remove(&candidates))
        })?;

        if !removed.is_empty() {
            info!(count = removed.len(), "Removed old keys");
        }
        Ok(removed)
    }

    /// Snapshot of the rotation state
    pub fn get_rotation_status(&self) -> DomainResult<RotationStatus> {
        let store = self.read_store()?;
        let now = self.clock.now();
        let grace = self.config.grace_period;

        let active = store.active();
        let previous = store.previous_within_grace(now, grace).into_iter().next();

        Ok(RotationStatus {
            active_key_id: active.map(|record| record.id.clone()),
            active_key_age: active.map(|record| record.age(now)),
            previous_key_id: previous.map(|record| record.id.clone()),
            previous_grace_remaining: previous
                .and_then(|record| record.grace_expires_at(grace))
                .map(|expires| expires - now),
            total_keys: store.len(),
            inactive_keys: store.records().iter().filter(|r| !r.is_active()).count(),
            rotation_count: store.records().iter().map(|r| r.rotation_count).sum(),
            grace_period: grace,
        })
    }

    /// Secret-free listing of every key in insertion order
    pub fn list_keys(&self) -> DomainResult<Vec<KeySummary>> {
        let store = self.read_store()?;
        Ok(store.records().iter().map(KeyRecord::summary).collect())
    }

    pub fn get_key(&self, key_id: &str) -> DomainResult<KeyRecord> {
        let store = self.read_store()?;
        store.get(key_id).cloned().ok_or_else(|| {
            DomainError::Key(KeyError::KeyNotFound {
                key_id: key_id.to_string(),
            })
        })
    }

    pub fn active_key(&self) -> DomainResult<Option<KeyRecord>> {
        let store = self.read_store()?;
        Ok(store.active().cloned())
    }

    fn generate_material(&self, algorithm: SigningAlgorithm, length: usize) -> DomainResult<KeyMaterial> {
        match algorithm {
            SigningAlgorithm::Hs256 => Ok(KeyMaterial::Symmetric {
                secret: generate_secret(length, &self.config.secret_policy)?,
            }),
            SigningAlgorithm::Rs256 => {
                let (private_key_pem, public_key_pem) = generate_rsa_key_pair()?;
                Ok(KeyMaterial::Asymmetric {
                    private_key_pem,
                    public_key_pem,
                })
            }
        }
    }

    fn read_store(&self) -> DomainResult<RwLockReadGuard<'_, KeyStore>> {
        self.store.read().map_err(|e| DomainError::Internal {
            message: format!("Failed to read key store: {}", e),
        })
    }

    /// Runs `op` on a copy of the store and commits it once persisted
    fn mutate<T>(
        &self,
        op: impl FnOnce(&mut KeyStore, DateTime<Utc>) -> DomainResult<T>,
    ) -> DomainResult<T> {
        let mut guard = self.store.write().map_err(|e| DomainError::Internal {
            message: format!("Failed to write key store: {}", e),
        })?;

        let now = self.clock.now();
        let mut next = guard.clone();
        let retired = next.retire_expired(now, self.config.grace_period);
        if !retired.is_empty() {
            debug!(count = retired.len(), "Retired keys past their grace period");
        }

        let result = op(&mut next, now)?;

        if next != *guard {
            self.repository.save(&next)?;
            *guard = next;
        }
        Ok(result)
    }

    fn accepted_key<'a>(&self, store: &'a KeyStore, key_id: &str) -> DomainResult<&'a KeyRecord> {
        let now = self.clock.now();
        store
            .get(key_id)
            .filter(|record| record.is_active() || record.is_within_grace(now, self.config.grace_period))
            .ok_or_else(|| {
                DomainError::Key(KeyError::KeyNotFound {
                    key_id: key_id.to_string(),
                })
            })
    }
}

impl SigningKeyProvider for KeyManager {
    fn signing_key(&self, key_id: Option<&str>) -> DomainResult<SigningMaterial> {
        let store = self.read_store()?;
        let record = match key_id {
            Some(key_id) => self.accepted_key(&store, key_id)?,
            None => store.active().ok_or(KeyError::NoActiveKey)?,
        };
        SigningMaterial::from_record(record)
    }

    fn verification_candidates(&self) -> DomainResult<Vec<SigningMaterial>> {
        let store = self.read_store()?;
        let now = self.clock.now();

        store
            .active()
            .into_iter()
            .chain(store.previous_within_grace(now, self.config.grace_period))
            .map(SigningMaterial::from_record)
            .collect()
    }
}

/// UUID v4 that the store has never used
fn fresh_key_id(store: &KeyStore) -> String {
    loop {
        let candidate = Uuid::new_v4().to_string();
        if !store.contains_id(&candidate) {
            return candidate;
        }
    }
}
