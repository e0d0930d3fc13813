//! Ordered collection of every key generation known to a key manager.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::{KeyError, PersistenceError};

use super::key_record::{KeyRecord, KeyStatus};

/// Current on-disk format version
pub const KEY_STORE_VERSION: u32 = 1;

/// All key generations plus the pointer to the active one
///
/// Records are kept in insertion order so listings are deterministic.
/// Identifiers removed by cleanup are remembered and never handed out again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyStore {
    #[serde(default = "current_version")]
    version: u32,
    #[serde(default)]
    active_key_id: Option<String>,
    #[serde(default)]
    keys: Vec<KeyRecord>,
    #[serde(default)]
    removed_key_ids: Vec<String>,
}

impl Default for KeyStore {
    fn default() -> Self {
        Self {
            version: KEY_STORE_VERSION,
            active_key_id: None,
            keys: Vec::new(),
            removed_key_ids: Vec::new(),
        }
    }
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Records in insertion order
    pub fn records(&self) -> &[KeyRecord] {
        &self.keys
    }

    pub fn get(&self, key_id: &str) -> Option<&KeyRecord> {
        self.keys.iter().find(|record| record.id == key_id)
    }

    fn get_mut(&mut self, key_id: &str) -> Option<&mut KeyRecord> {
        self.keys.iter_mut().find(|record| record.id == key_id)
    }

    pub fn active_key_id(&self) -> Option<&str> {
        self.active_key_id.as_deref()
    }

    pub fn active(&self) -> Option<&KeyRecord> {
        self.active_key_id.as_deref().and_then(|id| self.get(id))
    }

    /// Whether the id was ever used by this store, including removed records
    pub fn contains_id(&self, key_id: &str) -> bool {
        self.get(key_id).is_some() || self.removed_key_ids.iter().any(|id| id == key_id)
    }

    /// Adds a new record; identifiers may never repeat
    pub fn insert(&mut self, record: KeyRecord) -> Result<(), KeyError> {
        if self.contains_id(&record.id) {
            return Err(KeyError::KeyGenerationFailed {
                message: format!("key id {} already used", record.id),
            });
        }
        self.keys.push(record);
        Ok(())
    }

    /// Makes `key_id` the single active key
    ///
    /// The prior active key becomes `previous` with its grace window starting
    /// at `now`. Returns `false` when the key already was active.
    pub fn activate(&mut self, key_id: &str, now: DateTime<Utc>) -> Result<bool, KeyError> {
        if self.get(key_id).is_none() {
            return Err(KeyError::KeyNotFound {
                key_id: key_id.to_string(),
            });
        }
        if self.active_key_id.as_deref() == Some(key_id) {
            return Ok(false);
        }

        if let Some(current_id) = self.active_key_id.take() {
            if let Some(current) = self.get_mut(&current_id) {
                current.status = KeyStatus::Previous;
                current.demoted_at = Some(now);
            }
        }

        let target = self.get_mut(key_id).ok_or_else(|| KeyError::KeyNotFound {
            key_id: key_id.to_string(),
        })?;
        target.status = KeyStatus::Active;
        target.activated_at.get_or_insert(now);
        target.demoted_at = None;
        self.active_key_id = Some(key_id.to_string());

        Ok(true)
    }

    /// Counts a rotation against the current active key
    pub fn mark_active_superseded(&mut self) {
        if let Some(current_id) = self.active_key_id.clone() {
            if let Some(current) = self.get_mut(&current_id) {
                current.rotation_count += 1;
            }
        }
    }

    /// Moves `previous` keys whose grace window elapsed to `retired`
    pub fn retire_expired(&mut self, now: DateTime<Utc>, grace_period: Duration) -> Vec<String> {
        let mut retired = Vec::new();
        for record in self.keys.iter_mut() {
            if record.status == KeyStatus::Previous && !record.is_within_grace(now, grace_period) {
                record.status = KeyStatus::Retired;
                retired.push(record.id.clone());
            }
        }
        retired
    }

    /// Demoted keys still inside their grace window, most recently demoted first
    pub fn previous_within_grace(
        &self,
        now: DateTime<Utc>,
        grace_period: Duration,
    ) -> Vec<&KeyRecord> {
        let mut previous: Vec<&KeyRecord> = self
            .keys
            .iter()
            .filter(|record| record.is_within_grace(now, grace_period))
            .collect();
        previous.sort_by(|a, b| b.demoted_at.cmp(&a.demoted_at));
        previous
    }

    /// Inactive (previous or retired) keys older than `max_age`
    pub fn cleanup_candidates(&self, now: DateTime<Utc>, max_age: Duration) -> Vec<String> {
        self.keys
            .iter()
            .filter(|record| matches!(record.status, KeyStatus::Previous | KeyStatus::Retired))
            .filter(|record| self.active_key_id.as_deref() != Some(record.id.as_str()))
            .filter(|record| record.age(now) > max_age)
            .map(|record| record.id.clone())
            .collect()
    }

    /// Removes the given records, keeping their ids as tombstones
    ///
    /// The active record is never removed. Returns the ids actually removed.
    pub fn remove(&mut self, key_ids: &[String]) -> Vec<String> {
        let wanted: HashSet<&str> = key_ids.iter().map(String::as_str).collect();
        let active = self.active_key_id.clone();
        let mut removed = Vec::new();

        self.keys.retain(|record| {
            let drop = wanted.contains(record.id.as_str())
                && active.as_deref() != Some(record.id.as_str());
            if drop {
                removed.push(record.id.clone());
            }
            !drop
        });
        self.removed_key_ids.extend(removed.iter().cloned());
        removed
    }

    /// Checks the structural invariants of a loaded store
    pub fn validate(&self) -> Result<(), PersistenceError> {
        if self.version != KEY_STORE_VERSION {
            return Err(PersistenceError::Corrupt {
                message: format!("unsupported key store version {}", self.version),
            });
        }

        let mut seen = HashSet::new();
        for record in &self.keys {
            if !seen.insert(record.id.as_str()) {
                return Err(PersistenceError::Corrupt {
                    message: format!("duplicate key id {}", record.id),
                });
            }
            if !record.material.matches(record.algorithm) {
                return Err(PersistenceError::Corrupt {
                    message: format!("key {} material does not match {}", record.id, record.algorithm),
                });
            }
        }

        let active: Vec<&str> = self
            .keys
            .iter()
            .filter(|record| record.is_active())
            .map(|record| record.id.as_str())
            .collect();

        match (active.as_slice(), self.active_key_id.as_deref()) {
            ([], None) => Ok(()),
            ([only], Some(pointer)) if *only == pointer => Ok(()),
            _ => Err(PersistenceError::Corrupt {
                message: format!(
                    "active key pointer {:?} does not match {} active record(s)",
                    self.active_key_id,
                    active.len()
                ),
            }),
        }
    }
}

fn current_version() -> u32 {
    KEY_STORE_VERSION
}
