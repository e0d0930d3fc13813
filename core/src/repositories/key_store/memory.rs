//! In-memory key store repository for tests and ephemeral managers

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::domain::entities::KeyStore;
use crate::errors::PersistenceError;

use super::r#trait::KeyStoreRepository;

/// Key store repository holding the store in process memory
///
/// Saves can be made to fail on demand to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryKeyStoreRepository {
    store: Mutex<Option<KeyStore>>,
    fail_saves: AtomicBool,
    save_count: AtomicUsize,
}

impl MemoryKeyStoreRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository that starts out with an already persisted store
    pub fn with_store(store: KeyStore) -> Self {
        Self {
            store: Mutex::new(Some(store)),
            ..Self::default()
        }
    }

    /// Makes every following save fail (or succeed again)
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    /// Copy of the last persisted store
    pub fn snapshot(&self) -> Option<KeyStore> {
        self.store.lock().ok().and_then(|guard| guard.clone())
    }
}

impl KeyStoreRepository for MemoryKeyStoreRepository {
    fn load(&self) -> Result<Option<KeyStore>, PersistenceError> {
        let guard = self.store.lock().map_err(|e| PersistenceError::Io {
            message: format!("Failed to lock key store: {}", e),
            transient: false,
        })?;
        Ok(guard.clone())
    }

    fn save(&self, store: &KeyStore) -> Result<(), PersistenceError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(PersistenceError::Io {
                message: "simulated write failure".to_string(),
                transient: false,
            });
        }

        let mut guard = self.store.lock().map_err(|e| PersistenceError::Io {
            message: format!("Failed to lock key store: {}", e),
            transient: false,
        })?;
        *guard = Some(store.clone());
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
