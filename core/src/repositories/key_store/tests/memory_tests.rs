use chrono::Utc;
use tk_shared::SigningAlgorithm;

use crate::domain::entities::{KeyMaterial, KeyRecord, KeyStore};
use crate::errors::PersistenceError;
use crate::repositories::key_store::{KeyStoreRepository, MemoryKeyStoreRepository};

fn store_with_key() -> KeyStore {
    let mut store = KeyStore::new();
    store
        .insert(KeyRecord::new(
            "key-1",
            KeyMaterial::Symmetric {
                secret: "material".to_string(),
            },
            SigningAlgorithm::Hs256,
            Utc::now(),
        ))
        .unwrap();
    store
}

#[test]
fn test_empty_repository_loads_none() {
    let repo = MemoryKeyStoreRepository::new();
    assert!(repo.load().unwrap().is_none());
}

#[test]
fn test_save_then_load() {
    let repo = MemoryKeyStoreRepository::new();
    let store = store_with_key();

    repo.save(&store).unwrap();

    assert_eq!(repo.load().unwrap(), Some(store));
    assert_eq!(repo.save_count(), 1);
}

#[test]
fn test_failed_save_keeps_previous_store() {
    let repo = MemoryKeyStoreRepository::with_store(KeyStore::new());
    repo.set_fail_saves(true);

    let result = repo.save(&store_with_key());

    assert!(matches!(result, Err(PersistenceError::Io { transient: false, .. })));
    assert_eq!(repo.load().unwrap(), Some(KeyStore::new()));
    assert_eq!(repo.save_count(), 0);
}
