//! Unit tests for key lifecycle management

use chrono::{Duration, Utc};
use std::sync::Arc;
use tk_shared::SigningAlgorithm;

use crate::domain::entities::{KeyStatus, KeyStore};
use crate::errors::{DomainError, KeyError, PersistenceError};
use crate::repositories::{KeyStoreRepository, MemoryKeyStoreRepository};
use crate::services::clock::ManualClock;
use crate::services::keys::{KeyManager, KeyManagerConfig};
use crate::services::token::SigningKeyProvider;

struct Fixture {
    manager: KeyManager,
    repository: Arc<MemoryKeyStoreRepository>,
    clock: Arc<ManualClock>,
}

fn fixture() -> Fixture {
    let repository = Arc::new(MemoryKeyStoreRepository::new());
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let manager = KeyManager::new(
        repository.clone(),
        clock.clone(),
        KeyManagerConfig::default().with_grace_period(Duration::hours(24)),
    )
    .unwrap();
    Fixture {
        manager,
        repository,
        clock,
    }
}

fn active_count(manager: &KeyManager) -> usize {
    manager
        .list_keys()
        .unwrap()
        .iter()
        .filter(|key| key.status == KeyStatus::Active)
        .count()
}

#[test]
fn test_generate_creates_pending_key_and_persists() {
    let f = fixture();

    let record = f.manager.generate(SigningAlgorithm::Hs256, 64).unwrap();

    assert_eq!(record.status, KeyStatus::Pending);
    assert_eq!(record.material.secret().len(), 64);
    assert_eq!(f.repository.save_count(), 1);
    assert!(f.manager.active_key().unwrap().is_none());
    assert_eq!(f.manager.get_key(&record.id).unwrap(), record);
}

#[test]
fn test_generate_rejects_short_secret() {
    let f = fixture();

    let result = f.manager.generate(SigningAlgorithm::Hs256, 16);

    assert!(matches!(
        result,
        Err(DomainError::Key(KeyError::ValidationFailed { .. }))
    ));
    assert_eq!(f.repository.save_count(), 0);
}

#[test]
fn test_activate_unknown_key() {
    let f = fixture();
    let result = f.manager.activate("does-not-exist");
    assert!(matches!(
        result,
        Err(DomainError::Key(KeyError::KeyNotFound { .. }))
    ));
}

#[test]
fn test_activate_demotes_prior_active() {
    let f = fixture();
    let first = f.manager.generate(SigningAlgorithm::Hs256, 64).unwrap();
    let second = f.manager.generate(SigningAlgorithm::Hs256, 64).unwrap();

    f.manager.activate(&first.id).unwrap();
    f.clock.advance(Duration::hours(1));
    f.manager.activate(&second.id).unwrap();

    let first = f.manager.get_key(&first.id).unwrap();
    assert_eq!(first.status, KeyStatus::Previous);
    assert_eq!(first.demoted_at, Some(f.clock_now()));
    assert_eq!(f.manager.active_key().unwrap().unwrap().id, second.id);
    assert_eq!(active_count(&f.manager), 1);
}

impl Fixture {
    fn clock_now(&self) -> chrono::DateTime<Utc> {
        use crate::services::clock::Clock;
        self.clock.now()
    }
}

#[test]
fn test_single_active_across_operations() {
    let f = fixture();
    let a = f.manager.generate(SigningAlgorithm::Hs256, 48).unwrap();
    f.manager.activate(&a.id).unwrap();
    assert_eq!(active_count(&f.manager), 1);

    for _ in 0..3 {
        f.manager.rotate(None, None).unwrap();
        assert_eq!(active_count(&f.manager), 1);
        f.clock.advance(Duration::hours(6));
    }

    let b = f.manager.generate(SigningAlgorithm::Hs256, 48).unwrap();
    assert_eq!(active_count(&f.manager), 1);
    f.manager.activate(&a.id).unwrap();
    f.manager.activate(&b.id).unwrap();
    assert_eq!(active_count(&f.manager), 1);
}

#[test]
fn test_rotate_returns_new_secret_and_counts_rotation() {
    let f = fixture();
    let first = f.manager.rotate(None, None).unwrap();
    assert!(first.previous_key_id.is_none());

    let second = f.manager.rotate(Some(SigningAlgorithm::Hs256), Some(80)).unwrap();

    assert_eq!(second.previous_key_id.as_deref(), Some(first.key_id.as_str()));
    assert_eq!(second.secret.len(), 80);
    assert_ne!(first.secret, second.secret);

    let status = f.manager.get_rotation_status().unwrap();
    assert_eq!(status.active_key_id.as_deref(), Some(second.key_id.as_str()));
    assert_eq!(status.previous_key_id.as_deref(), Some(first.key_id.as_str()));
    assert_eq!(status.rotation_count, 1);
    assert_eq!(f.manager.get_key(&first.key_id).unwrap().rotation_count, 1);
}

#[test]
fn test_rotated_key_debug_hides_secret() {
    let f = fixture();
    let rotated = f.manager.rotate(None, None).unwrap();
    assert!(!format!("{:?}", rotated).contains(&rotated.secret));
}

#[test]
fn test_rotation_status_reports_grace_remaining() {
    let f = fixture();
    f.manager.rotate(None, None).unwrap();
    f.clock.advance(Duration::days(2));
    f.manager.rotate(None, None).unwrap();
    f.clock.advance(Duration::hours(4));

    let status = f.manager.get_rotation_status().unwrap();

    assert_eq!(status.total_keys, 2);
    assert_eq!(status.inactive_keys, 1);
    assert_eq!(status.active_key_age, Some(Duration::hours(4)));
    assert_eq!(status.previous_grace_remaining, Some(Duration::hours(20)));
    assert_eq!(status.grace_period, Duration::hours(24));
}

#[test]
fn test_previous_key_drops_out_after_grace() {
    let f = fixture();
    f.manager.rotate(None, None).unwrap();
    f.manager.rotate(None, None).unwrap();
    assert_eq!(f.manager.verification_candidates().unwrap().len(), 2);

    f.clock.advance(Duration::hours(24));
    assert_eq!(f.manager.verification_candidates().unwrap().len(), 2);

    f.clock.advance(Duration::seconds(1));
    assert_eq!(f.manager.verification_candidates().unwrap().len(), 1);
    assert!(f.manager.get_rotation_status().unwrap().previous_key_id.is_none());
}

#[test]
fn test_signing_key_by_id() {
    let f = fixture();
    let first = f.manager.rotate(None, None).unwrap();
    let pending = f.manager.generate(SigningAlgorithm::Hs256, 64).unwrap();
    f.manager.rotate(None, None).unwrap();

    assert_eq!(
        f.manager.signing_key(Some(&first.key_id)).unwrap().key_id,
        first.key_id
    );
    assert!(matches!(
        f.manager.signing_key(Some(&pending.id)),
        Err(DomainError::Key(KeyError::KeyNotFound { .. }))
    ));

    f.clock.advance(Duration::hours(25));
    assert!(f.manager.signing_key(Some(&first.key_id)).is_err());
}

#[test]
fn test_no_active_key_for_signing() {
    let f = fixture();
    assert!(matches!(
        f.manager.signing_key(None),
        Err(DomainError::Key(KeyError::NoActiveKey))
    ));
    assert!(f.manager.verification_candidates().unwrap().is_empty());
}

#[test]
fn test_cleanup_dry_run_matches_real_cleanup() {
    let f = fixture();
    let oldest = f.manager.rotate(None, None).unwrap();
    f.clock.advance(Duration::days(40));
    let middle = f.manager.rotate(None, None).unwrap();
    f.clock.advance(Duration::days(5));
    let newest = f.manager.rotate(None, None).unwrap();

    let before = f.manager.list_keys().unwrap();
    let saves = f.repository.save_count();

    let planned = f.manager.cleanup_old_keys(30, true).unwrap();
    assert_eq!(planned, vec![oldest.key_id.clone()]);
    assert_eq!(f.manager.list_keys().unwrap(), before);
    assert_eq!(f.repository.save_count(), saves);

    let removed = f.manager.cleanup_old_keys(30, false).unwrap();
    assert_eq!(removed, planned);
    assert!(f.manager.get_key(&oldest.key_id).is_err());
    assert!(f.manager.get_key(&middle.key_id).is_ok());
    assert_eq!(
        f.manager.active_key().unwrap().map(|k| k.id),
        Some(newest.key_id)
    );
}

#[test]
fn test_cleanup_never_removes_active_key() {
    let f = fixture();
    let only = f.manager.rotate(None, None).unwrap();
    f.clock.advance(Duration::days(365));

    assert!(f.manager.cleanup_old_keys(0, false).unwrap().is_empty());
    assert!(f.manager.get_key(&only.key_id).is_ok());
}

#[test]
fn test_failed_persistence_leaves_manager_unchanged() {
    let f = fixture();
    let first = f.manager.rotate(None, None).unwrap();
    let before = f.manager.list_keys().unwrap();

    f.repository.set_fail_saves(true);

    assert!(matches!(
        f.manager.rotate(None, None),
        Err(DomainError::Persistence(PersistenceError::Io { .. }))
    ));
    assert!(f.manager.generate(SigningAlgorithm::Hs256, 64).is_err());
    assert_eq!(f.manager.list_keys().unwrap(), before);
    assert_eq!(
        f.manager.active_key().unwrap().map(|k| k.id),
        Some(first.key_id)
    );

    f.repository.set_fail_saves(false);
    assert!(f.manager.rotate(None, None).is_ok());
}

#[test]
fn test_manager_reloads_persisted_store() {
    let f = fixture();
    let rotated = f.manager.rotate(None, None).unwrap();

    let reloaded = KeyManager::new(
        f.repository.clone(),
        f.clock.clone(),
        KeyManagerConfig::default(),
    )
    .unwrap();

    let active = reloaded.active_key().unwrap().unwrap();
    assert_eq!(active.id, rotated.key_id);
    assert_eq!(active.material.secret(), rotated.secret);
}

#[test]
fn test_manager_rejects_corrupt_store() {
    let mut store = KeyStore::new();
    let record = crate::domain::entities::KeyRecord::new(
        "orphan",
        crate::domain::entities::KeyMaterial::Symmetric {
            secret: "x".repeat(40),
        },
        SigningAlgorithm::Hs256,
        Utc::now(),
    );
    store.insert(record).unwrap();
    store.activate("orphan", Utc::now()).unwrap();
    let mut json = serde_json::to_value(&store).unwrap();
    json["active_key_id"] = serde_json::json!("someone-else");
    let corrupt: KeyStore = serde_json::from_value(json).unwrap();

    let repository = Arc::new(MemoryKeyStoreRepository::with_store(corrupt));
    assert!(repository.load().unwrap().is_some());

    let result = KeyManager::new(
        repository,
        Arc::new(ManualClock::default()),
        KeyManagerConfig::default(),
    );
    assert!(matches!(
        result,
        Err(DomainError::Persistence(PersistenceError::Corrupt { .. }))
    ));
}

#[test]
fn test_rs256_key_generation() {
    let f = fixture();
    let rotated = f.manager.rotate(Some(SigningAlgorithm::Rs256), None).unwrap();

    let record = f.manager.get_key(&rotated.key_id).unwrap();
    assert_eq!(record.algorithm, SigningAlgorithm::Rs256);
    assert!(rotated.secret.contains("RSA PRIVATE KEY"));
    assert_eq!(
        f.manager.signing_key(None).unwrap().algorithm,
        SigningAlgorithm::Rs256
    );
}

#[test]
fn test_concurrent_rotations_keep_single_active() {
    let f = fixture();
    let manager = Arc::new(f.manager);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let manager = Arc::clone(&manager);
            std::thread::spawn(move || {
                for _ in 0..3 {
                    manager.rotate(None, Some(40)).unwrap();
                    assert!(manager.signing_key(None).is_ok());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(active_count(&manager), 1);
    let status = manager.get_rotation_status().unwrap();
    assert_eq!(status.total_keys, 12);
    assert_eq!(status.rotation_count, 11);
}
