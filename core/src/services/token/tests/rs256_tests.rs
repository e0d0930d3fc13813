//! Tests for RS256 token signing and verification

use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use serde_json::json;
use std::sync::Arc;
use tk_shared::SigningAlgorithm;

use crate::domain::entities::ClaimSet;
use crate::repositories::MemoryKeyStoreRepository;
use crate::services::clock::ManualClock;
use crate::services::keys::{KeyManager, KeyManagerConfig};
use crate::services::secret::generate_rsa_key_pair;
use crate::services::token::{static_key_id, StaticKeyProvider, TokenService, TokenServiceConfig};

static KEY_PAIR: Lazy<(String, String)> =
    Lazy::new(|| generate_rsa_key_pair().expect("RSA key generation"));

fn claims() -> ClaimSet {
    let mut claims = ClaimSet::new();
    claims.insert("sub".to_string(), json!("rsa-user"));
    claims
}

#[test]
fn test_rs256_static_round_trip() {
    let (private_pem, public_pem) = &*KEY_PAIR;
    let provider = StaticKeyProvider::from_rsa_pem(private_pem, public_pem).unwrap();
    let service = TokenService::new(
        Arc::new(provider),
        Arc::new(ManualClock::default()),
        TokenServiceConfig::default(),
    );

    let issued = service.create_token_with_rotation_metadata(&claims()).unwrap();

    assert_eq!(issued.algorithm, "RS256");
    assert_eq!(issued.key_id, static_key_id(public_pem.trim().as_bytes()));
    assert_eq!(service.verify_token(&issued.token).unwrap()["sub"], json!("rsa-user"));
}

#[test]
fn test_rs256_keys_from_files() {
    let (private_pem, public_pem) = &*KEY_PAIR;
    let dir = tempfile::tempdir().unwrap();
    let private_path = dir.path().join("private.pem");
    let public_path = dir.path().join("public.pem");
    std::fs::write(&private_path, private_pem).unwrap();
    std::fs::write(&public_path, public_pem).unwrap();

    let provider = StaticKeyProvider::from_rsa_files(&private_path, &public_path).unwrap();
    assert_eq!(provider.current_key_id(), static_key_id(public_pem.trim().as_bytes()));

    let service = TokenService::new(
        Arc::new(provider),
        Arc::new(ManualClock::default()),
        TokenServiceConfig::default().with_encryption(true),
    );
    let token = service.create_token(&claims(), None, None).unwrap();
    assert!(service.verify_token(&token).is_ok());
}

#[test]
fn test_hs256_token_rejected_by_rs256_service() {
    let (private_pem, public_pem) = &*KEY_PAIR;
    let rs_service = TokenService::new(
        Arc::new(StaticKeyProvider::from_rsa_pem(private_pem, public_pem).unwrap()),
        Arc::new(ManualClock::default()),
        TokenServiceConfig::default(),
    );
    let hs_service = TokenService::new(
        Arc::new(
            StaticKeyProvider::from_secrets(
                "Jx9kQ2mV7pR4tW8zLb3nC6yH1dF5gS0aEuIoPqZrXvNcMbTy-_KjUhGfDsAe",
                None,
            )
            .unwrap(),
        ),
        Arc::new(ManualClock::default()),
        TokenServiceConfig::default(),
    );

    let token = hs_service.create_token(&claims(), None, None).unwrap();
    assert!(rs_service.verify_token(&token).is_err());
}

#[test]
fn test_rotation_from_hs256_to_rs256() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let manager = Arc::new(
        KeyManager::new(
            Arc::new(MemoryKeyStoreRepository::new()),
            clock.clone(),
            KeyManagerConfig::default(),
        )
        .unwrap(),
    );
    let service = TokenService::new(
        manager.clone(),
        clock.clone(),
        TokenServiceConfig::default().with_expiry(Duration::hours(72)),
    );

    manager.rotate(Some(SigningAlgorithm::Hs256), None).unwrap();
    let hs_token = service.create_token(&claims(), None, None).unwrap();

    manager.rotate(Some(SigningAlgorithm::Rs256), None).unwrap();
    let rs_token = service.create_token(&claims(), None, None).unwrap();

    assert!(service.verify_token(&hs_token).is_ok());
    assert!(service.verify_token(&rs_token).is_ok());

    clock.advance(Duration::hours(25));
    assert!(service.verify_token(&hs_token).is_err());
    assert!(service.verify_token(&rs_token).is_ok());
}
