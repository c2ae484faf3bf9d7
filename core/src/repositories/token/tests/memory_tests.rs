//! Unit tests for the in-memory refresh token store

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::entities::token::{ClientContext, RefreshTokenRecord, RevocationReason};
use crate::errors::DomainError;
use crate::repositories::{InMemoryTokenStore, RefreshTokenStore, RevocationScope};

fn record(token_id: &str, family_id: &str, user_id: Uuid) -> RefreshTokenRecord {
    RefreshTokenRecord::new(
        token_id,
        family_id,
        format!("dev-{family_id}"),
        user_id,
        &ClientContext::default(),
        Utc::now(),
        Duration::days(7),
    )
}

#[tokio::test]
async fn test_insert_and_find() {
    let store = InMemoryTokenStore::new();
    let user_id = Uuid::new_v4();

    store.insert(record("t1", "f1", user_id)).await.unwrap();

    let found = store.find_active_by_token_id("t1").await.unwrap().unwrap();
    assert_eq!(found.token_id, "t1");
    assert_eq!(found.family_id, "f1");
    assert_eq!(found.user_id, user_id);

    assert!(store.find_active_by_token_id("t2").await.unwrap().is_none());
}

#[tokio::test]
async fn test_insert_rejects_duplicate_token_id() {
    let store = InMemoryTokenStore::new();
    let user_id = Uuid::new_v4();

    store.insert(record("t1", "f1", user_id)).await.unwrap();
    let result = store.insert(record("t1", "f2", user_id)).await;

    assert!(matches!(result, Err(DomainError::Storage { .. })));
}

#[tokio::test]
async fn test_find_treats_expired_as_absent() {
    let store = InMemoryTokenStore::new();
    let mut expired = record("t1", "f1", Uuid::new_v4());
    expired.expires_at = Utc::now() - Duration::hours(1);
    store.put(expired).await;

    assert!(store.find_active_by_token_id("t1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_returns_revoked_but_unexpired() {
    let store = InMemoryTokenStore::new();
    let mut revoked = record("t1", "f1", Uuid::new_v4());
    revoked.revoke(RevocationReason::Rotated, Utc::now());
    store.put(revoked).await;

    let found = store.find_active_by_token_id("t1").await.unwrap().unwrap();
    assert!(found.revoked);
}

#[tokio::test]
async fn test_conditional_revoke_single_winner() {
    let store = InMemoryTokenStore::new();
    store.insert(record("t1", "f1", Uuid::new_v4())).await.unwrap();

    assert!(store.conditional_revoke("t1").await.unwrap());
    // Second caller lost the race
    assert!(!store.conditional_revoke("t1").await.unwrap());
    // Unknown token never wins
    assert!(!store.conditional_revoke("t2").await.unwrap());

    let stored = store.get("t1").await.unwrap();
    assert_eq!(stored.revoked_reason, Some(RevocationReason::Rotated));
}

#[tokio::test]
async fn test_revoke_family_marks_every_member() {
    let store = InMemoryTokenStore::new();
    let user_id = Uuid::new_v4();
    store.insert(record("t1", "f1", user_id)).await.unwrap();
    store.insert(record("t2", "f1", user_id)).await.unwrap();
    store.insert(record("t3", "f2", user_id)).await.unwrap();

    let revoked = store.revoke_family("f1").await.unwrap();
    assert_eq!(revoked, 2);

    assert!(store.get("t1").await.unwrap().revoked);
    assert!(store.get("t2").await.unwrap().revoked);
    assert!(!store.get("t3").await.unwrap().revoked);
    assert_eq!(
        store.get("t1").await.unwrap().revoked_reason,
        Some(RevocationReason::TheftSuspected)
    );
}

#[tokio::test]
async fn test_revoke_all_for_user_honors_scope() {
    let store = InMemoryTokenStore::new();
    let user_id = Uuid::new_v4();
    let other_user = Uuid::new_v4();
    store.insert(record("t1", "f1", user_id)).await.unwrap();
    store.insert(record("t2", "f2", user_id)).await.unwrap();
    store.insert(record("t3", "f3", other_user)).await.unwrap();

    let revoked = store
        .revoke_all_for_user(user_id, &RevocationScope::except_family("f1"))
        .await
        .unwrap();

    assert_eq!(revoked, 1);
    assert!(!store.get("t1").await.unwrap().revoked);
    assert!(store.get("t2").await.unwrap().revoked);
    assert!(!store.get("t3").await.unwrap().revoked);
    assert_eq!(
        store.get("t2").await.unwrap().revoked_reason,
        Some(RevocationReason::LoggedOut)
    );
}

#[tokio::test]
async fn test_revoke_all_for_user_older_than() {
    let store = InMemoryTokenStore::new();
    let user_id = Uuid::new_v4();

    let mut old = record("t1", "f1", user_id);
    old.created_at = Utc::now() - Duration::days(30);
    store.put(old).await;
    store.insert(record("t2", "f2", user_id)).await.unwrap();

    let scope = RevocationScope {
        older_than: Some(Utc::now() - Duration::days(1)),
        ..RevocationScope::default()
    };
    let revoked = store.revoke_all_for_user(user_id, &scope).await.unwrap();

    assert_eq!(revoked, 1);
    assert!(store.get("t1").await.unwrap().revoked);
    assert!(!store.get("t2").await.unwrap().revoked);
}

#[tokio::test]
async fn test_count_active_in_family() {
    let store = InMemoryTokenStore::new();
    let user_id = Uuid::new_v4();
    store.insert(record("t1", "f1", user_id)).await.unwrap();
    store.insert(record("t2", "f1", user_id)).await.unwrap();

    let mut expired = record("t3", "f1", user_id);
    expired.expires_at = Utc::now() - Duration::hours(1);
    store.put(expired).await;

    assert_eq!(store.count_active_in_family("f1").await.unwrap(), 2);

    store.conditional_revoke("t1").await.unwrap();
    assert_eq!(store.count_active_in_family("f1").await.unwrap(), 1);
}

#[tokio::test]
async fn test_delete_expired_or_revoked_spares_active_rows() {
    let store = InMemoryTokenStore::new();
    let user_id = Uuid::new_v4();
    let cutoff = Utc::now() - Duration::days(7);

    store.insert(record("active", "f1", user_id)).await.unwrap();

    let mut expired = record("expired", "f1", user_id);
    expired.expires_at = cutoff - Duration::days(1);
    store.put(expired).await;

    let mut old_revoked = record("old-revoked", "f1", user_id);
    old_revoked.revoke(RevocationReason::LoggedOut, cutoff - Duration::days(2));
    store.put(old_revoked).await;

    let mut fresh_revoked = record("fresh-revoked", "f1", user_id);
    fresh_revoked.revoke(RevocationReason::Rotated, Utc::now());
    store.put(fresh_revoked).await;

    let deleted = store.delete_expired_or_revoked(cutoff, 100).await.unwrap();

    assert_eq!(deleted, 2);
    assert!(store.get("active").await.is_some());
    assert!(store.get("fresh-revoked").await.is_some());
    assert!(store.get("expired").await.is_none());
    assert!(store.get("old-revoked").await.is_none());
}

#[tokio::test]
async fn test_delete_respects_limit() {
    let store = InMemoryTokenStore::new();
    let user_id = Uuid::new_v4();
    let cutoff = Utc::now() - Duration::days(7);

    for i in 0..3 {
        let mut expired = record(&format!("t{i}"), "f1", user_id);
        expired.expires_at = cutoff - Duration::days(1);
        store.put(expired).await;
    }

    assert_eq!(store.delete_expired_or_revoked(cutoff, 2).await.unwrap(), 2);
    assert_eq!(store.len().await, 1);
    assert_eq!(store.delete_expired_or_revoked(cutoff, 2).await.unwrap(), 1);
    assert!(store.is_empty().await);
}
