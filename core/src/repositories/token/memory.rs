//! In-memory implementation of RefreshTokenStore
//!
//! Backs unit tests and local development. Mutations take the write lock for
//! their whole check-and-set, which gives the same conditional-revoke
//! semantics as the SQL implementation's guarded UPDATE.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::token::{RefreshTokenRecord, RevocationReason};
use crate::errors::DomainError;

use super::r#trait::{RefreshTokenStore, RevocationScope};

/// In-memory refresh token store
pub struct InMemoryTokenStore {
    records: Arc<RwLock<HashMap<String, RefreshTokenRecord>>>,
}

impl InMemoryTokenStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Fetch a record regardless of its state (test and audit hook)
    pub async fn get(&self, token_id: &str) -> Option<RefreshTokenRecord> {
        let records = self.records.read().await;
        records.get(token_id).cloned()
    }

    /// Insert or replace a record unconditionally (test hook)
    pub async fn put(&self, record: RefreshTokenRecord) {
        let mut records = self.records.write().await;
        records.insert(record.token_id.clone(), record);
    }

    /// Number of stored records, whatever their state
    pub async fn len(&self) -> usize {
        let records = self.records.read().await;
        records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryTokenStore {
    async fn insert(&self, record: RefreshTokenRecord) -> Result<RefreshTokenRecord, DomainError> {
        let mut records = self.records.write().await;

        if records.contains_key(&record.token_id) {
            return Err(DomainError::storage("refresh token id already exists"));
        }

        records.insert(record.token_id.clone(), record.clone());
        Ok(record)
    }

    async fn find_active_by_token_id(
        &self,
        token_id: &str,
    ) -> Result<Option<RefreshTokenRecord>, DomainError> {
        let records = self.records.read().await;
        let now = Utc::now();
        Ok(records
            .get(token_id)
            .filter(|r| !r.is_expired(now))
            .cloned())
    }

    async fn conditional_revoke(&self, token_id: &str) -> Result<bool, DomainError> {
        let mut records = self.records.write().await;

        match records.get_mut(token_id) {
            Some(record) if !record.revoked => {
                record.revoke(RevocationReason::Rotated, Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_family(&self, family_id: &str) -> Result<usize, DomainError> {
        let mut records = self.records.write().await;
        let now = Utc::now();
        let mut count = 0;

        for record in records.values_mut() {
            if record.family_id == family_id && !record.revoked {
                record.revoke(RevocationReason::TheftSuspected, now);
                count += 1;
            }
        }

        Ok(count)
    }

    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        scope: &RevocationScope,
    ) -> Result<usize, DomainError> {
        let mut records = self.records.write().await;
        let now = Utc::now();
        let mut count = 0;

        for record in records.values_mut() {
            if record.user_id != user_id || record.revoked {
                continue;
            }
            if scope.except_family_id.as_deref() == Some(record.family_id.as_str()) {
                continue;
            }
            if scope.except_device_id.as_deref() == Some(record.device_id.as_str()) {
                continue;
            }
            if let Some(cutoff) = scope.older_than {
                if record.created_at >= cutoff {
                    continue;
                }
            }
            record.revoke(RevocationReason::LoggedOut, now);
            count += 1;
        }

        Ok(count)
    }

    async fn count_active_in_family(&self, family_id: &str) -> Result<usize, DomainError> {
        let records = self.records.read().await;
        let now = Utc::now();
        Ok(records
            .values()
            .filter(|r| r.family_id == family_id && r.is_active(now))
            .count())
    }

    async fn delete_expired_or_revoked(
        &self,
        older_than: DateTime<Utc>,
        limit: usize,
    ) -> Result<usize, DomainError> {
        let mut records = self.records.write().await;

        let doomed: Vec<String> = records
            .values()
            .filter(|r| {
                r.expires_at < older_than
                    || (r.revoked && r.revoked_at.map_or(false, |at| at < older_than))
            })
            .take(limit)
            .map(|r| r.token_id.clone())
            .collect();

        for token_id in &doomed {
            records.remove(token_id);
        }

        Ok(doomed.len())
    }
}
