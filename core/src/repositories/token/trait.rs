//! Refresh token store trait defining the interface for token persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::token::RefreshTokenRecord;
use crate::errors::DomainError;

/// Exclusions applied to a bulk revocation
///
/// Used on logout-everywhere and password change to spare, for example, the
/// session performing the operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevocationScope {
    /// Leave every record in this family untouched
    pub except_family_id: Option<String>,

    /// Leave every record bound to this device untouched
    pub except_device_id: Option<String>,

    /// Only revoke records created before this instant
    pub older_than: Option<DateTime<Utc>>,
}

impl RevocationScope {
    /// Scope matching every record of the user
    pub fn all() -> Self {
        Self::default()
    }

    pub fn except_family(family_id: impl Into<String>) -> Self {
        Self {
            except_family_id: Some(family_id.into()),
            ..Self::default()
        }
    }

    pub fn except_device(device_id: impl Into<String>) -> Self {
        Self {
            except_device_id: Some(device_id.into()),
            ..Self::default()
        }
    }
}

/// Store contract for RefreshTokenRecord persistence operations
///
/// Implementations manage the single token-record table behind refresh token
/// rotation. Revocation must be conditional at the storage level so rotation
/// stays race-safe without external locks.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Persist a new refresh token record
    ///
    /// # Returns
    /// * `Ok(RefreshTokenRecord)` - The saved record
    /// * `Err(DomainError)` - Save failed (e.g., duplicate token id)
    async fn insert(&self, record: RefreshTokenRecord) -> Result<RefreshTokenRecord, DomainError>;

    /// Find an unexpired record by its token id
    ///
    /// Revoked records are still returned as long as they have not expired,
    /// so callers can tell replay of a rotated token apart from an unknown
    /// one. Expired records are treated as absent.
    ///
    /// # Returns
    /// * `Ok(Some(RefreshTokenRecord))` - Record found and not expired
    /// * `Ok(None)` - No record, or the record has expired
    async fn find_active_by_token_id(
        &self,
        token_id: &str,
    ) -> Result<Option<RefreshTokenRecord>, DomainError>;

    /// Revoke the record only if it is currently unrevoked
    ///
    /// Compare-and-swap: returns whether *this* call performed the
    /// revocation. Exactly one of any number of concurrent callers observes
    /// `true`; the others must fail closed and must not retry with the same
    /// token.
    ///
    /// # Returns
    /// * `Ok(true)` - This call revoked the record
    /// * `Ok(false)` - The record was already revoked or does not exist
    async fn conditional_revoke(&self, token_id: &str) -> Result<bool, DomainError>;

    /// Revoke every unrevoked record in a family
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records revoked
    async fn revoke_family(&self, family_id: &str) -> Result<usize, DomainError>;

    /// Revoke every unrevoked record of a user, honoring the scope exclusions
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records revoked
    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        scope: &RevocationScope,
    ) -> Result<usize, DomainError>;

    /// Count unrevoked, unexpired records in a family
    async fn count_active_in_family(&self, family_id: &str) -> Result<usize, DomainError>;

    /// Delete records that are expired or revoked and older than the cutoff
    ///
    /// At most `limit` rows are removed per call to bound the scan. Active
    /// records are never deleted, whatever the arguments.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records deleted
    async fn delete_expired_or_revoked(
        &self,
        older_than: DateTime<Utc>,
        limit: usize,
    ) -> Result<usize, DomainError>;
}
