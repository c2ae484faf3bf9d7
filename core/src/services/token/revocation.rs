//! Bulk revocation of user sessions

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::errors::DomainError;
use crate::repositories::{RefreshTokenStore, RevocationScope};

/// Revokes refresh tokens in bulk
///
/// Used on logout-everywhere and password change; the scope exclusions let
/// the caller spare the session performing the operation.
pub struct RevocationService<R: RefreshTokenStore> {
    store: Arc<R>,
}

impl<R: RefreshTokenStore> RevocationService<R> {
    pub fn new(store: Arc<R>) -> Self {
        Self { store }
    }

    /// Revoke every active refresh token of the user, honoring the scope
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of tokens revoked
    pub async fn revoke_all_user_tokens(
        &self,
        user_id: Uuid,
        scope: &RevocationScope,
    ) -> Result<usize, DomainError> {
        let revoked = self.store.revoke_all_for_user(user_id, scope).await?;
        info!(%user_id, revoked, "bulk-revoked refresh tokens");
        Ok(revoked)
    }
}

impl<R: RefreshTokenStore> Clone for RevocationService<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}
