//! MySQL implementation of the RefreshTokenStore trait.
//!
//! Persists refresh token records with SQLx. Revocation paths are written as
//! guarded UPDATEs so the affected-row count carries the compare-and-swap
//! outcome; no locking happens above the database.
//!
//! Expected schema (see `infra/migrations`):
//!
//! ```sql
//! CREATE TABLE refresh_tokens (
//!     token_id       CHAR(36)     PRIMARY KEY,
//!     family_id      CHAR(36)     NOT NULL,
//!     device_id      VARCHAR(64)  NOT NULL,
//!     user_id        CHAR(36)     NOT NULL,
//!     user_agent     VARCHAR(255) NULL,
//!     ip_address     VARCHAR(45)  NULL,
//!     created_at     DATETIME(6)  NOT NULL,
//!     expires_at     DATETIME(6)  NOT NULL,
//!     revoked        BOOLEAN      NOT NULL DEFAULT FALSE,
//!     revoked_at     DATETIME(6)  NULL,
//!     revoked_reason VARCHAR(16)  NULL
//! );
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use seg_core::domain::entities::token::{RefreshTokenRecord, RevocationReason};
use seg_core::errors::DomainError;
use seg_core::repositories::{RefreshTokenStore, RevocationScope};

const RECORD_COLUMNS: &str = "token_id, family_id, device_id, user_id, user_agent, ip_address, \
                              created_at, expires_at, revoked, revoked_at, revoked_reason";

/// MySQL implementation of RefreshTokenStore
pub struct MySqlTokenStore {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlTokenStore {
    /// Create a new MySQL token store
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert a database row to a RefreshTokenRecord entity
    fn row_to_record(row: &sqlx::mysql::MySqlRow) -> Result<RefreshTokenRecord, DomainError> {
        let user_id: String = row
            .try_get("user_id")
            .map_err(|e| DomainError::storage(format!("Failed to get user_id: {}", e)))?;
        let revoked_reason: Option<String> = row
            .try_get("revoked_reason")
            .map_err(|e| DomainError::storage(format!("Failed to get revoked_reason: {}", e)))?;

        Ok(RefreshTokenRecord {
            token_id: row
                .try_get("token_id")
                .map_err(|e| DomainError::storage(format!("Failed to get token_id: {}", e)))?,
            family_id: row
                .try_get("family_id")
                .map_err(|e| DomainError::storage(format!("Failed to get family_id: {}", e)))?,
            device_id: row
                .try_get("device_id")
                .map_err(|e| DomainError::storage(format!("Failed to get device_id: {}", e)))?,
            user_id: Uuid::parse_str(&user_id)
                .map_err(|e| DomainError::storage(format!("Invalid user UUID: {}", e)))?,
            user_agent: row
                .try_get("user_agent")
                .map_err(|e| DomainError::storage(format!("Failed to get user_agent: {}", e)))?,
            ip_address: row
                .try_get("ip_address")
                .map_err(|e| DomainError::storage(format!("Failed to get ip_address: {}", e)))?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(|e| DomainError::storage(format!("Failed to get created_at: {}", e)))?,
            expires_at: row
                .try_get::<DateTime<Utc>, _>("expires_at")
                .map_err(|e| DomainError::storage(format!("Failed to get expires_at: {}", e)))?,
            revoked: row
                .try_get("revoked")
                .map_err(|e| DomainError::storage(format!("Failed to get revoked: {}", e)))?,
            revoked_at: row
                .try_get::<Option<DateTime<Utc>>, _>("revoked_at")
                .map_err(|e| DomainError::storage(format!("Failed to get revoked_at: {}", e)))?,
            revoked_reason: revoked_reason.as_deref().and_then(RevocationReason::parse),
        })
    }
}

/// Extra WHERE conditions for a scoped bulk revocation, in bind order
fn scope_conditions(scope: &RevocationScope) -> String {
    let mut conditions = String::new();
    if scope.except_family_id.is_some() {
        conditions.push_str(" AND family_id <> ?");
    }
    if scope.except_device_id.is_some() {
        conditions.push_str(" AND device_id <> ?");
    }
    if scope.older_than.is_some() {
        conditions.push_str(" AND created_at < ?");
    }
    conditions
}

#[async_trait]
impl RefreshTokenStore for MySqlTokenStore {
    async fn insert(&self, record: RefreshTokenRecord) -> Result<RefreshTokenRecord, DomainError> {
        let query = r#"
            INSERT INTO refresh_tokens (
                token_id, family_id, device_id, user_id, user_agent, ip_address,
                created_at, expires_at, revoked, revoked_at, revoked_reason
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(&record.token_id)
            .bind(&record.family_id)
            .bind(&record.device_id)
            .bind(record.user_id.to_string())
            .bind(&record.user_agent)
            .bind(&record.ip_address)
            .bind(record.created_at)
            .bind(record.expires_at)
            .bind(record.revoked)
            .bind(record.revoked_at)
            .bind(record.revoked_reason.map(|r| r.as_str()))
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to insert refresh token: {}", e)))?;

        Ok(record)
    }

    async fn find_active_by_token_id(
        &self,
        token_id: &str,
    ) -> Result<Option<RefreshTokenRecord>, DomainError> {
        let query = format!(
            "SELECT {RECORD_COLUMNS} FROM refresh_tokens \
             WHERE token_id = ? AND expires_at > ? LIMIT 1"
        );

        let result = sqlx::query(&query)
            .bind(token_id)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to find refresh token: {}", e)))?;

        match result {
            Some(row) => Ok(Some(Self::row_to_record(&row)?)),
            None => Ok(None),
        }
    }

    async fn conditional_revoke(&self, token_id: &str) -> Result<bool, DomainError> {
        // The revoked = FALSE guard makes this a compare-and-swap; a caller
        // that lost the race observes zero affected rows
        let query = r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = ?, revoked_reason = 'rotated'
            WHERE token_id = ? AND revoked = FALSE
        "#;

        let result = sqlx::query(query)
            .bind(Utc::now())
            .bind(token_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to revoke refresh token: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_family(&self, family_id: &str) -> Result<usize, DomainError> {
        let query = r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = ?, revoked_reason = 'theft'
            WHERE family_id = ? AND revoked = FALSE
        "#;

        let result = sqlx::query(query)
            .bind(Utc::now())
            .bind(family_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to revoke token family: {}", e)))?;

        Ok(result.rows_affected() as usize)
    }

    async fn revoke_all_for_user(
        &self,
        user_id: Uuid,
        scope: &RevocationScope,
    ) -> Result<usize, DomainError> {
        let query = format!(
            "UPDATE refresh_tokens \
             SET revoked = TRUE, revoked_at = ?, revoked_reason = 'logout' \
             WHERE user_id = ? AND revoked = FALSE{}",
            scope_conditions(scope)
        );

        let mut q = sqlx::query(&query).bind(Utc::now()).bind(user_id.to_string());
        if let Some(family_id) = &scope.except_family_id {
            q = q.bind(family_id);
        }
        if let Some(device_id) = &scope.except_device_id {
            q = q.bind(device_id);
        }
        if let Some(older_than) = scope.older_than {
            q = q.bind(older_than);
        }

        let result = q
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to revoke user tokens: {}", e)))?;

        Ok(result.rows_affected() as usize)
    }

    async fn count_active_in_family(&self, family_id: &str) -> Result<usize, DomainError> {
        let query = r#"
            SELECT COUNT(*) AS active FROM refresh_tokens
            WHERE family_id = ? AND revoked = FALSE AND expires_at > ?
        "#;

        let row = sqlx::query(query)
            .bind(family_id)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count family tokens: {}", e)))?;

        let active: i64 = row
            .try_get("active")
            .map_err(|e| DomainError::storage(format!("Failed to get count: {}", e)))?;

        Ok(active as usize)
    }

    async fn delete_expired_or_revoked(
        &self,
        older_than: DateTime<Utc>,
        limit: usize,
    ) -> Result<usize, DomainError> {
        // Active rows match neither branch, so they survive any arguments
        let query = r#"
            DELETE FROM refresh_tokens
            WHERE (expires_at < ?) OR (revoked = TRUE AND revoked_at < ?)
            LIMIT ?
        "#;

        let result = sqlx::query(query)
            .bind(older_than)
            .bind(older_than)
            .bind(limit as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete terminal tokens: {}", e)))?;

        Ok(result.rows_affected() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_scope_conditions_empty_scope() {
        assert_eq!(scope_conditions(&RevocationScope::all()), "");
    }

    #[test]
    fn test_scope_conditions_orders_binds() {
        let scope = RevocationScope {
            except_family_id: Some("fam".to_string()),
            except_device_id: Some("dev".to_string()),
            older_than: Some(Utc::now() - Duration::days(1)),
        };
        assert_eq!(
            scope_conditions(&scope),
            " AND family_id <> ? AND device_id <> ? AND created_at < ?"
        );
    }

    #[test]
    fn test_scope_conditions_partial_scope() {
        let scope = RevocationScope::except_device("dev");
        assert_eq!(scope_conditions(&scope), " AND device_id <> ?");
    }
}
