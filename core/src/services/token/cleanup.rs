//! Token cleanup service for periodic maintenance of refresh tokens
//!
//! Deletes rows that are already terminal (expired, or revoked past a grace
//! window) in bounded batches. Active records are never touched, so the job
//! cannot contend with verification or rotation for correctness.

use chrono::Duration;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::errors::DomainError;
use crate::repositories::RefreshTokenStore;

use super::clock::Clock;

/// Configuration for the token cleanup service
#[derive(Debug, Clone)]
pub struct TokenCleanupConfig {
    /// How often to run cleanup (in seconds)
    pub interval_seconds: u64,
    /// Grace period after expiry or revocation before deletion (in days)
    pub grace_period_days: i64,
    /// Maximum number of rows to delete in one batch
    pub batch_size: usize,
    /// Whether to enable automatic cleanup
    pub enabled: bool,
}

impl Default for TokenCleanupConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 3600, // Run every hour
            grace_period_days: 7,   // Keep terminal tokens for 7 days of audit
            batch_size: 1000,       // Bound each delete scan
            enabled: true,
        }
    }
}

/// Service for cleaning up terminal refresh token records
pub struct TokenCleanupService<R: RefreshTokenStore + 'static> {
    store: Arc<R>,
    clock: Arc<dyn Clock>,
    config: TokenCleanupConfig,
}

impl<R: RefreshTokenStore> TokenCleanupService<R> {
    /// Create a new token cleanup service
    pub fn new(store: Arc<R>, clock: Arc<dyn Clock>, config: TokenCleanupConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Run a single cleanup cycle
    ///
    /// # Returns
    /// * `Ok(CleanupResult)` - Summary of the cycle
    /// * `Err(DomainError)` - If cleanup fails outright
    pub async fn run_cleanup(&self) -> Result<CleanupResult, DomainError> {
        if !self.config.enabled {
            return Ok(CleanupResult::default());
        }

        info!("Starting token cleanup cycle");

        let mut result = CleanupResult::default();
        let cutoff = self.clock.now() - Duration::days(self.config.grace_period_days);

        match self
            .store
            .delete_expired_or_revoked(cutoff, self.config.batch_size)
            .await
        {
            Ok(count) => {
                result.tokens_deleted = count;
                info!("Deleted {} terminal refresh tokens", count);
            }
            Err(e) => {
                error!("Failed to clean up refresh tokens: {}", e);
                result.errors.push(format!("Token cleanup error: {}", e));
            }
        }

        Ok(result)
    }

    /// Start the cleanup service as a background task
    ///
    /// Spawns a tokio task that runs cleanup at the configured interval
    pub fn start_background_task(self: Arc<Self>) {
        if !self.config.enabled {
            warn!("Token cleanup service is disabled");
            return;
        }

        let interval = std::time::Duration::from_secs(self.config.interval_seconds);

        tokio::spawn(async move {
            info!(
                "Token cleanup service started - will run every {} seconds",
                self.config.interval_seconds
            );

            let mut interval_timer = tokio::time::interval(interval);

            loop {
                interval_timer.tick().await;

                match self.run_cleanup().await {
                    Ok(result) if !result.is_success() => {
                        warn!("Cleanup completed with errors: {:?}", result.errors);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("Token cleanup cycle failed: {}", e);
                    }
                }
            }
        });
    }
}

/// Result of a cleanup operation
#[derive(Debug, Default)]
pub struct CleanupResult {
    /// Number of terminal refresh tokens deleted
    pub tokens_deleted: usize,
    /// Any errors encountered during cleanup
    pub errors: Vec<String>,
}

impl CleanupResult {
    /// Check if the cleanup was successful (no errors)
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}
