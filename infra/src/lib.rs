//! # Infrastructure Layer
//!
//! This crate implements the infrastructure layer for the SpheroSeg token
//! core: concrete MySQL persistence for refresh token records, built with
//! SQLx, plus connection-pool management.
//!
//! The domain logic lives in `seg_core`; this crate only supplies the store
//! the core is generic over.

pub mod database;

// Re-export commonly used types
pub use database::{DatabasePool, MySqlTokenStore};

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
