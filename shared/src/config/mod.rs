//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical business areas:
//! - `auth` - Authentication and token lifecycle configuration
//! - `database` - Database connection and pool configuration

pub mod auth;
pub mod database;

// Re-export commonly used types
pub use auth::{AuthConfig, JwtConfig, VerificationKey};
pub use database::DatabaseConfig;
