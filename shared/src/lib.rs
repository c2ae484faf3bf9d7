//! Shared utilities and common types for the SpheroSeg server
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types
//! - Error response structures

pub mod config;
pub mod errors;

// Re-export commonly used items at crate root
pub use config::{AuthConfig, DatabaseConfig, JwtConfig, VerificationKey};
pub use errors::{error_codes, ApiResult, ErrorResponse, IntoErrorResponse};
