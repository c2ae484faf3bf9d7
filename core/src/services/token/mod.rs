//! Token service module for JWT and session lifecycle management
//!
//! This module handles all token-related operations:
//! - Access token issuance and verification
//! - Refresh token issuance, rotation, and theft detection
//! - Bulk revocation of user sessions
//! - Background cleanup of terminal tokens
//! - Signing key resolution with rotation support

mod cleanup;
mod clock;
mod config;
mod issuer;
mod keys;
mod revocation;
mod rotation;
mod service;
mod verifier;

#[cfg(test)]
mod tests;

pub use cleanup::{CleanupResult, TokenCleanupConfig, TokenCleanupService};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::TokenServiceConfig;
pub use issuer::TokenIssuer;
pub use keys::KeyProvider;
pub use revocation::RevocationService;
pub use rotation::{RotationCoordinator, VerifiedRefresh};
pub use service::TokenService;
pub use verifier::{TokenVerifier, VerifyOptions};
