//! # SpheroSeg Core
//!
//! Core token and session lifecycle logic for the SpheroSeg backend.
//! This crate contains the domain entities, token services, store interfaces,
//! and error types behind authentication: stateless access tokens, stateful
//! refresh tokens with rotation and family-based theft detection, bulk
//! revocation, and periodic cleanup.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
