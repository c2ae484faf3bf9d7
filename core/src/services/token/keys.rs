//! Signing and verification key resolution
//!
//! Supports a ring of named HS256 secrets for key rotation. Verification
//! resolves keys in order: the header-indicated key id first, then the
//! static fallback secret; the first successful resolution wins.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use std::collections::HashMap;
use std::fmt;

use super::config::TokenServiceConfig;

/// Resolves signing and verification key material
pub struct KeyProvider {
    algorithm: Algorithm,
    active_kid: Option<String>,
    encoding_key: EncodingKey,
    ring: HashMap<String, DecodingKey>,
    fallback: DecodingKey,
}

impl KeyProvider {
    /// Build the provider from the token service configuration
    ///
    /// The preferred signing secret always doubles as the verification
    /// fallback; when an active key id is configured it is also entered into
    /// the ring so freshly signed tokens resolve by their own header.
    pub fn from_config(config: &TokenServiceConfig) -> Self {
        let mut ring = HashMap::new();
        for key in &config.verification_keys {
            ring.insert(
                key.kid.clone(),
                DecodingKey::from_secret(key.secret.as_bytes()),
            );
        }
        if let Some(kid) = &config.active_kid {
            ring.insert(
                kid.clone(),
                DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            );
        }

        Self {
            algorithm: Algorithm::HS256,
            active_kid: config.active_kid.clone(),
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            ring,
            fallback: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Key id stamped into headers of newly signed tokens
    pub fn active_kid(&self) -> Option<&str> {
        self.active_kid.as_deref()
    }

    /// Key used for signing new tokens
    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    /// Resolve the verification key for a token header
    ///
    /// A known key id wins; an unknown or absent key id falls back to the
    /// static secret.
    pub fn resolve(&self, kid: Option<&str>) -> &DecodingKey {
        if let Some(kid) = kid {
            if let Some(key) = self.ring.get(kid) {
                return key;
            }
        }
        &self.fallback
    }
}

impl fmt::Debug for KeyProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyProvider")
            .field("algorithm", &self.algorithm)
            .field("active_kid", &self.active_kid)
            .field("ring_size", &self.ring.len())
            .finish()
    }
}
