//! Configuration for the token services

use chrono::Duration;
use seg_shared::config::{AuthConfig, VerificationKey};

/// Configuration for the token services
#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    /// JWT signing secret (also the verification fallback)
    pub jwt_secret: String,

    /// Key id stamped into headers of newly signed tokens
    pub active_kid: Option<String>,

    /// Older secrets still accepted for verification, looked up by key id
    pub verification_keys: Vec<VerificationKey>,

    /// Access token expiry in seconds
    pub access_token_ttl_seconds: i64,

    /// Refresh token expiry in seconds
    pub refresh_token_ttl_seconds: i64,

    /// Secret mixed into the one-way device hash
    pub device_hash_key: String,

    /// Active refresh tokens allowed per family before theft is suspected
    pub max_tokens_per_family: usize,

    /// Family size that triggers a monitoring warning without failing
    pub family_size_warning: usize,

    /// Require the fingerprint claim on access tokens (strict mode)
    pub validate_fingerprint: bool,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "development-secret-please-change-in-production".to_string(),
            active_kid: None,
            verification_keys: Vec::new(),
            access_token_ttl_seconds: crate::domain::entities::token::ACCESS_TOKEN_EXPIRY_SECONDS,
            refresh_token_ttl_seconds: crate::domain::entities::token::REFRESH_TOKEN_EXPIRY_SECONDS,
            device_hash_key: "development-device-key".to_string(),
            max_tokens_per_family: 5,
            family_size_warning: 10,
            validate_fingerprint: false,
        }
    }
}

impl TokenServiceConfig {
    /// Build from the application-level auth configuration
    pub fn from_auth_config(config: &AuthConfig) -> Self {
        Self {
            jwt_secret: config.jwt.secret.clone(),
            active_kid: config.jwt.active_kid.clone(),
            verification_keys: config.jwt.verification_keys.clone(),
            access_token_ttl_seconds: config.jwt.access_token_expiry,
            refresh_token_ttl_seconds: config.jwt.refresh_token_expiry,
            device_hash_key: config.jwt.device_hash_key.clone(),
            max_tokens_per_family: config.max_tokens_per_family,
            family_size_warning: config.family_size_warning,
            validate_fingerprint: config.validate_fingerprint,
        }
    }

    pub fn access_token_ttl(&self) -> Duration {
        Duration::seconds(self.access_token_ttl_seconds)
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::seconds(self.refresh_token_ttl_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = TokenServiceConfig::default();
        assert_eq!(config.max_tokens_per_family, 5);
        assert_eq!(config.family_size_warning, 10);
        assert_eq!(config.access_token_ttl(), Duration::seconds(900));
    }

    #[test]
    fn test_from_auth_config() {
        let auth = AuthConfig::default();
        let config = TokenServiceConfig::from_auth_config(&auth);
        assert_eq!(config.jwt_secret, auth.jwt.secret);
        assert_eq!(config.access_token_ttl_seconds, auth.jwt.access_token_expiry);
        assert_eq!(config.refresh_token_ttl_seconds, auth.jwt.refresh_token_expiry);
    }
}
