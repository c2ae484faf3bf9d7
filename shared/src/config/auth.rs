//! Authentication and token lifecycle configuration

use serde::{Deserialize, Serialize};

/// A named verification secret kept alive during signing-key rotation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerificationKey {
    /// Key id carried in the JWT header of tokens signed with this key
    pub kid: String,

    /// HMAC secret associated with the key id
    pub secret: String,
}

/// JWT authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// JWT secret key for signing tokens (also the verification fallback)
    pub secret: String,

    /// Key id stamped into the header of newly signed tokens
    #[serde(default)]
    pub active_kid: Option<String>,

    /// Older secrets still accepted for verification, looked up by key id
    #[serde(default)]
    pub verification_keys: Vec<VerificationKey>,

    /// Access token expiry time in seconds
    pub access_token_expiry: i64,

    /// Refresh token expiry time in seconds
    pub refresh_token_expiry: i64,

    /// JWT issuer claim
    pub issuer: String,

    /// JWT audience claim
    pub audience: String,

    /// Secret mixed into the one-way device hash stored with refresh tokens
    pub device_hash_key: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::from("development-secret-please-change-in-production"),
            active_kid: None,
            verification_keys: Vec::new(),
            access_token_expiry: 900,     // 15 minutes
            refresh_token_expiry: 604800, // 7 days
            issuer: String::from("spheroseg"),
            audience: String::from("spheroseg-api"),
            device_hash_key: String::from("development-device-key"),
        }
    }
}

impl JwtConfig {
    /// Create a new JWT configuration with secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Set access token expiry in minutes
    pub fn with_access_expiry_minutes(mut self, minutes: i64) -> Self {
        self.access_token_expiry = minutes * 60;
        self
    }

    /// Set refresh token expiry in days
    pub fn with_refresh_expiry_days(mut self, days: i64) -> Self {
        self.refresh_token_expiry = days * 86400;
        self
    }

    /// Register an additional verification key for rotation
    pub fn with_verification_key(
        mut self,
        kid: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        self.verification_keys.push(VerificationKey {
            kid: kid.into(),
            secret: secret.into(),
        });
        self
    }

    /// Check if using default secret (security warning)
    pub fn is_using_default_secret(&self) -> bool {
        self.secret == "development-secret-please-change-in-production"
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,

    /// Active refresh tokens allowed per family before theft is suspected
    #[serde(default = "default_max_tokens_per_family")]
    pub max_tokens_per_family: usize,

    /// Family size that triggers a monitoring warning without failing
    #[serde(default = "default_family_size_warning")]
    pub family_size_warning: usize,

    /// Require the fingerprint claim on access tokens (strict mode)
    #[serde(default)]
    pub validate_fingerprint: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt: JwtConfig::default(),
            max_tokens_per_family: default_max_tokens_per_family(),
            family_size_warning: default_family_size_warning(),
            validate_fingerprint: false,
        }
    }
}

impl AuthConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET")
            .unwrap_or_else(|_| "development-secret-please-change-in-production".to_string());
        let access_token_expiry = std::env::var("JWT_ACCESS_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "900".to_string())
            .parse()
            .unwrap_or(900);
        let refresh_token_expiry = std::env::var("JWT_REFRESH_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "604800".to_string())
            .parse()
            .unwrap_or(604800);
        let device_hash_key = std::env::var("DEVICE_HASH_KEY")
            .unwrap_or_else(|_| "development-device-key".to_string());
        let max_tokens_per_family = std::env::var("MAX_TOKENS_PER_FAMILY")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .unwrap_or_else(|_| default_max_tokens_per_family());

        Self {
            jwt: JwtConfig {
                secret,
                active_kid: std::env::var("JWT_ACTIVE_KID").ok(),
                verification_keys: Vec::new(),
                access_token_expiry,
                refresh_token_expiry,
                issuer: String::from("spheroseg"),
                audience: String::from("spheroseg-api"),
                device_hash_key,
            },
            max_tokens_per_family,
            family_size_warning: default_family_size_warning(),
            validate_fingerprint: std::env::var("JWT_VALIDATE_FINGERPRINT")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    /// Get JWT secret (backward compatibility)
    pub fn jwt_secret(&self) -> &str {
        &self.jwt.secret
    }

    /// Get access token expiry in seconds (backward compatibility)
    pub fn access_token_expiry_seconds(&self) -> i64 {
        self.jwt.access_token_expiry
    }

    /// Get refresh token expiry in seconds (backward compatibility)
    pub fn refresh_token_expiry_seconds(&self) -> i64 {
        self.jwt.refresh_token_expiry
    }
}

fn default_max_tokens_per_family() -> usize {
    5
}

fn default_family_size_warning() -> usize {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_config_default() {
        let config = JwtConfig::default();
        assert_eq!(config.access_token_expiry, 900);
        assert_eq!(config.refresh_token_expiry, 604800);
        assert_eq!(config.issuer, "spheroseg");
        assert_eq!(config.audience, "spheroseg-api");
        assert!(config.is_using_default_secret());
        assert!(config.verification_keys.is_empty());
    }

    #[test]
    fn test_jwt_config_builder() {
        let config = JwtConfig::new("my-secret")
            .with_access_expiry_minutes(30)
            .with_refresh_expiry_days(14)
            .with_verification_key("2024-01", "old-secret");

        assert_eq!(config.access_token_expiry, 1800);
        assert_eq!(config.refresh_token_expiry, 1209600);
        assert!(!config.is_using_default_secret());
        assert_eq!(config.verification_keys.len(), 1);
        assert_eq!(config.verification_keys[0].kid, "2024-01");
    }

    #[test]
    fn test_auth_config_default() {
        let config = AuthConfig::default();
        assert_eq!(config.max_tokens_per_family, 5);
        assert_eq!(config.family_size_warning, 10);
        assert!(!config.validate_fingerprint);
    }
}
