//! Token entities for JWT-based authentication.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Access token expiration time (15 minutes)
pub const ACCESS_TOKEN_EXPIRY_SECONDS: i64 = 15 * 60;

/// Refresh token expiration time (7 days)
pub const REFRESH_TOKEN_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// JWT issuer
pub const JWT_ISSUER: &str = "spheroseg";

/// JWT audience
pub const JWT_AUDIENCE: &str = "spheroseg-api";

/// Current access token payload format version
pub const TOKEN_FORMAT_VERSION: u32 = 1;

/// Stored user agents are truncated to this length
pub const MAX_USER_AGENT_LENGTH: usize = 255;

/// Stored IP addresses are truncated to this length
pub const MAX_IP_ADDRESS_LENGTH: usize = 45;

/// Kind of signed token, carried in the `type` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    #[serde(rename = "ACCESS")]
    Access,
    #[serde(rename = "REFRESH")]
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "ACCESS",
            TokenType::Refresh => "REFRESH",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims structure for JWT payload
///
/// One shape serves both token kinds: access tokens carry `fingerprint` and
/// `ver`, refresh tokens carry `fid` and `device`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// User email
    pub email: String,

    /// Token kind
    #[serde(rename = "type")]
    pub token_type: TokenType,

    /// JWT ID (unique identifier for the token)
    pub jti: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Not before timestamp
    pub nbf: i64,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Random opaque string bound to this access token; never persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,

    /// Access token payload format version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ver: Option<u32>,

    /// Refresh token family (lineage) id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fid: Option<String>,

    /// Refresh token device binding hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

impl Claims {
    /// Creates new claims for an access token
    pub fn new_access_token(
        user_id: Uuid,
        email: impl Into<String>,
        fingerprint: String,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub: user_id.to_string(),
            email: email.into(),
            token_type: TokenType::Access,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            nbf: now.timestamp(),
            iss: JWT_ISSUER.to_string(),
            aud: JWT_AUDIENCE.to_string(),
            fingerprint: Some(fingerprint),
            ver: Some(TOKEN_FORMAT_VERSION),
            fid: None,
            device: None,
        }
    }

    /// Creates new claims for a refresh token
    ///
    /// The `token_id` becomes the `jti` claim and must match the persisted
    /// record so the store lookup key is carried inside the signature.
    pub fn new_refresh_token(
        user_id: Uuid,
        email: impl Into<String>,
        token_id: impl Into<String>,
        family_id: impl Into<String>,
        device_id: impl Into<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub: user_id.to_string(),
            email: email.into(),
            token_type: TokenType::Refresh,
            jti: token_id.into(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            nbf: now.timestamp(),
            iss: JWT_ISSUER.to_string(),
            aud: JWT_AUDIENCE.to_string(),
            fingerprint: None,
            ver: None,
            fid: Some(family_id.into()),
            device: Some(device_id.into()),
        }
    }

    /// Checks whether the claims have expired at the given instant
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// Checks whether the claims are inside their validity window
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        let ts = now.timestamp();
        ts >= self.nbf && ts < self.exp
    }

    /// Gets the user ID from the claims
    pub fn user_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.sub)
    }
}

/// Why a persisted refresh token was revoked
///
/// Terminal states stay distinguishable in storage for audit: rotation,
/// explicit revocation, and natural expiry (derived from `expires_at`) are
/// all equivalent for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationReason {
    /// Superseded by a newer token in the same family
    Rotated,
    /// Family-wide revocation after a theft signal
    TheftSuspected,
    /// Bulk revocation (logout everywhere, password change)
    LoggedOut,
}

impl RevocationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevocationReason::Rotated => "rotated",
            RevocationReason::TheftSuspected => "theft",
            RevocationReason::LoggedOut => "logout",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "rotated" => Some(RevocationReason::Rotated),
            "theft" => Some(RevocationReason::TheftSuspected),
            "logout" => Some(RevocationReason::LoggedOut),
            _ => None,
        }
    }
}

impl fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best-effort client context captured from the request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientContext {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

impl ClientContext {
    pub fn new(
        user_agent: Option<impl Into<String>>,
        ip_address: Option<impl Into<String>>,
    ) -> Self {
        Self {
            user_agent: user_agent.map(Into::into),
            ip_address: ip_address.map(Into::into),
        }
    }
}

/// Refresh token record persisted in the database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    /// Unique identifier, equal to the refresh JWT's `jti` claim
    pub token_id: String,

    /// Groups all tokens descended from one login; stable across rotations
    pub family_id: String,

    /// One-way hash binding the token to a client context
    pub device_id: String,

    /// User this token belongs to
    pub user_id: Uuid,

    /// Truncated user agent, best effort
    pub user_agent: Option<String>,

    /// Truncated IP address, best effort
    pub ip_address: Option<String>,

    /// Timestamp when the token was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the token expires
    pub expires_at: DateTime<Utc>,

    /// Whether the token has been revoked
    pub revoked: bool,

    /// When the token was revoked, if it was
    pub revoked_at: Option<DateTime<Utc>>,

    /// Why the token was revoked, if it was
    pub revoked_reason: Option<RevocationReason>,
}

impl RefreshTokenRecord {
    /// Creates a new active refresh token record
    pub fn new(
        token_id: impl Into<String>,
        family_id: impl Into<String>,
        device_id: impl Into<String>,
        user_id: Uuid,
        ctx: &ClientContext,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            token_id: token_id.into(),
            family_id: family_id.into(),
            device_id: device_id.into(),
            user_id,
            user_agent: ctx
                .user_agent
                .as_deref()
                .map(|ua| truncate(ua, MAX_USER_AGENT_LENGTH)),
            ip_address: ctx
                .ip_address
                .as_deref()
                .map(|ip| truncate(ip, MAX_IP_ADDRESS_LENGTH)),
            created_at: now,
            expires_at: now + ttl,
            revoked: false,
            revoked_at: None,
            revoked_reason: None,
        }
    }

    /// Checks whether the record has expired at the given instant
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// A record is active when it is neither revoked nor expired
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && !self.is_expired(now)
    }

    /// Marks the record revoked
    pub fn revoke(&mut self, reason: RevocationReason, now: DateTime<Utc>) {
        self.revoked = true;
        self.revoked_at = Some(now);
        self.revoked_reason = Some(reason);
    }
}

/// Token pair returned to the client after login or refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// JWT access token
    pub access_token: String,

    /// JWT refresh token
    pub refresh_token: String,

    /// Access token expiry time in seconds
    pub expires_in: i64,

    /// Token scheme, always "Bearer"
    pub token_type: String,
}

impl TokenResponse {
    /// Creates a bearer token response
    pub fn bearer(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_in,
            token_type: "Bearer".to_string(),
        }
    }
}

fn truncate(value: &str, max: usize) -> String {
    if value.len() <= max {
        return value.to_string();
    }
    // Back off to a char boundary so multi-byte user agents cannot panic
    let mut end = max;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_access_token_claims() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new_access_token(
            user_id,
            "researcher@example.com",
            "fp-1234".to_string(),
            now(),
            Duration::seconds(ACCESS_TOKEN_EXPIRY_SECONDS),
        );

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.iss, JWT_ISSUER);
        assert_eq!(claims.aud, JWT_AUDIENCE);
        assert_eq!(claims.fingerprint.as_deref(), Some("fp-1234"));
        assert_eq!(claims.ver, Some(TOKEN_FORMAT_VERSION));
        assert_eq!(claims.fid, None);
        assert!(claims.is_valid(now()));
        assert!(!claims.is_expired(now()));
    }

    #[test]
    fn test_refresh_token_claims() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new_refresh_token(
            user_id,
            "researcher@example.com",
            "tok-1",
            "fam-1",
            "dev-1",
            now(),
            Duration::seconds(REFRESH_TOKEN_EXPIRY_SECONDS),
        );

        assert_eq!(claims.token_type, TokenType::Refresh);
        assert_eq!(claims.jti, "tok-1");
        assert_eq!(claims.fid.as_deref(), Some("fam-1"));
        assert_eq!(claims.device.as_deref(), Some("dev-1"));
        assert_eq!(claims.fingerprint, None);
        assert!(claims.is_valid(now()));
    }

    #[test]
    fn test_claims_expiration_window() {
        let user_id = Uuid::new_v4();
        let issued = now();
        let claims = Claims::new_access_token(
            user_id,
            "a@b.c",
            "fp".to_string(),
            issued,
            Duration::seconds(1),
        );

        assert!(!claims.is_expired(issued));
        assert!(claims.is_expired(issued + Duration::seconds(1)));
        assert!(!claims.is_valid(issued - Duration::seconds(5)));
    }

    #[test]
    fn test_claims_type_claim_serialization() {
        let claims = Claims::new_access_token(
            Uuid::new_v4(),
            "a@b.c",
            "fp".to_string(),
            now(),
            Duration::seconds(60),
        );

        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("\"type\":\"ACCESS\""));
        // Refresh-only claims are omitted entirely
        assert!(!json.contains("\"fid\""));
        assert!(!json.contains("\"device\""));

        let deserialized: Claims = serde_json::from_str(&json).unwrap();
        assert_eq!(claims, deserialized);
    }

    #[test]
    fn test_record_creation_truncates_context() {
        let ctx = ClientContext::new(Some("ua".repeat(300)), Some("1".repeat(100)));
        let record = RefreshTokenRecord::new(
            "tok",
            "fam",
            "dev",
            Uuid::new_v4(),
            &ctx,
            now(),
            Duration::seconds(REFRESH_TOKEN_EXPIRY_SECONDS),
        );

        assert_eq!(record.user_agent.as_ref().unwrap().len(), MAX_USER_AGENT_LENGTH);
        assert_eq!(record.ip_address.as_ref().unwrap().len(), MAX_IP_ADDRESS_LENGTH);
        assert!(!record.revoked);
        assert_eq!(record.revoked_reason, None);
    }

    #[test]
    fn test_record_revocation() {
        let ts = now();
        let mut record = RefreshTokenRecord::new(
            "tok",
            "fam",
            "dev",
            Uuid::new_v4(),
            &ClientContext::default(),
            ts,
            Duration::seconds(60),
        );

        assert!(record.is_active(ts));

        record.revoke(RevocationReason::Rotated, ts);

        assert!(record.revoked);
        assert_eq!(record.revoked_at, Some(ts));
        assert_eq!(record.revoked_reason, Some(RevocationReason::Rotated));
        assert!(!record.is_active(ts));
    }

    #[test]
    fn test_record_expiry() {
        let ts = now();
        let record = RefreshTokenRecord::new(
            "tok",
            "fam",
            "dev",
            Uuid::new_v4(),
            &ClientContext::default(),
            ts - Duration::days(8),
            Duration::days(7),
        );

        assert!(record.is_expired(ts));
        assert!(!record.is_active(ts));
    }

    #[test]
    fn test_revocation_reason_round_trip() {
        for reason in [
            RevocationReason::Rotated,
            RevocationReason::TheftSuspected,
            RevocationReason::LoggedOut,
        ] {
            assert_eq!(RevocationReason::parse(reason.as_str()), Some(reason));
        }
        assert_eq!(RevocationReason::parse("unknown"), None);
    }

    #[test]
    fn test_token_response() {
        let response = TokenResponse::bearer("access".to_string(), "refresh".to_string(), 900);

        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 900);

        let json = serde_json::to_string(&response).unwrap();
        let deserialized: TokenResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(response, deserialized);
    }
}
