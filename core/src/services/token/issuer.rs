//! Access and refresh token issuance

use chrono::Duration;
use jsonwebtoken::{encode, Header};
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::token::{
    Claims, ClientContext, RefreshTokenRecord, TokenResponse,
};
use crate::errors::{DomainError, TokenError};
use crate::repositories::RefreshTokenStore;

use super::clock::Clock;
use super::config::TokenServiceConfig;
use super::keys::KeyProvider;

/// Length of the random fingerprint embedded in access tokens
const FINGERPRINT_LENGTH: usize = 16;

/// Hex length of the stored device hash
const DEVICE_HASH_LENGTH: usize = 32;

/// Issues signed access tokens and signed, persisted refresh tokens
pub struct TokenIssuer<R: RefreshTokenStore> {
    store: Arc<R>,
    keys: Arc<KeyProvider>,
    config: TokenServiceConfig,
    clock: Arc<dyn Clock>,
}

impl<R: RefreshTokenStore> TokenIssuer<R> {
    pub fn new(
        store: Arc<R>,
        keys: Arc<KeyProvider>,
        config: TokenServiceConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            keys,
            config,
            clock,
        }
    }

    /// Create a signed access token
    ///
    /// Pure computation: a fresh token id and fingerprint, fixed
    /// issuer/audience, no store access. Access tokens cannot be revoked
    /// early; only their short TTL bounds exposure.
    pub fn issue_access_token(
        &self,
        user_id: Uuid,
        email: &str,
        ttl: Option<Duration>,
    ) -> Result<String, DomainError> {
        let now = self.clock.now();
        let ttl = ttl.unwrap_or_else(|| self.config.access_token_ttl());
        let claims = Claims::new_access_token(user_id, email, random_fingerprint(), now, ttl);
        self.encode(&claims)
    }

    /// Create a signed refresh token backed by a persisted record
    ///
    /// A missing `family_id` starts a fresh lineage (login); rotation passes
    /// the existing one. Issuance is all-or-nothing: if persisting the record
    /// fails no token is returned, so no stateless refresh token can exist
    /// without a backing row.
    pub async fn issue_refresh_token(
        &self,
        user_id: Uuid,
        email: &str,
        family_id: Option<String>,
        ctx: &ClientContext,
    ) -> Result<String, DomainError> {
        let now = self.clock.now();
        let ttl = self.config.refresh_token_ttl();
        let token_id = Uuid::new_v4().to_string();
        let family_id = family_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let device_id = compute_device_id(&self.config.device_hash_key, user_id, ctx, &family_id);

        let claims = Claims::new_refresh_token(
            user_id, email, &token_id, &family_id, &device_id, now, ttl,
        );
        let signed = self.encode(&claims)?;

        let record =
            RefreshTokenRecord::new(token_id, family_id, device_id, user_id, ctx, now, ttl);
        self.store.insert(record).await?;

        Ok(signed)
    }

    /// Create the full token pair returned after a successful login
    pub async fn create_token_response(
        &self,
        user_id: Uuid,
        email: &str,
        ctx: &ClientContext,
    ) -> Result<TokenResponse, DomainError> {
        let access_token = self.issue_access_token(user_id, email, None)?;
        let refresh_token = self.issue_refresh_token(user_id, email, None, ctx).await?;

        Ok(TokenResponse::bearer(
            access_token,
            refresh_token,
            self.config.access_token_ttl_seconds,
        ))
    }

    fn encode(&self, claims: &Claims) -> Result<String, DomainError> {
        let mut header = Header::new(self.keys.algorithm());
        header.kid = self.keys.active_kid().map(str::to_owned);
        encode(&header, claims, self.keys.encoding_key())
            .map_err(|_| DomainError::Token(TokenError::GenerationFailed))
    }
}

impl<R: RefreshTokenStore> Clone for TokenIssuer<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            keys: Arc::clone(&self.keys),
            config: self.config.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

/// One-way keyed hash binding a refresh token to a client context
///
/// Mixes the user id, user agent, and IP address; when no IP is available
/// the family id stands in so the hash stays stable across rotations of the
/// same lineage. Raw identifiers never reach storage through this value.
pub(crate) fn compute_device_id(
    key: &str,
    user_id: Uuid,
    ctx: &ClientContext,
    family_id: &str,
) -> String {
    let user_agent = ctx.user_agent.as_deref().unwrap_or("");
    let network = ctx.ip_address.as_deref().unwrap_or(family_id);

    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hasher.update(b":");
    hasher.update(user_id.as_bytes());
    hasher.update(b":");
    hasher.update(user_agent.as_bytes());
    hasher.update(b":");
    hasher.update(network.as_bytes());

    let digest = hex::encode(hasher.finalize());
    digest[..DEVICE_HASH_LENGTH].to_string()
}

fn random_fingerprint() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(FINGERPRINT_LENGTH)
        .map(char::from)
        .collect()
}
