//! Main token service facade
//!
//! Wires the key provider, issuer, verifier, rotation coordinator, and
//! revocation service over one store and clock. The HTTP layer talks to this
//! type; the components stay individually reachable for callers that need
//! only a slice of the surface.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::token::{Claims, ClientContext, TokenResponse, TokenType};
use crate::errors::DomainError;
use crate::repositories::{RefreshTokenStore, RevocationScope};

use super::clock::{Clock, SystemClock};
use super::config::TokenServiceConfig;
use super::issuer::TokenIssuer;
use super::keys::KeyProvider;
use super::revocation::RevocationService;
use super::rotation::{RotationCoordinator, VerifiedRefresh};
use super::verifier::{TokenVerifier, VerifyOptions};

/// Service for managing JWT access tokens and persisted refresh tokens
pub struct TokenService<R: RefreshTokenStore> {
    issuer: TokenIssuer<R>,
    verifier: TokenVerifier,
    rotation: RotationCoordinator<R>,
    revocation: RevocationService<R>,
    config: TokenServiceConfig,
}

impl<R: RefreshTokenStore> TokenService<R> {
    /// Creates a new token service instance on the wall clock
    pub fn new(store: Arc<R>, config: TokenServiceConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Creates a new token service instance with an injected clock
    pub fn with_clock(
        store: Arc<R>,
        config: TokenServiceConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let keys = Arc::new(KeyProvider::from_config(&config));
        let issuer = TokenIssuer::new(
            Arc::clone(&store),
            Arc::clone(&keys),
            config.clone(),
            Arc::clone(&clock),
        );
        let verifier = TokenVerifier::new(Arc::clone(&keys), Arc::clone(&clock));
        let rotation = RotationCoordinator::new(
            Arc::clone(&store),
            issuer.clone(),
            verifier.clone(),
            config.clone(),
        );
        let revocation = RevocationService::new(store);

        Self {
            issuer,
            verifier,
            rotation,
            revocation,
            config,
        }
    }

    /// Issue the access/refresh pair returned after a successful login
    pub async fn create_token_response(
        &self,
        user_id: Uuid,
        email: &str,
        ctx: &ClientContext,
    ) -> Result<TokenResponse, DomainError> {
        self.issuer.create_token_response(user_id, email, ctx).await
    }

    /// Issue a standalone access token
    pub fn issue_access_token(
        &self,
        user_id: Uuid,
        email: &str,
        ttl: Option<chrono::Duration>,
    ) -> Result<String, DomainError> {
        self.issuer.issue_access_token(user_id, email, ttl)
    }

    /// Verify an access token, honoring the configured strict mode
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, DomainError> {
        self.verifier.verify(
            token,
            TokenType::Access,
            &VerifyOptions {
                validate_fingerprint: self.config.validate_fingerprint,
            },
        )
    }

    /// Verify a refresh token against its signature and stored record
    pub async fn verify_refresh_token(
        &self,
        token: &str,
        ctx: &ClientContext,
        strict_device_check: bool,
    ) -> Result<VerifiedRefresh, DomainError> {
        self.rotation
            .verify_refresh_token(token, ctx, strict_device_check)
            .await
    }

    /// Rotate a refresh token, returning only the new refresh token
    pub async fn rotate_refresh_token(
        &self,
        old_token: &str,
        user_id: Uuid,
        email: &str,
        ctx: &ClientContext,
    ) -> Result<String, DomainError> {
        self.rotation
            .rotate_refresh_token(old_token, user_id, email, ctx)
            .await
    }

    /// Rotate a refresh token and return the full new token pair
    pub async fn refresh_token_response(
        &self,
        old_token: &str,
        user_id: Uuid,
        email: &str,
        ctx: &ClientContext,
    ) -> Result<TokenResponse, DomainError> {
        self.rotation
            .refresh_token_response(old_token, user_id, email, ctx)
            .await
    }

    /// Revoke every refresh token of the user, honoring the scope exclusions
    pub async fn revoke_all_user_tokens(
        &self,
        user_id: Uuid,
        scope: &RevocationScope,
    ) -> Result<usize, DomainError> {
        self.revocation.revoke_all_user_tokens(user_id, scope).await
    }

    pub fn issuer(&self) -> &TokenIssuer<R> {
        &self.issuer
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    pub fn rotation(&self) -> &RotationCoordinator<R> {
        &self.rotation
    }

    pub fn revocation(&self) -> &RevocationService<R> {
        &self.revocation
    }

    pub fn config(&self) -> &TokenServiceConfig {
        &self.config
    }
}
