//! Refresh token rotation and theft detection

use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::domain::entities::token::{
    Claims, ClientContext, RefreshTokenRecord, TokenResponse, TokenType,
};
use crate::errors::{DomainError, TokenError};
use crate::repositories::RefreshTokenStore;

use super::config::TokenServiceConfig;
use super::issuer::{compute_device_id, TokenIssuer};
use super::verifier::{TokenVerifier, VerifyOptions};

/// A refresh token that passed signature and store validation
#[derive(Debug, Clone)]
pub struct VerifiedRefresh {
    pub claims: Claims,
    pub record: RefreshTokenRecord,
}

/// Orchestrates verify, conditional revoke, and reissue of refresh tokens
pub struct RotationCoordinator<R: RefreshTokenStore> {
    store: Arc<R>,
    issuer: TokenIssuer<R>,
    verifier: TokenVerifier,
    config: TokenServiceConfig,
}

impl<R: RefreshTokenStore> RotationCoordinator<R> {
    pub fn new(
        store: Arc<R>,
        issuer: TokenIssuer<R>,
        verifier: TokenVerifier,
        config: TokenServiceConfig,
    ) -> Self {
        Self {
            store,
            issuer,
            verifier,
            config,
        }
    }

    /// Validate a refresh token against its signature and stored record
    ///
    /// A revoked record is the theft-signal case: a token replayed after
    /// rotation lands here, and the caller should treat it as grounds for
    /// revoking the whole lineage.
    pub async fn verify_refresh_token(
        &self,
        token: &str,
        ctx: &ClientContext,
        strict_device_check: bool,
    ) -> Result<VerifiedRefresh, DomainError> {
        let claims = self
            .verifier
            .verify(token, TokenType::Refresh, &VerifyOptions::default())?;

        let family_id = claims.fid.clone().ok_or(TokenError::MissingClaim {
            claim: "fid".to_string(),
        })?;
        let device_id = claims.device.clone().ok_or(TokenError::MissingClaim {
            claim: "device".to_string(),
        })?;
        let user_id = claims.user_id().map_err(|_| TokenError::Malformed {
            reason: "subject is not a valid user id".to_string(),
        })?;

        let record = self
            .store
            .find_active_by_token_id(&claims.jti)
            .await?
            .ok_or(TokenError::NotFound)?;

        if record.revoked {
            warn!(
                family_id = %record.family_id,
                user_id = %record.user_id,
                "revoked refresh token presented; possible token replay"
            );
            return Err(TokenError::Revoked.into());
        }

        if record.user_id != user_id {
            return Err(TokenError::UserMismatch.into());
        }
        // The lookup key is the verified jti, so a disagreement here means a
        // corrupted or foreign row
        if claims.jti != record.token_id {
            return Err(TokenError::TokenIdMismatch.into());
        }
        if family_id != record.family_id {
            return Err(TokenError::FamilyMismatch.into());
        }

        if strict_device_check {
            let expected =
                compute_device_id(&self.config.device_hash_key, user_id, ctx, &record.family_id);
            if expected != device_id && expected != record.device_id {
                return Err(TokenError::DeviceMismatch.into());
            }
        }

        let active = self.store.count_active_in_family(&record.family_id).await?;
        if active > self.config.family_size_warning {
            warn!(
                family_id = %record.family_id,
                active,
                "refresh token family unusually large"
            );
        }

        Ok(VerifiedRefresh { claims, record })
    }

    /// Exchange a refresh token for a new one in the same lineage
    ///
    /// The conditional revoke of the old token decides races: of any number
    /// of concurrent calls presenting the same token, exactly one proceeds to
    /// reissue. When the family holds suspiciously many active tokens the
    /// whole lineage is revoked and the new token starts a fresh family.
    pub async fn rotate_refresh_token(
        &self,
        old_token: &str,
        user_id: Uuid,
        email: &str,
        ctx: &ClientContext,
    ) -> Result<String, DomainError> {
        let verified = self.verify_refresh_token(old_token, ctx, false).await?;

        if verified.record.user_id != user_id {
            return Err(TokenError::UserMismatch.into());
        }

        if !self
            .store
            .conditional_revoke(&verified.record.token_id)
            .await?
        {
            warn!(
                token_id = %verified.record.token_id,
                "lost rotation race; refusing to reissue"
            );
            return Err(TokenError::ConcurrentRotation.into());
        }

        let family_id = verified.record.family_id.clone();
        let active = self.store.count_active_in_family(&family_id).await?;
        if active >= self.config.max_tokens_per_family {
            warn!(
                family_id = %family_id,
                active,
                max = self.config.max_tokens_per_family,
                "too many active tokens in family; revoking lineage"
            );
            self.store.revoke_family(&family_id).await?;
            return self.issuer.issue_refresh_token(user_id, email, None, ctx).await;
        }

        self.issuer
            .issue_refresh_token(user_id, email, Some(family_id), ctx)
            .await
    }

    /// Rotate and return the full token pair for the refresh endpoint
    pub async fn refresh_token_response(
        &self,
        old_token: &str,
        user_id: Uuid,
        email: &str,
        ctx: &ClientContext,
    ) -> Result<TokenResponse, DomainError> {
        let refresh_token = self
            .rotate_refresh_token(old_token, user_id, email, ctx)
            .await?;
        let access_token = self.issuer.issue_access_token(user_id, email, None)?;

        Ok(TokenResponse::bearer(
            access_token,
            refresh_token,
            self.config.access_token_ttl_seconds,
        ))
    }
}
