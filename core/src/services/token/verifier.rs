//! Stateless verification of signed tokens

use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Validation};
use std::sync::Arc;

use crate::domain::entities::token::{Claims, TokenType, JWT_AUDIENCE, JWT_ISSUER};
use crate::errors::{DomainError, TokenError};

use super::clock::Clock;
use super::keys::KeyProvider;

/// Options controlling a single verification call
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyOptions {
    /// Require the structural fingerprint claim on access tokens
    pub validate_fingerprint: bool,
}

/// Validates token signatures and claims against the protocol constants
///
/// Pure apart from the key lookup; never touches the store. Access tokens
/// are not individually revocable, so this is the whole authorization check
/// for them.
#[derive(Clone)]
pub struct TokenVerifier {
    keys: Arc<KeyProvider>,
    clock: Arc<dyn Clock>,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(keys: Arc<KeyProvider>, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(keys.algorithm());
        validation.set_issuer(&[JWT_ISSUER]);
        validation.set_audience(&[JWT_AUDIENCE]);
        // exp and nbf are checked against the injected clock below, not the
        // library's wall clock
        validation.validate_exp = false;
        validation.validate_nbf = false;

        Self {
            keys,
            clock,
            validation,
        }
    }

    /// Verify a signed token of the expected kind and return its claims
    pub fn verify(
        &self,
        token: &str,
        expected: TokenType,
        opts: &VerifyOptions,
    ) -> Result<Claims, DomainError> {
        let header = decode_header(token).map_err(|_| TokenError::Invalid)?;
        let key = self.keys.resolve(header.kid.as_deref());

        let data = decode::<Claims>(token, key, &self.validation).map_err(map_decode_error)?;
        let claims = data.claims;

        let now = self.clock.now().timestamp();
        if now >= claims.exp {
            return Err(TokenError::Expired.into());
        }
        if now < claims.nbf {
            return Err(TokenError::NotYetValid.into());
        }

        if claims.token_type != expected {
            return Err(TokenError::WrongType {
                actual: claims.token_type.to_string(),
            }
            .into());
        }

        if expected == TokenType::Access
            && opts.validate_fingerprint
            && claims.fingerprint.is_none()
        {
            return Err(TokenError::Malformed {
                reason: "fingerprint claim absent".to_string(),
            }
            .into());
        }

        Ok(claims)
    }
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> DomainError {
    match err.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired.into(),
        ErrorKind::ImmatureSignature => TokenError::NotYetValid.into(),
        ErrorKind::Json(_) => TokenError::Malformed {
            reason: "claims do not deserialize".to_string(),
        }
        .into(),
        _ => TokenError::Invalid.into(),
    }
}
