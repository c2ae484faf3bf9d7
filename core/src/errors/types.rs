//! Token failure taxonomy
//!
//! Every verification and rotation failure is a typed kind so callers can
//! pattern-match instead of parsing messages. The presentation layer maps
//! each kind to a user-safe code; messages here never name which claim or
//! record field disagreed beyond what the client may learn.

use seg_shared::errors::{error_codes, ErrorResponse};
use thiserror::Error;

/// Token-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("Token not yet valid")]
    NotYetValid,

    #[error("Unexpected token type: {actual}")]
    WrongType { actual: String },

    #[error("Malformed token: {reason}")]
    Malformed { reason: String },

    #[error("Missing required claim: {claim}")]
    MissingClaim { claim: String },

    #[error("Refresh token not found")]
    NotFound,

    #[error("Token revoked")]
    Revoked,

    #[error("Token does not belong to this user")]
    UserMismatch,

    #[error("Token id does not match stored record")]
    TokenIdMismatch,

    #[error("Token family does not match stored record")]
    FamilyMismatch,

    #[error("Device binding mismatch")]
    DeviceMismatch,

    #[error("Token already rotated by a concurrent request")]
    ConcurrentRotation,

    #[error("Token generation failed")]
    GenerationFailed,
}

impl TokenError {
    /// Stable machine-readable code for the presentation layer
    pub fn code(&self) -> &'static str {
        match self {
            TokenError::Expired => error_codes::TOKEN_EXPIRED,
            TokenError::Invalid => error_codes::TOKEN_INVALID,
            TokenError::NotYetValid => error_codes::TOKEN_NOT_YET_VALID,
            TokenError::WrongType { .. } => error_codes::WRONG_TOKEN_TYPE,
            TokenError::Malformed { .. } => error_codes::TOKEN_MALFORMED,
            TokenError::MissingClaim { .. } => error_codes::MISSING_CLAIM,
            TokenError::NotFound => error_codes::REFRESH_TOKEN_NOT_FOUND,
            TokenError::Revoked => error_codes::TOKEN_REVOKED,
            TokenError::UserMismatch => error_codes::TOKEN_USER_MISMATCH,
            TokenError::TokenIdMismatch => error_codes::TOKEN_ID_MISMATCH,
            TokenError::FamilyMismatch => error_codes::TOKEN_FAMILY_MISMATCH,
            TokenError::DeviceMismatch => error_codes::DEVICE_MISMATCH,
            TokenError::ConcurrentRotation => error_codes::CONCURRENT_ROTATION,
            TokenError::GenerationFailed => error_codes::TOKEN_GENERATION_FAILED,
        }
    }

    /// Whether this failure is a theft signal that should make the caller
    /// revoke the whole family and force a full re-login
    pub fn is_theft_signal(&self) -> bool {
        matches!(self, TokenError::Revoked)
    }
}

/// Convert TokenError to ErrorResponse
impl From<TokenError> for ErrorResponse {
    fn from(err: TokenError) -> Self {
        ErrorResponse::new(err.code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(TokenError::Expired.code(), "TOKEN_EXPIRED");
        assert_eq!(TokenError::ConcurrentRotation.code(), "CONCURRENT_ROTATION");
        assert_eq!(
            TokenError::MissingClaim {
                claim: "fid".to_string()
            }
            .code(),
            "MISSING_CLAIM"
        );
    }

    #[test]
    fn test_error_response_conversion() {
        let response: ErrorResponse = TokenError::Revoked.into();
        assert_eq!(response.error, "TOKEN_REVOKED");
        assert!(response.message.contains("revoked"));
    }

    #[test]
    fn test_theft_signal() {
        assert!(TokenError::Revoked.is_theft_signal());
        assert!(!TokenError::Expired.is_theft_signal());
        assert!(!TokenError::ConcurrentRotation.is_theft_signal());
    }
}
