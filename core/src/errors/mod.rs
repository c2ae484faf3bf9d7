//! Domain-specific error types and error handling.

mod types;

pub use types::TokenError;

// Re-export the shared wire type so callers only need this crate
pub use seg_shared::errors::{error_codes, ErrorResponse, IntoErrorResponse};

use thiserror::Error;

/// Core domain errors (general purpose)
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to the token failure taxonomy
    #[error(transparent)]
    Token(#[from] TokenError),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Shorthand for a storage failure
    pub fn storage(message: impl Into<String>) -> Self {
        DomainError::Storage {
            message: message.into(),
        }
    }

    /// The token failure kind, when this is a token error
    pub fn token_kind(&self) -> Option<&TokenError> {
        match self {
            DomainError::Token(kind) => Some(kind),
            _ => None,
        }
    }
}

impl IntoErrorResponse for DomainError {
    fn to_error_response(&self) -> ErrorResponse {
        match self {
            DomainError::Storage { .. } => {
                ErrorResponse::new(error_codes::DATABASE_ERROR, "Storage failure")
            }
            DomainError::Internal { .. } => {
                ErrorResponse::new(error_codes::INTERNAL_ERROR, "Internal error")
            }
            DomainError::Token(err) => err.clone().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_error_converts_to_domain_error() {
        let err: DomainError = TokenError::Revoked.into();
        assert!(matches!(err, DomainError::Token(TokenError::Revoked)));
        assert_eq!(err.token_kind(), Some(&TokenError::Revoked));
    }

    #[test]
    fn test_storage_error_response_hides_detail() {
        let err = DomainError::storage("connection refused to 10.0.0.3");
        let response = err.to_error_response();
        assert_eq!(response.error, error_codes::DATABASE_ERROR);
        assert!(!response.message.contains("10.0.0.3"));
    }
}
