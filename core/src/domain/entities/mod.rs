//! Domain entities representing core business objects.

pub mod token;

// Re-export commonly used types
pub use token::{
    Claims, ClientContext, RefreshTokenRecord, RevocationReason, TokenResponse, TokenType,
    ACCESS_TOKEN_EXPIRY_SECONDS, JWT_AUDIENCE, JWT_ISSUER, REFRESH_TOKEN_EXPIRY_SECONDS,
    TOKEN_FORMAT_VERSION,
};
