//! Business services containing domain logic and use cases.

pub mod token;

pub use token::{
    CleanupResult, Clock, KeyProvider, ManualClock, RevocationService, RotationCoordinator,
    SystemClock, TokenCleanupConfig, TokenCleanupService, TokenIssuer, TokenService,
    TokenServiceConfig, TokenVerifier, VerifiedRefresh, VerifyOptions,
};
