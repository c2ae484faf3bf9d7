//! Store interfaces and in-process implementations.

pub mod token;

pub use token::{InMemoryTokenStore, RefreshTokenStore, RevocationScope};
