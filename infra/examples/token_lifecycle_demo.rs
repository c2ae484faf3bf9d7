//! Example demonstrating the token lifecycle against MySQL
//!
//! This example shows how to:
//! - Wire the MySQL store into the token service
//! - Issue an access/refresh pair at login
//! - Rotate the refresh token and detect replay of the old one
//! - Revoke every session and clean up terminal records
//!
//! Requires DATABASE_URL to point at a MySQL instance.

use std::sync::Arc;

use seg_core::domain::entities::token::ClientContext;
use seg_core::errors::{DomainError, TokenError};
use seg_core::repositories::RevocationScope;
use seg_core::services::token::{
    SystemClock, TokenCleanupConfig, TokenCleanupService, TokenService, TokenServiceConfig,
};
use seg_infra::database::{DatabasePool, MySqlTokenStore};
use seg_shared::config::{AuthConfig, DatabaseConfig};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    println!("Token Lifecycle Demo");
    println!("====================\n");

    // 1. Connect and prepare the store
    let db_config = DatabaseConfig::from_env();
    println!("Connecting to MySQL at: {}", db_config.url);
    let pool = DatabasePool::new(db_config).await?;
    pool.health_check().await?;
    sqlx::query(include_str!("../migrations/001_create_refresh_tokens.sql"))
        .execute(pool.get_pool())
        .await?;
    println!("✓ Database ready\n");

    let store = Arc::new(MySqlTokenStore::new(pool.get_pool().clone()));
    let auth_config = AuthConfig::from_env();
    let service = TokenService::new(
        Arc::clone(&store),
        TokenServiceConfig::from_auth_config(&auth_config),
    );

    // 2. Login: issue the token pair
    let user_id = Uuid::new_v4();
    let ctx = ClientContext::new(Some("lifecycle-demo/1.0"), Some("127.0.0.1"));
    let response = service
        .create_token_response(user_id, "demo@spheroseg.io", &ctx)
        .await?;
    println!("✓ Issued token pair (expires_in: {}s)", response.expires_in);

    let claims = service.verify_access_token(&response.access_token)?;
    println!("✓ Access token verifies for user {}\n", claims.sub);

    // 3. Rotate the refresh token
    let rotated = service
        .refresh_token_response(&response.refresh_token, user_id, "demo@spheroseg.io", &ctx)
        .await?;
    println!("✓ Rotated refresh token");

    // 4. Replaying the old token is a theft signal
    match service
        .verify_refresh_token(&response.refresh_token, &ctx, false)
        .await
    {
        Err(DomainError::Token(TokenError::Revoked)) => {
            println!("✓ Replay of the rotated token detected\n");
        }
        other => anyhow::bail!("expected a revoked-token failure, got {other:?}"),
    }

    // 5. Logout everywhere
    let revoked = service
        .revoke_all_user_tokens(user_id, &RevocationScope::all())
        .await?;
    println!("✓ Revoked {revoked} remaining session(s)");
    assert!(service
        .verify_refresh_token(&rotated.refresh_token, &ctx, false)
        .await
        .is_err());

    // 6. One cleanup cycle
    let cleanup = TokenCleanupService::new(
        store,
        Arc::new(SystemClock),
        TokenCleanupConfig::default(),
    );
    let result = cleanup.run_cleanup().await?;
    println!("✓ Cleanup removed {} terminal record(s)", result.tokens_deleted);

    pool.close().await;
    Ok(())
}
