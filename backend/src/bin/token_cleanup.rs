use std::time::Duration;

use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use accounts_backend::{
    config::Config,
    db::connection::create_pool,
    repositories::{
        CookieSessionRepository, PgCookieSessionRepository, PgRefreshSessionRepository,
        RefreshSessionRepository,
    },
};

/// Deletes expired refresh grants and cookie sessions.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "token_cleanup=info,accounts_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    let database_url = config
        .database_url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set for token cleanup"))?;
    let pool = create_pool(
        database_url,
        config.db_connect_attempts,
        Duration::from_secs(config.db_connect_wait_seconds),
    )
    .await?;

    let now = Utc::now();
    let refresh_sessions = PgRefreshSessionRepository::new(pool.clone())
        .delete_expired(now)
        .await?;
    let cookie_sessions = PgCookieSessionRepository::new(pool.clone())
        .delete_expired(now)
        .await?;
    tracing::info!(refresh_sessions, cookie_sessions, "Deleted expired sessions");

    sqlx::query("VACUUM (ANALYZE) refresh_sessions")
        .execute(&pool)
        .await?;
    sqlx::query("VACUUM (ANALYZE) cookie_sessions")
        .execute(&pool)
        .await?;

    Ok(())
}
