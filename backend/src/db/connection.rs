use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

const MAX_CONNECTIONS: u32 = 10;

/// Connects to PostgreSQL, retrying while the database is still starting up.
pub async fn create_pool(
    database_url: &str,
    attempts: u32,
    wait: Duration,
) -> anyhow::Result<PgPool> {
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await
        {
            Ok(pool) => return Ok(pool),
            Err(err) if attempt < attempts => {
                tracing::warn!(
                    attempt,
                    attempts,
                    error = %err,
                    "Database not reachable yet, retrying in {:?}",
                    wait
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(err) => {
                return Err(anyhow::Error::new(err).context(format!(
                    "Failed to connect to database after {} attempts",
                    attempts
                )))
            }
        }
    }
}
