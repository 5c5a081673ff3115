use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::StoreError;
use crate::models::cookie_session::CookieSession;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CookieSessionRepository: Send + Sync {
    async fn create(&self, session: CookieSession) -> Result<(), StoreError>;

    async fn find(&self, id: &str) -> Result<Option<CookieSession>, StoreError>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

#[derive(Debug, Clone)]
pub struct PgCookieSessionRepository {
    pool: PgPool,
}

impl PgCookieSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CookieSessionRepository for PgCookieSessionRepository {
    async fn create(&self, session: CookieSession) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO cookie_sessions (id, user_id, created_at, expires_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&session.id)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_insert)?;
        Ok(())
    }

    async fn find(&self, id: &str) -> Result<Option<CookieSession>, StoreError> {
        let session = sqlx::query_as::<_, CookieSession>(
            "SELECT id, user_id, created_at, expires_at FROM cookie_sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM cookie_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM cookie_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
