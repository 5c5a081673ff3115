//! Refresh grant persistence with single-use rotation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::StoreError;
use crate::models::refresh_session::{NewRefreshSession, RefreshSession};

/// Outcome of exchanging a refresh token for its replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rotation {
    /// No grant with that token exists, or a concurrent call already used it.
    Missing,
    /// The grant existed but had expired; it is removed and nothing is issued.
    Expired(RefreshSession),
    Rotated {
        previous: RefreshSession,
        next: RefreshSession,
    },
}

/// Replacement grant; the owner is taken from the consumed row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RefreshSessionRepository: Send + Sync {
    async fn create(&self, session: NewRefreshSession) -> Result<RefreshSession, StoreError>;

    /// Atomically deletes the grant for `token` and, if it is still valid at
    /// `now`, stores `replacement` for the same user. Concurrent callers with
    /// the same token see exactly one `Rotated`.
    async fn rotate(
        &self,
        token: &str,
        replacement: Replacement,
        now: DateTime<Utc>,
    ) -> Result<Rotation, StoreError>;

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

#[derive(Debug, Clone)]
pub struct PgRefreshSessionRepository {
    pool: PgPool,
}

impl PgRefreshSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshSessionRepository for PgRefreshSessionRepository {
    async fn create(&self, session: NewRefreshSession) -> Result<RefreshSession, StoreError> {
        sqlx::query_as::<_, RefreshSession>(
            "INSERT INTO refresh_sessions (user_id, token, expires_at) VALUES ($1, $2, $3) \
             RETURNING id, user_id, token, expires_at",
        )
        .bind(session.user_id)
        .bind(&session.token)
        .bind(session.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_insert)
    }

    async fn rotate(
        &self,
        token: &str,
        replacement: Replacement,
        now: DateTime<Utc>,
    ) -> Result<Rotation, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Row lock taken by DELETE makes the second concurrent caller see no row.
        let previous = sqlx::query_as::<_, RefreshSession>(
            "DELETE FROM refresh_sessions WHERE token = $1 RETURNING id, user_id, token, expires_at",
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(previous) = previous else {
            tx.rollback().await?;
            return Ok(Rotation::Missing);
        };

        if previous.is_expired(now) {
            tx.commit().await?;
            return Ok(Rotation::Expired(previous));
        }

        let next = sqlx::query_as::<_, RefreshSession>(
            "INSERT INTO refresh_sessions (user_id, token, expires_at) VALUES ($1, $2, $3) \
             RETURNING id, user_id, token, expires_at",
        )
        .bind(previous.user_id)
        .bind(&replacement.token)
        .bind(replacement.expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(StoreError::from_insert)?;

        tx.commit().await?;
        Ok(Rotation::Rotated { previous, next })
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM refresh_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
