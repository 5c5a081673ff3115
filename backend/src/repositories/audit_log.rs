use sqlx::PgPool;

use crate::models::audit_log::AuditLog;
use crate::types::UserId;

pub async fn insert_audit_log(pool: &PgPool, log: &AuditLog) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO audit_logs \
         (id, occurred_at, actor_id, event_type, result, target_id, request_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(&log.id)
    .bind(log.occurred_at)
    .bind(log.actor_id)
    .bind(&log.event_type)
    .bind(&log.result)
    .bind(&log.target_id)
    .bind(&log.request_id)
    .execute(pool)
    .await
    .map(|_| ())
}

pub async fn list_audit_logs_for_actor(
    pool: &PgPool,
    actor_id: UserId,
) -> Result<Vec<AuditLog>, sqlx::Error> {
    sqlx::query_as::<_, AuditLog>(
        "SELECT id, occurred_at, actor_id, event_type, result, target_id, request_id \
         FROM audit_logs WHERE actor_id = $1 ORDER BY occurred_at DESC, id DESC",
    )
    .bind(actor_id)
    .fetch_all(pool)
    .await
}
