//! Fire-and-forget recording of security-relevant events.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    models::audit_log::{AuditEvent, AuditLog},
    repositories::audit_log as audit_log_repo,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PgAuditSink {
    async fn record(&self, event: AuditEvent) -> anyhow::Result<()> {
        let log = AuditLog {
            id: Uuid::new_v4().to_string(),
            occurred_at: event.occurred_at,
            actor_id: event.actor_id,
            event_type: event.event_type.as_str().to_string(),
            result: event.result.as_str().to_string(),
            target_id: event.target_id,
            request_id: event.request_id,
        };
        audit_log_repo::insert_audit_log(&self.pool, &log).await?;
        Ok(())
    }
}

/// Writes events to the application log; used without a database.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) -> anyhow::Result<()> {
        tracing::info!(
            target: "audit",
            event_type = event.event_type.as_str(),
            result = event.result.as_str(),
            actor_id = ?event.actor_id.map(|id| id.get()),
            target_id = ?event.target_id,
            request_id = ?event.request_id,
            "audit event"
        );
        Ok(())
    }
}

/// Records `event` on a background task. Failures are logged and dropped so
/// the primary operation is never affected.
pub fn spawn_record(sink: Arc<dyn AuditSink>, event: AuditEvent) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let event_type = event.event_type.as_str();
        if let Err(err) = sink.record(event).await {
            tracing::warn!(error = ?err, event_type, "Failed to record audit event");
        }
    })
}
