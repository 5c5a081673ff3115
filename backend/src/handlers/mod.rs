use axum::Json;

use crate::{
    middleware::RequestId, models::audit_log::AuditEvent, models::StatusResponse,
    services::spawn_record, state::AppState,
};

pub mod account;
pub mod auth;

pub async fn health() -> Json<StatusResponse> {
    Json(StatusResponse::ok())
}

/// Hands the event to the audit sink without waiting for it.
fn record_audit(state: &AppState, request_id: &RequestId, event: AuditEvent) {
    spawn_record(
        state.audit.clone(),
        event.with_request_id(Some(request_id.0.clone())),
    );
}
