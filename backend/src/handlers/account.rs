use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    error::AppError,
    middleware::{Caller, RequestId},
    models::{
        account::{Account, CreateAccount, UpdateAccount},
        audit_log::{AuditEvent, AuditEventType},
        StatusResponse,
    },
    state::AppState,
    types::AccountId,
    validation::{rules::parse_positive_id, ValidatedJson},
};

use super::record_audit;

pub async fn create_account(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Extension(request_id): Extension<RequestId>,
    ValidatedJson(payload): ValidatedJson<CreateAccount>,
) -> Result<impl IntoResponse, AppError> {
    let account = state.accounts.create(caller.user_id, payload).await?;
    record_audit(
        &state,
        &request_id,
        AuditEvent::success(AuditEventType::AccountCreate, Some(caller.user_id))
            .with_target(account.id),
    );
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn list_accounts(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<Account>>, AppError> {
    let accounts = state.accounts.list(caller.user_id).await?;
    Ok(Json(accounts))
}

pub async fn get_account(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> Result<Json<Account>, AppError> {
    let id = parse_account_id(&id)?;
    let account = state.accounts.get_by_id(caller.user_id, id).await?;
    Ok(Json(account))
}

pub async fn update_account(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateAccount>,
) -> Result<Json<Account>, AppError> {
    let id = parse_account_id(&id)?;
    let account = state.accounts.update(caller.user_id, id, payload).await?;
    record_audit(
        &state,
        &request_id,
        AuditEvent::success(AuditEventType::AccountUpdate, Some(caller.user_id)).with_target(id),
    );
    Ok(Json(account))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, AppError> {
    let id = parse_account_id(&id)?;
    state.accounts.delete(caller.user_id, id).await?;
    record_audit(
        &state,
        &request_id,
        AuditEvent::success(AuditEventType::AccountDelete, Some(caller.user_id)).with_target(id),
    );
    Ok(Json(StatusResponse::ok()))
}

fn parse_account_id(raw: &str) -> Result<AccountId, AppError> {
    parse_positive_id(raw)
        .map(AccountId::new)
        .ok_or_else(|| AppError::BadRequest("invalid id param".to_string()))
}
