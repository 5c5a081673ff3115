use axum::{
    extract::{Extension, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::{
    error::{AppError, AuthError},
    middleware::{cookie_header, RequestId},
    models::{
        audit_log::{AuditEvent, AuditEventType},
        user::{SignInInput, SignUpInput},
        StatusResponse, TokenResponse,
    },
    services::TokenPair,
    state::AppState,
    utils::cookies::{
        build_auth_cookie, extract_cookie_value, REFRESH_COOKIE_NAME, REFRESH_COOKIE_PATH,
    },
    validation::ValidatedJson,
};

use super::record_audit;

pub async fn sign_up(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ValidatedJson(payload): ValidatedJson<SignUpInput>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.tokens.create(payload).await.inspect_err(|err| {
        if !err.is_internal() {
            record_audit(
                &state,
                &request_id,
                AuditEvent::failure(AuditEventType::SignUp, None),
            );
        }
    })?;

    tracing::info!(user_id = %user.id, "user registered");
    record_audit(
        &state,
        &request_id,
        AuditEvent::success(AuditEventType::SignUp, Some(user.id)),
    );
    Ok((StatusCode::CREATED, Json(StatusResponse::ok())))
}

pub async fn sign_in(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ValidatedJson(payload): ValidatedJson<SignInInput>,
) -> Result<impl IntoResponse, AppError> {
    let pair = state
        .tokens
        .get_token_by_credentials(&payload)
        .await
        .inspect_err(|err| {
            audit_credential_failure(&state, &request_id, AuditEventType::SignIn, err)
        })?;

    record_audit(
        &state,
        &request_id,
        AuditEvent::success(AuditEventType::SignIn, Some(pair.user_id)),
    );
    Ok(token_response(&state, pair))
}

pub async fn refresh(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let refresh_token = cookie_header(&headers)
        .and_then(|raw| extract_cookie_value(&raw, REFRESH_COOKIE_NAME))
        .ok_or_else(|| AppError::BadRequest("refresh token cookie is missing".to_string()))?;

    let pair = state
        .tokens
        .refresh_tokens(&refresh_token)
        .await
        .inspect_err(|err| {
            if !err.is_internal() {
                record_audit(
                    &state,
                    &request_id,
                    AuditEvent::failure(AuditEventType::TokenRefresh, None),
                );
            }
        })?;

    record_audit(
        &state,
        &request_id,
        AuditEvent::success(AuditEventType::TokenRefresh, Some(pair.user_id)),
    );
    Ok(token_response(&state, pair))
}

pub async fn log_in(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ValidatedJson(payload): ValidatedJson<SignInInput>,
) -> Result<impl IntoResponse, AppError> {
    let session = state
        .sessions
        .init_session(&payload)
        .await
        .inspect_err(|err| {
            audit_credential_failure(&state, &request_id, AuditEventType::LogIn, err)
        })?;

    record_audit(
        &state,
        &request_id,
        AuditEvent::success(AuditEventType::LogIn, Some(session.user_id)),
    );
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session.set_cookie)],
        Json(StatusResponse::ok()),
    ))
}

pub async fn log_out(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let dropped = state
        .sessions
        .drop_session(cookie_header(&headers).as_deref())
        .await?;

    if let Some(user_id) = dropped.user_id {
        record_audit(
            &state,
            &request_id,
            AuditEvent::success(AuditEventType::LogOut, Some(user_id)),
        );
    }
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, dropped.set_cookie)],
        Json(StatusResponse::ok()),
    ))
}

fn token_response(state: &AppState, pair: TokenPair) -> impl IntoResponse {
    let max_age = state.config.token_settings().refresh_ttl.num_seconds();
    let cookie = build_auth_cookie(
        REFRESH_COOKIE_NAME,
        &pair.refresh_token,
        max_age,
        REFRESH_COOKIE_PATH,
        state.config.cookie_options(),
    );
    (
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(TokenResponse {
            token: pair.access_token,
        }),
    )
}

fn audit_credential_failure(
    state: &AppState,
    request_id: &RequestId,
    event_type: AuditEventType,
    err: &AuthError,
) {
    if matches!(err, AuthError::UserNotFound) {
        record_audit(state, request_id, AuditEvent::failure(event_type, None));
    }
}
