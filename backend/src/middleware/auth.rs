//! Request authorization.
//!
//! Identity is resolved by an ordered list of [`IdentityResolver`]s; the
//! first one that succeeds wins and its [`Caller`] is placed in the request
//! extensions for handlers to pass down explicitly.

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::{
    error::{AppError, AuthError},
    services::{SessionService, TokenService},
    state::AppState,
    types::UserId,
};

/// The authenticated user a request acts on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
}

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Short label used in the combined failure message.
    fn name(&self) -> &'static str;

    async fn resolve(&self, headers: &HeaderMap) -> Result<UserId, AuthError>;
}

/// `Authorization: Bearer <access token>`.
#[derive(Clone)]
pub struct BearerTokenResolver {
    tokens: TokenService,
}

impl BearerTokenResolver {
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl IdentityResolver for BearerTokenResolver {
    fn name(&self) -> &'static str {
        "token"
    }

    async fn resolve(&self, headers: &HeaderMap) -> Result<UserId, AuthError> {
        let token = parse_bearer_token(authorization_header(headers)?)?;
        self.tokens.parse_token(token)
    }
}

/// Signed `session` cookie.
#[derive(Clone)]
pub struct SessionCookieResolver {
    sessions: SessionService,
}

impl SessionCookieResolver {
    pub fn new(sessions: SessionService) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl IdentityResolver for SessionCookieResolver {
    fn name(&self) -> &'static str {
        "session"
    }

    async fn resolve(&self, headers: &HeaderMap) -> Result<UserId, AuthError> {
        let cookie_header = cookie_header(headers);
        self.sessions.get_session(cookie_header.as_deref()).await
    }
}

pub async fn authorize(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = resolve_caller(&state, request.headers()).await?;
    request.extensions_mut().insert(Caller { user_id });
    Ok(next.run(request).await)
}

async fn resolve_caller(state: &AppState, headers: &HeaderMap) -> Result<UserId, AppError> {
    let mut reasons = Vec::with_capacity(state.resolvers.len());
    let mut internal = None;

    for resolver in state.resolvers.iter() {
        match resolver.resolve(headers).await {
            Ok(user_id) => return Ok(user_id),
            Err(AuthError::Internal(err)) => {
                tracing::error!(resolver = resolver.name(), error = ?err, "identity resolver failed");
                reasons.push(format!("{}: internal error", resolver.name()));
                internal = Some(err);
            }
            Err(err) => reasons.push(format!("{}: {}", resolver.name(), err)),
        }
    }

    if let Some(err) = internal {
        return Err(AppError::InternalServerError(err));
    }

    let message = reasons.join("; ");
    tracing::warn!(reasons = %message, "request not authorized");
    Err(AppError::Unauthorized(message))
}

/// The `Authorization` value, empty when absent. A value that is not
/// visible ASCII is an invalid header rather than an empty one.
pub fn authorization_header(headers: &HeaderMap) -> Result<&str, AuthError> {
    match headers.get(header::AUTHORIZATION) {
        Some(value) => value
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader("invalid auth header")),
        None => Ok(""),
    }
}

pub fn parse_bearer_token(header: &str) -> Result<&str, AuthError> {
    if header.trim().is_empty() {
        return Err(AuthError::InvalidAuthHeader("empty auth header"));
    }
    let (scheme, token) = header
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthHeader("invalid auth header"))?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthHeader("invalid auth header"));
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader("token is empty"));
    }
    if token.contains(' ') {
        return Err(AuthError::InvalidAuthHeader("invalid auth header"));
    }
    Ok(token)
}

/// All `Cookie` headers joined the way a single header would carry them.
pub fn cookie_header(headers: &HeaderMap) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_parser_reports_each_shape() {
        assert_eq!(parse_bearer_token("Bearer abc").unwrap(), "abc");
        assert_eq!(parse_bearer_token("bearer abc").unwrap(), "abc");

        let reason = |header: &str| parse_bearer_token(header).unwrap_err().to_string();
        assert_eq!(reason(""), "empty auth header");
        assert_eq!(reason("Bearer"), "invalid auth header");
        assert_eq!(reason("Basic abc"), "invalid auth header");
        assert_eq!(reason("Bearer a b"), "invalid auth header");
        assert_eq!(reason("Bearer "), "token is empty");
    }

    #[test]
    fn unreadable_authorization_header_is_invalid_not_empty() {
        let mut headers = HeaderMap::new();
        assert_eq!(authorization_header(&headers).unwrap(), "");

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xfftoken").unwrap(),
        );
        assert_eq!(
            authorization_header(&headers).unwrap_err().to_string(),
            "invalid auth header"
        );

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(authorization_header(&headers).unwrap(), "Bearer abc");
    }

    #[test]
    fn cookie_header_joins_multiple_values() {
        let mut headers = HeaderMap::new();
        assert!(cookie_header(&headers).is_none());

        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("session=x.y"));
        assert_eq!(cookie_header(&headers).as_deref(), Some("a=1; session=x.y"));
    }
}
