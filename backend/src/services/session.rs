//! Cookie-backed sessions, the alternative to bearer tokens.

use std::sync::Arc;

use chrono::Duration;

use crate::{
    error::AuthError,
    models::{cookie_session::CookieSession, user::SignInInput},
    repositories::CookieSessionRepository,
    types::UserId,
    utils::{
        cookies::{
            build_auth_cookie, build_clear_cookie, extract_cookie_value, CookieOptions,
            SESSION_COOKIE_NAME, SESSION_COOKIE_PATH,
        },
        security::{generate_opaque_token, sign_value, verify_signed_value},
        Clock,
    },
};

use super::credentials::Credentials;

/// Result of a successful log-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedSession {
    pub user_id: UserId,
    pub set_cookie: String,
}

/// Result of a log-out; `user_id` is known only if the cookie was still valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedSession {
    pub user_id: Option<UserId>,
    pub set_cookie: String,
}

#[derive(Clone)]
pub struct SessionService {
    credentials: Credentials,
    sessions: Arc<dyn CookieSessionRepository>,
    secret: Arc<[u8]>,
    ttl: Duration,
    cookie_options: CookieOptions,
    clock: Arc<dyn Clock>,
}

impl SessionService {
    pub fn new(
        credentials: Credentials,
        sessions: Arc<dyn CookieSessionRepository>,
        secret: &[u8],
        ttl: Duration,
        cookie_options: CookieOptions,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            credentials,
            sessions,
            secret: Arc::from(secret),
            ttl,
            cookie_options,
            clock,
        }
    }

    pub async fn init_session(&self, input: &SignInInput) -> Result<StartedSession, AuthError> {
        let user = self.credentials.get_by_credentials(input).await?;
        let now = self.clock.now();
        let session = CookieSession {
            id: generate_opaque_token(),
            user_id: user.id,
            created_at: now,
            expires_at: now + self.ttl,
        };
        let cookie_value = sign_value(&session.id, &self.secret);
        self.sessions.create(session).await?;

        Ok(StartedSession {
            user_id: user.id,
            set_cookie: build_auth_cookie(
                SESSION_COOKIE_NAME,
                &cookie_value,
                self.ttl.num_seconds(),
                SESSION_COOKIE_PATH,
                self.cookie_options,
            ),
        })
    }

    /// Resolves the caller from a raw `Cookie` header.
    pub async fn get_session(&self, cookie_header: Option<&str>) -> Result<UserId, AuthError> {
        let session = self.load(cookie_header).await?;
        if session.is_expired(self.clock.now()) {
            return Err(AuthError::SessionExpired);
        }
        Ok(session.user_id)
    }

    /// Deletes the server-side record if there is one and always returns a
    /// cookie that makes the client forget the session.
    pub async fn drop_session(
        &self,
        cookie_header: Option<&str>,
    ) -> Result<DroppedSession, AuthError> {
        let user_id = match self.load(cookie_header).await {
            Ok(session) => {
                self.sessions.delete(&session.id).await?;
                Some(session.user_id)
            }
            Err(err) if err.is_internal() => return Err(err),
            Err(err) => {
                tracing::debug!(reason = %err, "log-out without a live session");
                None
            }
        };

        Ok(DroppedSession {
            user_id,
            set_cookie: build_clear_cookie(
                SESSION_COOKIE_NAME,
                SESSION_COOKIE_PATH,
                self.cookie_options,
            ),
        })
    }

    async fn load(&self, cookie_header: Option<&str>) -> Result<CookieSession, AuthError> {
        let value = cookie_header
            .and_then(|header| extract_cookie_value(header, SESSION_COOKIE_NAME))
            .ok_or(AuthError::InvalidId)?;
        let id = verify_signed_value(&value, &self.secret).ok_or(AuthError::InvalidSession)?;

        self.sessions.find(id).await?.ok_or(AuthError::InvalidId)
    }
}
