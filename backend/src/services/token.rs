//! Access/refresh token issuing, verification and rotation.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::{
    error::AuthError,
    models::{
        refresh_session::NewRefreshSession,
        user::{SignInInput, SignUpInput, User},
    },
    repositories::{RefreshSessionRepository, Replacement, Rotation},
    types::UserId,
    utils::{
        jwt::{create_access_token, verify_access_token},
        security::generate_opaque_token,
        Clock,
    },
};

use super::credentials::Credentials;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSettings {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

/// Freshly issued credentials for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub user_id: UserId,
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TokenService {
    credentials: Credentials,
    sessions: Arc<dyn RefreshSessionRepository>,
    secret: Arc<[u8]>,
    settings: TokenSettings,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(
        credentials: Credentials,
        sessions: Arc<dyn RefreshSessionRepository>,
        secret: &[u8],
        settings: TokenSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            credentials,
            sessions,
            secret: Arc::from(secret),
            settings,
            clock,
        }
    }

    /// Registers a user. No tokens are issued; the caller signs in separately.
    pub async fn create(&self, input: SignUpInput) -> Result<User, AuthError> {
        self.credentials.create(input).await
    }

    pub async fn get_token_by_credentials(
        &self,
        input: &SignInInput,
    ) -> Result<TokenPair, AuthError> {
        let user = self.credentials.get_by_credentials(input).await?;
        let now = self.clock.now();
        let refresh = self
            .sessions
            .create(NewRefreshSession {
                user_id: user.id,
                token: generate_opaque_token(),
                expires_at: now + self.settings.refresh_ttl,
            })
            .await?;

        self.pair_for(user.id, now, refresh.token, refresh.expires_at)
    }

    /// Resolves the user id carried by an access token.
    pub fn parse_token(&self, token: &str) -> Result<UserId, AuthError> {
        let claims = verify_access_token(token, &self.secret)?;
        if claims.exp <= self.clock.now().timestamp() {
            return Err(AuthError::AccessTokenExpired);
        }
        claims.sub.parse().map_err(|_| AuthError::InvalidId)
    }

    /// Exchanges a refresh token for a new pair. The presented token is
    /// consumed whether or not it was still valid.
    pub async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let now = self.clock.now();
        let replacement = Replacement {
            token: generate_opaque_token(),
            expires_at: now + self.settings.refresh_ttl,
        };

        match self.sessions.rotate(refresh_token, replacement, now).await? {
            Rotation::Missing => Err(AuthError::NotExist),
            Rotation::Expired(previous) => {
                tracing::debug!(user_id = %previous.user_id, "refresh token expired");
                Err(AuthError::RefreshTokenExpired)
            }
            Rotation::Rotated { next, .. } => {
                self.pair_for(next.user_id, now, next.token, next.expires_at)
            }
        }
    }

    fn pair_for(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
        refresh_token: String,
        refresh_expires_at: DateTime<Utc>,
    ) -> Result<TokenPair, AuthError> {
        let (access_token, _claims) =
            create_access_token(user_id, now, self.settings.access_ttl, &self.secret)?;
        Ok(TokenPair {
            user_id,
            access_token,
            refresh_token,
            refresh_expires_at,
        })
    }
}
