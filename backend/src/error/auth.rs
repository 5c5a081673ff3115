use thiserror::Error;

/// Failures of the authentication core.
///
/// Every variant except `Internal` is caller-caused and safe to describe in a
/// response body.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user already exists")]
    UserAlreadyExists,
    #[error("user with such credentials not found")]
    UserNotFound,
    #[error("refresh session does not exist")]
    NotExist,
    #[error("invalid token")]
    InvalidToken,
    #[error("access token expired")]
    AccessTokenExpired,
    #[error("refresh token expired")]
    RefreshTokenExpired,
    #[error("invalid claims")]
    InvalidClaims,
    #[error("invalid id")]
    InvalidId,
    #[error("invalid session")]
    InvalidSession,
    #[error("session expired")]
    SessionExpired,
    #[error("{0}")]
    InvalidAuthHeader(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn is_internal(&self) -> bool {
        matches!(self, AuthError::Internal(_))
    }
}

impl From<super::StoreError> for AuthError {
    fn from(err: super::StoreError) -> Self {
        AuthError::Internal(err.into())
    }
}
