use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AuthError, types::UserId};

/// The only algorithm access tokens may be signed with.
pub const ACCESS_TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub iat: i64,    // issued at
    pub exp: i64,    // expiration time
    pub jti: String, // JWT ID
}

impl Claims {
    pub fn new(user_id: UserId, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }
}

pub fn create_access_token(
    user_id: UserId,
    issued_at: DateTime<Utc>,
    ttl: Duration,
    secret: &[u8],
) -> anyhow::Result<(String, Claims)> {
    let claims = Claims::new(user_id, issued_at, ttl);
    let token = encode(
        &Header::new(ACCESS_TOKEN_ALGORITHM),
        &claims,
        &EncodingKey::from_secret(secret),
    )?;

    Ok((token, claims))
}

/// Verifies signature, algorithm and claim shape. Expiry is checked by the
/// library against wall time; callers still compare `exp` with their own clock.
pub fn verify_access_token(token: &str, secret: &[u8]) -> Result<Claims, AuthError> {
    let header = decode_header(token).map_err(|_| AuthError::InvalidToken)?;
    if header.alg != ACCESS_TOKEN_ALGORITHM {
        return Err(AuthError::InvalidToken);
    }

    let mut validation = Validation::new(ACCESS_TOKEN_ALGORITHM);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "iat", "sub"]);

    decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|err| match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::AccessTokenExpired,
            ErrorKind::MissingRequiredClaim(_) | ErrorKind::Json(_) => AuthError::InvalidClaims,
            _ => AuthError::InvalidToken,
        })
}
