//! Random token generation and HMAC signing for opaque credentials.

use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Number of random bytes behind every refresh token and session id.
pub const OPAQUE_TOKEN_BYTES: usize = 32;

/// Returns `OPAQUE_TOKEN_BYTES` of OS randomness, hex-encoded.
pub fn generate_opaque_token() -> String {
    let mut bytes = [0u8; OPAQUE_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Produces `<value>.<hex hmac>`.
pub fn sign_value(value: &str, secret: &[u8]) -> String {
    format!("{}.{}", value, hex::encode(mac_for(value, secret).finalize().into_bytes()))
}

/// Returns the value if the signature matches, compared in constant time.
pub fn verify_signed_value<'a>(signed: &'a str, secret: &[u8]) -> Option<&'a str> {
    let (value, signature) = signed.rsplit_once('.')?;
    if value.is_empty() {
        return None;
    }
    let signature = hex::decode(signature).ok()?;
    mac_for(value, secret).verify_slice(&signature).ok()?;
    Some(value)
}

fn mac_for(value: &str, secret: &[u8]) -> HmacSha256 {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret)
        .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"));
    mac.update(value.as_bytes());
    mac
}
