//! Operator authentication: password hashes and bearer tokens.

use super::error::ApiError;
use super::state::AppState;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const PASSWORD_CONTEXT: &str = "gate-pass 2024-01-01 operator password";
const SALT_LEN: usize = 16;
const ROUNDS: u32 = 10_000;

/// Hashes `password` with a fresh random salt as `salt$hash` (hex).
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let hash = stretch(&salt, password);
    format!("{}${}", hex::encode(salt), hash.to_hex())
}

/// Checks `password` against a value produced by [`hash_password`].
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, expected)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt) else {
        return false;
    };
    let Ok(expected) = blake3::Hash::from_hex(expected) else {
        return false;
    };
    // `blake3::Hash` equality is constant-time.
    stretch(&salt, password) == expected
}

fn stretch(salt: &[u8], password: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new_derive_key(PASSWORD_CONTEXT);
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let mut hash = hasher.finalize();
    for _ in 0..ROUNDS {
        hash = blake3::keyed_hash(hash.as_bytes(), password.as_bytes());
    }
    hash
}

/// Token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and checks HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_hours: u32) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(i64::from(ttl_hours)),
        }
    }

    pub fn issue(&self, username: &str) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected bearer token");
                ApiError::Forbidden
            })
    }
}

/// Middleware guarding visitor routes: no token is 401, a bad one 403.
pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::MissingToken)?;

    let claims = state.tokens.verify(token)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_roundtrip() {
        let stored = hash_password("correct horse");
        assert!(verify_password("correct horse", &stored));
        assert!(!verify_password("wrong horse", &stored));
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        assert_ne!(hash_password("pw"), hash_password("pw"));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("pw", ""));
        assert!(!verify_password("pw", "zz$00"));
        assert!(!verify_password("pw", "00$not-hex"));
    }

    #[test]
    fn test_token_roundtrip() {
        let keys = TokenKeys::new("secret", 48);
        let token = keys.issue("desk").unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, "desk");
        assert_eq!(claims.exp - claims.iat, 48 * 3600);
    }

    #[test]
    fn test_token_from_other_secret_is_forbidden() {
        let token = TokenKeys::new("secret", 48).issue("desk").unwrap();
        assert!(matches!(
            TokenKeys::new("other", 48).verify(&token),
            Err(ApiError::Forbidden)
        ));
    }

    #[test]
    fn test_expired_token_is_forbidden() {
        let keys = TokenKeys::new("secret", 48);
        let claims = Claims {
            sub: "desk".into(),
            iat: 0,
            exp: 1,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).unwrap();
        assert!(matches!(keys.verify(&token), Err(ApiError::Forbidden)));
    }
}
