use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    models::User,
    repository::{Repository, RepositoryState},
};

/// Claims
///
/// Payload of the bearer tokens this service issues and accepts.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's id.
    pub sub: Uuid,
    /// Expiration Time (exp), seconds since the epoch.
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
    /// Token id. Logout records it as revoked.
    pub jti: Uuid,
    /// The user's `token_version` at issue time. A password reset bumps the
    /// stored version, which orphans every earlier token.
    pub ver: i32,
}

/// AuthUser
///
/// The resolved identity of an authenticated request. Produced once by the
/// Access Control Guard and handed to handlers as an explicit argument.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    /// `jti` of the presented token.
    pub token_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

// --- Passwords ---

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, digest: &str) -> bool {
    match PasswordHash::new(digest) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

// --- Bearer tokens ---

pub fn issue_token(config: &AppConfig, user: &User) -> AppResult<String> {
    let now = Utc::now();
    let expires_at = now + Duration::minutes(config.jwt_ttl_minutes);
    let claims = Claims {
        sub: user.id,
        iat: now.timestamp().max(0) as usize,
        exp: expires_at.timestamp().max(0) as usize,
        jti: Uuid::new_v4(),
        ver: user.token_version,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("token encoding failed: {e}")))
}

/// Verifies signature and expiry. Says nothing about revocation; see `authenticate`.
pub fn decode_token(config: &AppConfig, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// authenticate
///
/// Full verification of a bearer token:
/// 1. Signature and expiry.
/// 2. The token id has not been revoked by a logout.
/// 3. The user still exists.
/// 4. The token predates no password reset (`ver` matches).
///
/// Every rejection is the same 401; repository failures propagate as 500.
pub async fn authenticate(
    repo: &dyn Repository,
    config: &AppConfig,
    token: &str,
) -> AppResult<AuthUser> {
    let claims = decode_token(config, token).map_err(|e| {
        tracing::debug!("rejecting bearer token: {:?}", e.kind());
        AppError::unauthenticated()
    })?;

    if repo.is_token_revoked(claims.jti).await? {
        return Err(AppError::unauthenticated());
    }

    let user = repo
        .get_user(claims.sub)
        .await?
        .ok_or_else(AppError::unauthenticated)?;

    if user.token_version != claims.ver {
        return Err(AppError::unauthenticated());
    }

    let expires_at = DateTime::<Utc>::from_timestamp(claims.exp as i64, 0)
        .ok_or_else(AppError::unauthenticated)?;

    Ok(AuthUser {
        id: user.id,
        token_id: claims.jti,
        expires_at,
    })
}

/// AuthUser Extractor Implementation
///
/// Makes `AuthUser` usable as a handler argument. When the guard middleware has
/// already resolved the identity it is taken from the request extensions;
/// otherwise the bearer token is verified here.
///
/// Rejection: `AppError::Unauthorized` (401) on any authentication failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(resolved) = parts.extensions.get::<AuthUser>() {
            return Ok(resolved.clone());
        }

        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let token = bearer_token(&parts.headers).ok_or_else(AppError::unauthenticated)?;
        let user = authenticate(repo.as_ref(), &config, token).await?;

        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

// --- Password reset tokens ---

/// 64 hex characters drawn from two v4 UUIDs.
pub fn generate_reset_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Only this digest is persisted; the plain token exists in the email alone.
pub fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Compares a presented reset token against a stored digest in constant time.
pub fn reset_token_matches(token: &str, stored_hash: &str) -> bool {
    hash_reset_token(token)
        .as_bytes()
        .ct_eq(stored_hash.as_bytes())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let digest = hash_password("correct horse").unwrap();
        assert!(digest.starts_with("$argon2"));
        assert!(verify_password("correct horse", &digest));
        assert!(!verify_password("wrong horse", &digest));
        assert!(!verify_password("correct horse", "not-a-phc-string"));
    }

    #[test]
    fn token_carries_subject_and_version() {
        let config = AppConfig::default();
        let user = User {
            id: Uuid::new_v4(),
            token_version: 3,
            ..User::default()
        };
        let token = issue_token(&config, &user).unwrap();
        let claims = decode_token(&config, &token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.ver, 3);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let config = AppConfig::default();
        let other = AppConfig {
            jwt_secret: "a-completely-different-secret".to_string(),
            ..AppConfig::default()
        };
        let token = issue_token(&other, &User::default()).unwrap();
        assert!(decode_token(&config, &token).is_err());
    }

    #[test]
    fn reset_token_hash_is_stable_hex() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 64);
        assert_eq!(hash_reset_token(&token), hash_reset_token(&token));
        assert_eq!(hash_reset_token(&token).len(), 64);
        assert_ne!(hash_reset_token(&token), token);
    }

    #[test]
    fn reset_token_matches_only_its_own_digest() {
        let token = generate_reset_token();
        let stored = hash_reset_token(&token);
        assert!(reset_token_matches(&token, &stored));
        assert!(!reset_token_matches(&generate_reset_token(), &stored));
        assert!(!reset_token_matches(&token, &stored[..32]));
        assert!(!reset_token_matches(&token, ""));
    }

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Token abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc"));
    }
}
