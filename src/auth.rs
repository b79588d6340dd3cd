use argon2::{
    Argon2,
    password_hash::{
        self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::AppConfig, error::ApiError, models::TokenResponse, repository::RepositoryState};

/// Claims
///
/// Payload signed into every bearer token. `sub` carries the user id as a string,
/// as registered claim names expect.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the id of the authenticated user.
    pub sub: String,
    /// Expiration Time (exp): tokens are rejected after this instant.
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
    /// JWT ID (jti): unique per issued token.
    pub jti: Uuid,
}

/// AuthUser
///
/// The resolved identity of an authenticated request.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
}

/// issue_token
///
/// Signs an HS256 token for `user_id` that expires after the configured TTL.
pub fn issue_token(user_id: i64, config: &AppConfig) -> Result<TokenResponse, ApiError> {
    let now = Utc::now().timestamp();
    let expires_in = config.jwt_ttl_minutes * 60;
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now as usize,
        exp: (now + expires_in) as usize,
        jti: Uuid::new_v4(),
    };

    let access_token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))?;

    Ok(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in,
    })
}

/// Decodes and validates `token`, returning the subject user id.
pub fn verify_token(token: &str, config: &AppConfig) -> Result<i64, ApiError> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
        match e.kind() {
            ErrorKind::ExpiredSignature => tracing::debug!("Rejected expired token"),
            other => tracing::debug!(reason = ?other, "Rejected invalid token"),
        }
        ApiError::Unauthenticated
    })?;

    token_data
        .claims
        .sub
        .parse::<i64>()
        .map_err(|_| ApiError::Unauthenticated)
}

/// Hashes `password` with Argon2 and a fresh random salt into a PHC string.
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

/// Checks `password` against a stored PHC string. Malformed hashes never verify.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// AuthUser Extractor Implementation
///
/// Makes `AuthUser` usable as a handler argument and as the guard of the
/// authenticated router. The process:
/// 1. Reuse an identity already resolved earlier in the same request.
/// 2. Extract the `Bearer` token from the Authorization header.
/// 3. Verify signature and expiry.
/// 4. Resolve the subject to a live (not soft-deleted) user.
///
/// Rejection: `ApiError::Unauthenticated` (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::Unauthenticated)?;

        let user_id = verify_token(token.trim(), &config)?;

        // The user may have been deleted after the token was issued.
        let user = repo
            .find_user(user_id)
            .await?
            .ok_or(ApiError::Unauthenticated)?;

        let auth_user = AuthUser {
            id: user.id,
            email: user.email,
        };
        parts.extensions.insert(auth_user.clone());
        Ok(auth_user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_round_trips() {
        let config = AppConfig::default();
        let token = issue_token(42, &config).unwrap();
        assert_eq!(token.token_type, "bearer");
        assert_eq!(token.expires_in, 3600);
        assert_eq!(verify_token(&token.access_token, &config).unwrap(), 42);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = issue_token(1, &AppConfig::default()).unwrap();
        let other = AppConfig {
            jwt_secret: "another-secret".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(
            verify_token(&token.access_token, &other),
            Err(ApiError::Unauthenticated)
        ));
    }

    #[test]
    fn password_hash_verifies_only_the_original() {
        let hash = hash_password("secret123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secret123", &hash));
        assert!(!verify_password("secret124", &hash));
        assert!(!verify_password("secret123", "not-a-phc-string"));
    }
}
