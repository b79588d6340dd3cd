use axum::{
    extract::FromRequestParts,
    http::{Request, StatusCode, header, request::Parts},
};
use chrono::Utc;
use simple_article_api::{
    AppConfig, AppState, InMemoryRepository,
    auth::{AuthUser, Claims, hash_password, issue_token},
    models::NewUser,
    repository::Repository,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::sync::Arc;
use uuid::Uuid;

// --- Test Utilities ---

async fn state_with_user() -> (AppState, i64) {
    let repo = Arc::new(InMemoryRepository::new());
    let user = repo
        .create_user(NewUser {
            name: "Riana".to_string(),
            email: "riana@example.com".to_string(),
            password_hash: hash_password("secret123").unwrap(),
        })
        .await
        .unwrap();
    (AppState::new(repo, AppConfig::default()), user.id)
}

fn parts_with_auth(value: Option<String>) -> Parts {
    let mut builder = Request::builder().uri("/articles");
    if let Some(value) = value {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(()).unwrap().into_parts().0
}

fn sign(claims: &Claims, secret: &str) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn claims_for(user_id: i64, expires_in_secs: i64) -> Claims {
    let now = Utc::now().timestamp();
    Claims {
        sub: user_id.to_string(),
        iat: now as usize,
        exp: (now + expires_in_secs) as usize,
        jti: Uuid::new_v4(),
    }
}

// --- Extractor Tests ---

#[tokio::test]
async fn test_valid_token_resolves_user() {
    let (state, user_id) = state_with_user().await;
    let token = issue_token(user_id, &state.config).unwrap();

    let mut parts = parts_with_auth(Some(format!("Bearer {}", token.access_token)));
    let user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();

    assert_eq!(user.id, user_id);
    assert_eq!(user.email, "riana@example.com");
    // Cached for later extractors in the same request.
    assert_eq!(parts.extensions.get::<AuthUser>(), Some(&user));
}

#[tokio::test]
async fn test_missing_header_is_unauthenticated() {
    let (state, _) = state_with_user().await;

    let mut parts = parts_with_auth(None);
    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(err.message(), "Unauthenticated.");
}

#[tokio::test]
async fn test_non_bearer_scheme_is_rejected() {
    let (state, user_id) = state_with_user().await;
    let token = issue_token(user_id, &state.config).unwrap();

    let mut parts = parts_with_auth(Some(format!("Basic {}", token.access_token)));
    let result = AuthUser::from_request_parts(&mut parts, &state).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let (state, user_id) = state_with_user().await;
    // Well past the default validation leeway.
    let token = sign(&claims_for(user_id, -3600), &state.config.jwt_secret);

    let mut parts = parts_with_auth(Some(format!("Bearer {token}")));
    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_wrong_secret_is_rejected() {
    let (state, user_id) = state_with_user().await;
    let token = sign(&claims_for(user_id, 3600), "some-other-secret");

    let mut parts = parts_with_auth(Some(format!("Bearer {token}")));
    let result = AuthUser::from_request_parts(&mut parts, &state).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_token_for_unknown_user_is_rejected() {
    let (state, _) = state_with_user().await;
    let token = sign(&claims_for(9_999, 3600), &state.config.jwt_secret);

    let mut parts = parts_with_auth(Some(format!("Bearer {token}")));
    let result = AuthUser::from_request_parts(&mut parts, &state).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let (state, _) = state_with_user().await;

    let mut parts = parts_with_auth(Some("Bearer not.a.jwt".to_string()));
    let result = AuthUser::from_request_parts(&mut parts, &state).await;

    assert!(result.is_err());
}
