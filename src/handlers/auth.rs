use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    auth::{hash_password, issue_token, verify_password},
    error::{ApiError, RepositoryError},
    models::{LoginRequest, NewUser, RegisterRequest, RegisteredUser, TokenResponse},
    payload::Payload,
    response::{ApiResponse, MessageResponse},
    validation::{Check, FieldErrors, FieldRule, secret_field, str_field, validate},
};

const VALIDATION_FAILED: &str = "Validation failed";

const REGISTER_RULES: &[FieldRule] = &[
    FieldRule::required("name", &[Check::String, Check::Max(255)]),
    FieldRule::required("email", &[Check::String, Check::Email, Check::Max(255)]),
    FieldRule::required("password", &[Check::String, Check::Min(6)]),
];

const LOGIN_RULES: &[FieldRule] = &[
    FieldRule::required("email", &[Check::String, Check::Email]),
    FieldRule::required("password", &[Check::String]),
];

fn rejected(errors: FieldErrors) -> ApiError {
    ApiError::Validation {
        message: VALIDATION_FAILED,
        errors,
    }
}

/// register_user
///
/// Creates an account and immediately issues a bearer token for it.
#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = ApiResponse<RegisteredUser>),
        (status = 422, description = "Validation failed", body = MessageResponse)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Payload(body): Payload,
) -> Result<(StatusCode, Json<ApiResponse<RegisteredUser>>), ApiError> {
    let mut errors = validate(&body, REGISTER_RULES);
    if !errors.has("email") {
        if let Some(email) = str_field(&body, "email") {
            if state.repo.find_user_by_email(email).await?.is_some() {
                errors.taken("email");
            }
        }
    }

    let (Some(name), Some(email), Some(password)) = (
        str_field(&body, "name"),
        str_field(&body, "email"),
        secret_field(&body, "password"),
    ) else {
        return Err(rejected(errors));
    };
    if !errors.is_empty() {
        return Err(rejected(errors));
    }

    let password_hash = hash_password(password)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?;

    let user = state
        .repo
        .create_user(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
        })
        .await
        .map_err(|err| match err {
            RepositoryError::Conflict { field } => {
                let mut errors = FieldErrors::default();
                errors.taken(field);
                rejected(errors)
            }
            other => other.into(),
        })?;

    let token = issue_token(user.id, &state.config)?;
    tracing::info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "User registered successfully",
            RegisteredUser { user, token },
        )),
    ))
}

/// login
///
/// Exchanges email and password for a bearer token.
#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<TokenResponse>),
        (status = 401, description = "Invalid credentials", body = MessageResponse),
        (status = 422, description = "Validation failed", body = MessageResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Payload(body): Payload,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    let errors = validate(&body, LOGIN_RULES);
    let (Some(email), Some(password)) =
        (str_field(&body, "email"), secret_field(&body, "password"))
    else {
        return Err(rejected(errors));
    };
    if !errors.is_empty() {
        return Err(rejected(errors));
    }

    let user = state
        .repo
        .find_user_by_email(email)
        .await?
        .filter(|user| verify_password(password, &user.password))
        .ok_or_else(|| {
            tracing::warn!("Login failed: invalid credentials");
            ApiError::InvalidCredentials
        })?;

    let token = issue_token(user.id, &state.config)?;
    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(ApiResponse::new("Login successful", token)))
}
