use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::parse_id;
use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, RepositoryError},
    models::{Category, CategoryRequest},
    payload::Payload,
    response::{ApiResponse, MessageResponse},
    validation::{Check, FieldErrors, FieldRule, str_field, validate},
};

const NOT_FOUND: &str = "Category not found";
const VALIDATION_FAILED: &str = "Validation error";

/// Same rule set for create and update; only the uniqueness exclusion differs.
const CATEGORY_RULES: &[FieldRule] = &[FieldRule::required(
    "name",
    &[Check::String, Check::Max(100)],
)];

/// Runs the rule table, then the `unique` check against live categories.
async fn validated_name(
    state: &AppState,
    body: &serde_json::Map<String, serde_json::Value>,
    except: Option<i64>,
) -> Result<String, ApiError> {
    let mut errors = validate(body, CATEGORY_RULES);

    if !errors.has("name") {
        if let Some(name) = str_field(body, "name") {
            if state.repo.category_name_taken(name, except).await? {
                errors.taken("name");
            }
        }
    }

    match str_field(body, "name") {
        Some(name) if errors.is_empty() => Ok(name.to_string()),
        _ => Err(rejected(errors)),
    }
}

fn rejected(errors: FieldErrors) -> ApiError {
    tracing::warn!(?errors, "Category validation failed");
    ApiError::Validation {
        message: VALIDATION_FAILED,
        errors,
    }
}

/// A unique-index race between the check and the write reports as the same 422.
fn conflict_as_validation(err: RepositoryError) -> ApiError {
    match err {
        RepositoryError::Conflict { field } => {
            let mut errors = FieldErrors::default();
            errors.taken(field);
            rejected(errors)
        }
        other => other.into(),
    }
}

/// list_categories
///
/// Returns every category that has not been soft-deleted. No pagination.
#[utoipa::path(
    get,
    path = "/categories",
    tag = "Categories",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List of categories", body = ApiResponse<Vec<Category>>),
        (status = 401, description = "Unauthorized", body = MessageResponse)
    )
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Category>>>, ApiError> {
    let categories = state.repo.list_categories().await?;
    tracing::info!(count = categories.len(), "Fetched all categories");
    Ok(Json(ApiResponse::new(
        "Categories retrieved successfully",
        categories,
    )))
}

/// create_category
#[utoipa::path(
    post,
    path = "/categories",
    tag = "Categories",
    security(("bearerAuth" = [])),
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<Category>),
        (status = 422, description = "Validation error", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse)
    )
)]
pub async fn create_category(
    user: AuthUser,
    State(state): State<AppState>,
    Payload(body): Payload,
) -> Result<(StatusCode, Json<ApiResponse<Category>>), ApiError> {
    let name = validated_name(&state, &body, None).await?;

    let category = state
        .repo
        .create_category(&name)
        .await
        .map_err(conflict_as_validation)?;
    tracing::info!(id = category.id, user_id = user.id, "Category created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Category created successfully", category)),
    ))
}

/// update_category
///
/// Renames a live category. The uniqueness check ignores the row being updated, so
/// saving an unchanged name succeeds.
#[utoipa::path(
    put,
    path = "/categories/{id}",
    tag = "Categories",
    security(("bearerAuth" = [])),
    params(("id" = i64, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<Category>),
        (status = 404, description = "Not found", body = MessageResponse),
        (status = 422, description = "Validation error", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse)
    )
)]
pub async fn update_category(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload(body): Payload,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    let Some(existing) = find_live(&state, &id).await? else {
        tracing::error!(id = %id, "Category not found");
        return Err(ApiError::NotFound(NOT_FOUND));
    };

    let name = validated_name(&state, &body, Some(existing.id)).await?;

    let category = state
        .repo
        .update_category(existing.id, &name)
        .await
        .map_err(conflict_as_validation)?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;
    tracing::info!(id = category.id, user_id = user.id, "Category updated");

    Ok(Json(ApiResponse::new("Category updated successfully", category)))
}

/// delete_category
///
/// Soft-deletes the category. Articles referencing it keep their `category_id`.
#[utoipa::path(
    delete,
    path = "/categories/{id}",
    tag = "Categories",
    security(("bearerAuth" = [])),
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted", body = MessageResponse),
        (status = 404, description = "Not found", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse)
    )
)]
pub async fn delete_category(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = match parse_id(&id) {
        Some(id) => state.repo.soft_delete_category(id).await?,
        None => false,
    };

    if !deleted {
        tracing::error!(id = %id, "Delete failed, category not found");
        return Err(ApiError::NotFound(NOT_FOUND));
    }

    tracing::info!(id = %id, user_id = user.id, "Category soft deleted");
    Ok(Json(MessageResponse::new("Category deleted successfully")))
}

async fn find_live(state: &AppState, raw_id: &str) -> Result<Option<Category>, ApiError> {
    match parse_id(raw_id) {
        Some(id) => Ok(state.repo.find_category(id).await?),
        None => Ok(None),
    }
}
