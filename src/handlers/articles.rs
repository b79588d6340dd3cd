use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::parse_id;
use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    models::{
        Article, ArticleChanges, ArticleWithCategory, CreateArticleRequest, NewArticle,
        UpdateArticleRequest,
    },
    pagination::{PageRequest, Paginated},
    payload::Payload,
    response::{ApiResponse, MessageResponse},
    validation::{Check, FieldErrors, FieldRule, int_field, str_field, validate},
};

const NOT_FOUND: &str = "Article not found";
const VALIDATION_FAILED: &str = "Validation failed";

const CREATE_RULES: &[FieldRule] = &[
    FieldRule::required("title", &[Check::String]),
    FieldRule::required("content", &[Check::String]),
    FieldRule::required("author", &[Check::String]),
    FieldRule::required("category_id", &[Check::Integer]),
];

const UPDATE_RULES: &[FieldRule] = &[
    FieldRule::sometimes("title", &[Check::String]),
    FieldRule::sometimes("content", &[Check::String]),
    FieldRule::sometimes("author", &[Check::String]),
    FieldRule::sometimes("category_id", &[Check::Integer]),
];

/// ArticleQuery
///
/// Query parameters for the article listing. `page` is read as text so that junk
/// values fall back to the first page instead of rejecting the request.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ArticleQuery {
    /// Substring matched against title or content.
    pub search: Option<String>,
    /// 1-based page number, 10 articles per page.
    pub page: Option<String>,
}

/// Evaluates `rules`, then the `exists` check for a well-formed `category_id`.
async fn validate_article(
    state: &AppState,
    body: &Map<String, Value>,
    rules: &[FieldRule],
) -> Result<(), ApiError> {
    let mut errors = validate(body, rules);

    if !errors.has("category_id") {
        if let Some(category_id) = int_field(body, "category_id") {
            if !state.repo.category_exists(category_id).await? {
                errors.invalid_reference("category_id");
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(rejected(errors))
    }
}

fn rejected(errors: FieldErrors) -> ApiError {
    tracing::warn!(?errors, "Article validation failed");
    ApiError::Validation {
        message: VALIDATION_FAILED,
        errors,
    }
}

fn owned(body: &Map<String, Value>, field: &str) -> Option<String> {
    str_field(body, field).map(str::to_string)
}

/// list_articles
///
/// Pages through live articles with their category attached. With `search`, only
/// articles whose title or content contains the term (case-insensitive) are returned.
#[utoipa::path(
    get,
    path = "/articles",
    tag = "Articles",
    security(("bearerAuth" = [])),
    params(ArticleQuery),
    responses(
        (status = 200, description = "List of articles", body = ApiResponse<Paginated<ArticleWithCategory>>),
        (status = 401, description = "Unauthorized", body = MessageResponse)
    )
)]
pub async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ArticleQuery>,
) -> Result<Json<ApiResponse<Paginated<ArticleWithCategory>>>, ApiError> {
    let page = PageRequest::parse(query.page.as_deref());
    let (items, total) = state
        .repo
        .list_articles(query.search.as_deref(), page)
        .await?;

    tracing::debug!(page = page.page, total, search = ?query.search, "Fetched articles");
    Ok(Json(ApiResponse::new(
        "Articles fetched successfully",
        Paginated::new(items, total, page),
    )))
}

/// create_article
#[utoipa::path(
    post,
    path = "/articles",
    tag = "Articles",
    security(("bearerAuth" = [])),
    request_body = CreateArticleRequest,
    responses(
        (status = 201, description = "Article created", body = ApiResponse<Article>),
        (status = 422, description = "Validation failed", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse)
    )
)]
pub async fn create_article(
    user: AuthUser,
    State(state): State<AppState>,
    Payload(body): Payload,
) -> Result<(StatusCode, Json<ApiResponse<Article>>), ApiError> {
    validate_article(&state, &body, CREATE_RULES).await?;

    let (Some(title), Some(content), Some(author), Some(category_id)) = (
        owned(&body, "title"),
        owned(&body, "content"),
        owned(&body, "author"),
        int_field(&body, "category_id"),
    ) else {
        return Err(ApiError::BadRequest("Malformed JSON body"));
    };

    let article = state
        .repo
        .create_article(NewArticle {
            title,
            content,
            author,
            category_id,
        })
        .await?;
    tracing::info!(user_id = user.id, "Article created: ID {}", article.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Article created successfully", article)),
    ))
}

/// show_article
#[utoipa::path(
    get,
    path = "/articles/{id}",
    tag = "Articles",
    security(("bearerAuth" = [])),
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article found", body = ApiResponse<ArticleWithCategory>),
        (status = 404, description = "Article not found", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse)
    )
)]
pub async fn show_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ArticleWithCategory>>, ApiError> {
    let article = match parse_id(&id) {
        Some(id) => state.repo.find_article_with_category(id).await?,
        None => None,
    }
    .ok_or(ApiError::NotFound(NOT_FOUND))?;

    Ok(Json(ApiResponse::new("Article fetched successfully", article)))
}

/// update_article
///
/// Partial update: only the supplied fields are validated and written. A body with
/// none of them returns the stored record untouched.
#[utoipa::path(
    put,
    path = "/articles/{id}",
    tag = "Articles",
    security(("bearerAuth" = [])),
    params(("id" = i64, Path, description = "Article ID")),
    request_body = UpdateArticleRequest,
    responses(
        (status = 200, description = "Article updated", body = ApiResponse<Article>),
        (status = 404, description = "Article not found", body = MessageResponse),
        (status = 422, description = "Validation failed", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse)
    )
)]
pub async fn update_article(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload(body): Payload,
) -> Result<Json<ApiResponse<Article>>, ApiError> {
    let existing = match parse_id(&id) {
        Some(id) => state.repo.find_article(id).await?,
        None => None,
    }
    .ok_or(ApiError::NotFound(NOT_FOUND))?;

    validate_article(&state, &body, UPDATE_RULES).await?;

    let changes = ArticleChanges {
        title: owned(&body, "title"),
        content: owned(&body, "content"),
        author: owned(&body, "author"),
        category_id: int_field(&body, "category_id"),
    };

    if changes.is_empty() {
        return Ok(Json(ApiResponse::new("Article updated successfully", existing)));
    }

    let article = state
        .repo
        .update_article(existing.id, changes)
        .await?
        .ok_or(ApiError::NotFound(NOT_FOUND))?;
    tracing::info!(user_id = user.id, "Article updated: ID {}", article.id);

    Ok(Json(ApiResponse::new("Article updated successfully", article)))
}

/// delete_article
#[utoipa::path(
    delete,
    path = "/articles/{id}",
    tag = "Articles",
    security(("bearerAuth" = [])),
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article deleted", body = MessageResponse),
        (status = 404, description = "Article not found", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = MessageResponse)
    )
)]
pub async fn delete_article(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Some(id) = parse_id(&id) else {
        return Err(ApiError::NotFound(NOT_FOUND));
    };

    if !state.repo.soft_delete_article(id).await? {
        return Err(ApiError::NotFound(NOT_FOUND));
    }
    tracing::info!(user_id = user.id, "Article deleted: ID {}", id);

    Ok(Json(MessageResponse::new("Article deleted successfully")))
}
