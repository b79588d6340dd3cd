use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// Category
///
/// A row of the `categories` table. Soft-deleted rows keep their data and carry a
/// `deleted_at` timestamp; they are filtered out of every default read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Category {
    pub id: i64,
    #[schema(example = "Technology")]
    pub name: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Article
///
/// A row of the `articles` table. `category_id` references a category that existed
/// when the article was written; it is not re-checked when that category is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author: String,
    pub category_id: i64,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// ArticleWithCategory
///
/// An article with its category relation loaded. `category` is `null` when the
/// referenced category has been soft-deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ArticleWithCategory {
    #[serde(flatten)]
    pub article: Article,
    pub category: Option<Category>,
}

/// User
///
/// A row of the `users` table. The password hash is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub deleted_at: Option<DateTime<Utc>>,
}

// --- Persistence Inputs ---

/// Validated fields for a new article.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub author: String,
    pub category_id: i64,
}

/// Validated partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub category_id: Option<i64>,
}

impl ArticleChanges {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A user about to be inserted; `password_hash` is already an Argon2 PHC string.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

// --- Request Payloads (documentation schemas; bodies are validated as JSON objects) ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CategoryRequest {
    #[schema(example = "Technology", max_length = 100)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateArticleRequest {
    pub title: String,
    pub content: String,
    pub author: String,
    pub category_id: i64,
}

/// UpdateArticleRequest
///
/// Partial update payload. Every field is optional; absent fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateArticleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    #[schema(example = "Riana")]
    pub name: String,
    #[schema(example = "riana@example.com")]
    pub email: String,
    #[schema(example = "secret123", min_length = 6)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    #[schema(example = "riana@example.com")]
    pub email: String,
    #[schema(example = "secret123")]
    pub password: String,
}

// --- Response Schemas ---

/// TokenResponse
///
/// Bearer credential issued by `/register` and `/login`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenResponse {
    pub access_token: String,
    #[schema(example = "bearer")]
    pub token_type: String,
    /// Seconds until the token expires.
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisteredUser {
    pub user: User,
    #[serde(flatten)]
    pub token: TokenResponse,
}
