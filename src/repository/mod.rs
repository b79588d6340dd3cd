use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::RepoResult,
    models::{Article, ArticleChanges, ArticleWithCategory, Category, NewArticle, NewUser, User},
    pagination::PageRequest,
};

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

/// Repository Trait
///
/// The persistence contract behind every handler. Each resource exposes find, create,
/// update and soft-delete; "find" never returns soft-deleted rows.
///
/// **Send + Sync + async_trait** are required to share `Arc<dyn Repository>` across
/// Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Categories ---
    async fn list_categories(&self) -> RepoResult<Vec<Category>>;
    async fn find_category(&self, id: i64) -> RepoResult<Option<Category>>;
    /// True when a row with this id exists at all, soft-deleted or not.
    async fn category_exists(&self, id: i64) -> RepoResult<bool>;
    /// True when a live category other than `except` already uses `name`.
    async fn category_name_taken(&self, name: &str, except: Option<i64>) -> RepoResult<bool>;
    async fn create_category(&self, name: &str) -> RepoResult<Category>;
    async fn update_category(&self, id: i64, name: &str) -> RepoResult<Option<Category>>;
    /// Returns false when the row is unknown or already soft-deleted.
    async fn soft_delete_category(&self, id: i64) -> RepoResult<bool>;

    // --- Articles ---
    /// One page of live articles, ordered by id, with the total match count.
    async fn list_articles(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> RepoResult<(Vec<ArticleWithCategory>, i64)>;
    async fn find_article(&self, id: i64) -> RepoResult<Option<Article>>;
    async fn find_article_with_category(&self, id: i64) -> RepoResult<Option<ArticleWithCategory>>;
    async fn create_article(&self, article: NewArticle) -> RepoResult<Article>;
    async fn update_article(&self, id: i64, changes: ArticleChanges) -> RepoResult<Option<Article>>;
    async fn soft_delete_article(&self, id: i64) -> RepoResult<bool>;

    // --- Users ---
    async fn find_user(&self, id: i64) -> RepoResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;
