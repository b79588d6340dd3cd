use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::Repository;
use crate::{
    error::{RepoResult, RepositoryError},
    models::{Article, ArticleChanges, ArticleWithCategory, Category, NewArticle, NewUser, User},
    pagination::PageRequest,
};

const CATEGORY_COLUMNS: &str = "id, name, created_at, updated_at, deleted_at";
const ARTICLE_COLUMNS: &str =
    "id, title, content, author, category_id, created_at, updated_at, deleted_at";
const USER_COLUMNS: &str = "id, name, email, password, created_at, updated_at, deleted_at";

/// Live articles joined with their live category. A soft-deleted category joins as NULLs.
const ARTICLE_WITH_CATEGORY_SELECT: &str = r#"
    SELECT
        a.id, a.title, a.content, a.author, a.category_id,
        a.created_at, a.updated_at, a.deleted_at,
        c.name AS category_name,
        c.created_at AS category_created_at,
        c.updated_at AS category_updated_at
    FROM articles a
    LEFT JOIN categories c ON c.id = a.category_id AND c.deleted_at IS NULL
    WHERE a.deleted_at IS NULL
"#;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Flat row produced by `ARTICLE_WITH_CATEGORY_SELECT`.
#[derive(FromRow)]
struct ArticleRow {
    id: i64,
    title: String,
    content: String,
    author: String,
    category_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
    category_name: Option<String>,
    category_created_at: Option<DateTime<Utc>>,
    category_updated_at: Option<DateTime<Utc>>,
}

impl From<ArticleRow> for ArticleWithCategory {
    fn from(row: ArticleRow) -> Self {
        let category = match (row.category_name, row.category_created_at, row.category_updated_at) {
            (Some(name), Some(created_at), Some(updated_at)) => Some(Category {
                id: row.category_id,
                name,
                created_at,
                updated_at,
                deleted_at: None,
            }),
            _ => None,
        };

        ArticleWithCategory {
            article: Article {
                id: row.id,
                title: row.title,
                content: row.content,
                author: row.author,
                category_id: row.category_id,
                created_at: row.created_at,
                updated_at: row.updated_at,
                deleted_at: row.deleted_at,
            },
            category,
        }
    }
}

/// Lifts unique-index violations into `RepositoryError::Conflict`.
fn map_write_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            let field = match db.constraint() {
                Some("users_email_active_unique") => "email",
                _ => "name",
            };
            return RepositoryError::Conflict { field };
        }
    }
    RepositoryError::Database(err)
}

/// Escapes LIKE metacharacters so the search term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn push_search(builder: &mut QueryBuilder<'_, Postgres>, search: Option<&str>) {
    if let Some(term) = search {
        let pattern = format!("%{}%", escape_like(term));
        builder
            .push(" AND (a.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR a.content ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE deleted_at IS NULL ORDER BY id"
        );
        Ok(sqlx::query_as::<_, Category>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_category(&self, id: i64) -> RepoResult<Option<Category>> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1 AND deleted_at IS NULL"
        );
        Ok(sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn category_exists(&self, id: i64) -> RepoResult<bool> {
        Ok(
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn category_name_taken(&self, name: &str, except: Option<i64>) -> RepoResult<bool> {
        Ok(sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM categories
                WHERE name = $1 AND deleted_at IS NULL AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(name)
        .bind(except)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn create_category(&self, name: &str) -> RepoResult<Category> {
        let sql = format!("INSERT INTO categories (name) VALUES ($1) RETURNING {CATEGORY_COLUMNS}");
        sqlx::query_as::<_, Category>(&sql)
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn update_category(&self, id: i64, name: &str) -> RepoResult<Option<Category>> {
        let sql = format!(
            "UPDATE categories SET name = $2, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL RETURNING {CATEGORY_COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn soft_delete_category(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE categories SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Filters with `ILIKE` on title or content, then pages by id.
    async fn list_articles(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> RepoResult<(Vec<ArticleWithCategory>, i64)> {
        let mut count: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM articles a WHERE a.deleted_at IS NULL");
        push_search(&mut count, search);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(ARTICLE_WITH_CATEGORY_SELECT);
        push_search(&mut builder, search);
        builder
            .push(" ORDER BY a.id ASC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = builder
            .build_query_as::<ArticleRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn find_article(&self, id: i64) -> RepoResult<Option<Article>> {
        let sql =
            format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1 AND deleted_at IS NULL");
        Ok(sqlx::query_as::<_, Article>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_article_with_category(&self, id: i64) -> RepoResult<Option<ArticleWithCategory>> {
        let sql = format!("{ARTICLE_WITH_CATEGORY_SELECT} AND a.id = $1");
        let row = sqlx::query_as::<_, ArticleRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn create_article(&self, article: NewArticle) -> RepoResult<Article> {
        let sql = format!(
            "INSERT INTO articles (title, content, author, category_id) \
             VALUES ($1, $2, $3, $4) RETURNING {ARTICLE_COLUMNS}"
        );
        sqlx::query_as::<_, Article>(&sql)
            .bind(article.title)
            .bind(article.content)
            .bind(article.author)
            .bind(article.category_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    /// Uses `COALESCE` so only the supplied columns change.
    async fn update_article(&self, id: i64, changes: ArticleChanges) -> RepoResult<Option<Article>> {
        let sql = format!(
            r#"
            UPDATE articles
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                author = COALESCE($4, author),
                category_id = COALESCE($5, category_id),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {ARTICLE_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Article>(&sql)
            .bind(id)
            .bind(changes.title)
            .bind(changes.content)
            .bind(changes.author)
            .bind(changes.category_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn soft_delete_article(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE articles SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_user(&self, id: i64) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let sql =
            format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND deleted_at IS NULL");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let sql = format!(
            "INSERT INTO users (name, email, password) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.name)
            .bind(user.email)
            .bind(user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("Sample"), "Sample");
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
