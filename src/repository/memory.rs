use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::Repository;
use crate::{
    error::{RepoResult, RepositoryError},
    models::{Article, ArticleChanges, ArticleWithCategory, Category, NewArticle, NewUser, User},
    pagination::PageRequest,
};

/// InMemoryRepository
///
/// A process-local implementation of `Repository` with the same soft-delete and
/// uniqueness semantics as the Postgres schema. Used by the test suites and by local
/// runs without `DATABASE_URL`. Ids are assigned sequentially from 1 per table.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    categories: Vec<Category>,
    articles: Vec<Article>,
    users: Vec<User>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn next_id(len: usize) -> i64 {
    len as i64 + 1
}

impl Tables {
    fn live_category(&self, id: i64) -> Option<&Category> {
        self.categories
            .iter()
            .find(|c| c.id == id && c.deleted_at.is_none())
    }

    fn name_taken(&self, name: &str, except: Option<i64>) -> bool {
        self.categories
            .iter()
            .any(|c| c.deleted_at.is_none() && c.name == name && Some(c.id) != except)
    }

    fn with_category(&self, article: &Article) -> ArticleWithCategory {
        ArticleWithCategory {
            article: article.clone(),
            category: self.live_category(article.category_id).cloned(),
        }
    }
}

/// Case-insensitive substring match, mirroring `ILIKE '%term%'`.
fn matches_search(article: &Article, term: &str) -> bool {
    let term = term.to_lowercase();
    article.title.to_lowercase().contains(&term) || article.content.to_lowercase().contains(&term)
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .iter()
            .filter(|c| c.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn find_category(&self, id: i64) -> RepoResult<Option<Category>> {
        Ok(self.tables.read().await.live_category(id).cloned())
    }

    async fn category_exists(&self, id: i64) -> RepoResult<bool> {
        Ok(self.tables.read().await.categories.iter().any(|c| c.id == id))
    }

    async fn category_name_taken(&self, name: &str, except: Option<i64>) -> RepoResult<bool> {
        Ok(self.tables.read().await.name_taken(name, except))
    }

    async fn create_category(&self, name: &str) -> RepoResult<Category> {
        let mut tables = self.tables.write().await;
        if tables.name_taken(name, None) {
            return Err(RepositoryError::Conflict { field: "name" });
        }

        let now = Utc::now();
        let category = Category {
            id: next_id(tables.categories.len()),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(&self, id: i64, name: &str) -> RepoResult<Option<Category>> {
        let mut tables = self.tables.write().await;
        if tables.live_category(id).is_none() {
            return Ok(None);
        }
        if tables.name_taken(name, Some(id)) {
            return Err(RepositoryError::Conflict { field: "name" });
        }

        let category = tables
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .map(|c| {
                c.name = name.to_string();
                c.updated_at = Utc::now();
                c.clone()
            });
        Ok(category)
    }

    async fn soft_delete_category(&self, id: i64) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        match tables
            .categories
            .iter_mut()
            .find(|c| c.id == id && c.deleted_at.is_none())
        {
            Some(category) => {
                let now = Utc::now();
                category.deleted_at = Some(now);
                category.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_articles(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> RepoResult<(Vec<ArticleWithCategory>, i64)> {
        let tables = self.tables.read().await;
        let matching: Vec<&Article> = tables
            .articles
            .iter()
            .filter(|a| a.deleted_at.is_none())
            .filter(|a| search.is_none_or(|term| matches_search(a, term)))
            .collect();

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .map(|a| tables.with_category(a))
            .collect();

        Ok((items, total))
    }

    async fn find_article(&self, id: i64) -> RepoResult<Option<Article>> {
        let tables = self.tables.read().await;
        Ok(tables
            .articles
            .iter()
            .find(|a| a.id == id && a.deleted_at.is_none())
            .cloned())
    }

    async fn find_article_with_category(&self, id: i64) -> RepoResult<Option<ArticleWithCategory>> {
        let tables = self.tables.read().await;
        Ok(tables
            .articles
            .iter()
            .find(|a| a.id == id && a.deleted_at.is_none())
            .map(|a| tables.with_category(a)))
    }

    async fn create_article(&self, article: NewArticle) -> RepoResult<Article> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let article = Article {
            id: next_id(tables.articles.len()),
            title: article.title,
            content: article.content,
            author: article.author,
            category_id: article.category_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.articles.push(article.clone());
        Ok(article)
    }

    async fn update_article(&self, id: i64, changes: ArticleChanges) -> RepoResult<Option<Article>> {
        let mut tables = self.tables.write().await;
        let Some(article) = tables
            .articles
            .iter_mut()
            .find(|a| a.id == id && a.deleted_at.is_none())
        else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            article.title = title;
        }
        if let Some(content) = changes.content {
            article.content = content;
        }
        if let Some(author) = changes.author {
            article.author = author;
        }
        if let Some(category_id) = changes.category_id {
            article.category_id = category_id;
        }
        article.updated_at = Utc::now();

        Ok(Some(article.clone()))
    }

    async fn soft_delete_article(&self, id: i64) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        match tables
            .articles
            .iter_mut()
            .find(|a| a.id == id && a.deleted_at.is_none())
        {
            Some(article) => {
                let now = Utc::now();
                article.deleted_at = Some(now);
                article.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_user(&self, id: i64) -> RepoResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.id == id && u.deleted_at.is_none())
            .cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.email == email && u.deleted_at.is_none())
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|u| u.email == user.email && u.deleted_at.is_none())
        {
            return Err(RepositoryError::Conflict { field: "email" });
        }

        let now = Utc::now();
        let user = User {
            id: next_id(tables.users.len()),
            name: user.name,
            email: user.email,
            password: user.password_hash,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.users.push(user.clone());
        Ok(user)
    }
}
