use rand::{Rng, distributions::Alphanumeric, seq::SliceRandom};
use thiserror::Error;

use crate::{
    auth::hash_password,
    error::RepositoryError,
    models::{NewArticle, NewUser},
    repository::Repository,
};

const CATEGORIES: [&str; 5] = ["Technology", "Sport", "Education", "Travel", "Food"];
const SAMPLE_ARTICLES: usize = 10;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// What a seeding run inserted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub users: usize,
    pub articles: usize,
}

/// run
///
/// Inserts the demo data set: five categories, one login user and ten sample
/// articles spread randomly over the categories. Skips everything when categories
/// already exist, so restarting with seeding enabled is harmless.
pub async fn run(repo: &dyn Repository) -> Result<SeedSummary, SeedError> {
    if !repo.list_categories().await?.is_empty() {
        tracing::info!("Database already seeded, skipping");
        return Ok(SeedSummary::default());
    }

    let mut summary = SeedSummary::default();

    let mut category_ids = Vec::with_capacity(CATEGORIES.len());
    for name in CATEGORIES {
        category_ids.push(repo.create_category(name).await?.id);
        summary.categories += 1;
    }

    if repo.find_user_by_email("riana@example.com").await?.is_none() {
        let password_hash =
            hash_password("secret123").map_err(|e| SeedError::Hashing(e.to_string()))?;
        repo.create_user(NewUser {
            name: "Riana".to_string(),
            email: "riana@example.com".to_string(),
            password_hash,
        })
        .await?;
        summary.users += 1;
    }

    for i in 1..=SAMPLE_ARTICLES {
        // Generated before the await so the thread-local rng is not held across it.
        let article = {
            let mut rng = rand::thread_rng();
            let content: String = (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(100)
                .map(char::from)
                .collect();
            let category_id = category_ids.choose(&mut rng).copied().unwrap_or(category_ids[0]);
            NewArticle {
                title: format!("Sample Article {i}"),
                content,
                author: format!("Author {i}"),
                category_id,
            }
        };
        repo.create_article(article).await?;
        summary.articles += 1;
    }

    tracing::info!(?summary, "Database seeded");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pagination::PageRequest, repository::InMemoryRepository};

    #[tokio::test]
    async fn seeds_once() {
        let repo = InMemoryRepository::new();

        let first = run(&repo).await.unwrap();
        assert_eq!(
            first,
            SeedSummary {
                categories: 5,
                users: 1,
                articles: 10
            }
        );

        let (articles, total) = repo
            .list_articles(Some("Sample"), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(total, 10);
        assert!(articles.iter().all(|a| a.article.content.len() == 100));
        assert!(articles.iter().all(|a| a.category.is_some()));

        let second = run(&repo).await.unwrap();
        assert_eq!(second, SeedSummary::default());
        assert_eq!(repo.list_categories().await.unwrap().len(), 5);
    }
}
