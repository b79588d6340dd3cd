//! Postgres-backed repository tests.
//!
//! These need a reachable database and are ignored by default:
//! `DATABASE_URL=postgres://... cargo test --test repository_integration_tests -- --ignored`

use simple_article_api::{
    error::RepositoryError,
    models::{ArticleChanges, NewArticle, NewUser},
    pagination::PageRequest,
    repository::{PostgresRepository, Repository},
};
use sqlx::PgPool;
use tokio::test;
use uuid::Uuid;

// --- Test Context and Setup ---

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

// The database outlives a test run, so every name is made unique.
fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

fn article(title: &str, content: &str, category_id: i64) -> NewArticle {
    NewArticle {
        title: title.to_string(),
        content: content.to_string(),
        author: "Integration".to_string(),
        category_id,
    }
}

// --- Category Tests ---

#[test]
#[ignore]
async fn test_category_soft_delete_frees_name() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let name = unique("cat");

    let category = repo.create_category(&name).await.unwrap();
    assert!(repo.category_name_taken(&name, None).await.unwrap());
    assert!(!repo.category_name_taken(&name, Some(category.id)).await.unwrap());

    let duplicate = repo.create_category(&name).await;
    assert!(matches!(
        duplicate,
        Err(RepositoryError::Conflict { field: "name" })
    ));

    assert!(repo.soft_delete_category(category.id).await.unwrap());
    assert!(!repo.soft_delete_category(category.id).await.unwrap());
    assert!(repo.find_category(category.id).await.unwrap().is_none());
    // Still a valid reference target for articles.
    assert!(repo.category_exists(category.id).await.unwrap());

    let reused = repo.create_category(&name).await.unwrap();
    assert_ne!(reused.id, category.id);
}

#[test]
#[ignore]
async fn test_update_category_skips_deleted_rows() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let category = repo.create_category(&unique("cat")).await.unwrap();
    let renamed = repo
        .update_category(category.id, &unique("renamed"))
        .await
        .unwrap()
        .unwrap();
    assert!(renamed.updated_at >= category.updated_at);

    repo.soft_delete_category(category.id).await.unwrap();
    assert!(
        repo.update_category(category.id, "anything")
            .await
            .unwrap()
            .is_none()
    );
}

// --- Article Tests ---

#[test]
#[ignore]
async fn test_article_crud_and_detached_category() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let category = repo.create_category(&unique("cat")).await.unwrap();

    let created = repo
        .create_article(article("Postgres", "Body", category.id))
        .await
        .unwrap();

    let with_category = repo
        .find_article_with_category(created.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(with_category.category.map(|c| c.id), Some(category.id));

    let updated = repo
        .update_article(
            created.id,
            ArticleChanges {
                content: Some("New body".to_string()),
                ..ArticleChanges::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.title, "Postgres");
    assert_eq!(updated.content, "New body");

    repo.soft_delete_category(category.id).await.unwrap();
    let detached = repo
        .find_article_with_category(created.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(detached.article.category_id, category.id);
    assert!(detached.category.is_none());

    assert!(repo.soft_delete_article(created.id).await.unwrap());
    assert!(repo.find_article(created.id).await.unwrap().is_none());
    assert!(
        repo.update_article(created.id, ArticleChanges::default())
            .await
            .unwrap()
            .is_none()
    );
}

#[test]
#[ignore]
async fn test_search_is_case_insensitive_and_literal() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let category = repo.create_category(&unique("cat")).await.unwrap();
    let marker = unique("needle");

    repo.create_article(article(&marker.to_uppercase(), "x", category.id))
        .await
        .unwrap();
    repo.create_article(article("other", &format!("has {marker} inside"), category.id))
        .await
        .unwrap();

    let (found, total) = repo
        .list_articles(Some(&marker), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(found.len(), 2);

    // Wildcards in the term are matched literally.
    let (none, total) = repo
        .list_articles(Some(&format!("{marker}%_")), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(total, 0);
    assert!(none.is_empty());
}

// --- User Tests ---

#[test]
#[ignore]
async fn test_user_email_is_unique() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let email = format!("{}@example.com", unique("user"));

    let user = repo
        .create_user(NewUser {
            name: "Integration".to_string(),
            email: email.clone(),
            password_hash: "not-a-real-hash".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(
        repo.find_user_by_email(&email).await.unwrap().map(|u| u.id),
        Some(user.id)
    );
    assert_eq!(repo.find_user(user.id).await.unwrap().map(|u| u.email), Some(email.clone()));

    let duplicate = repo
        .create_user(NewUser {
            name: "Again".to_string(),
            email,
            password_hash: "not-a-real-hash".to_string(),
        })
        .await;
    assert!(matches!(
        duplicate,
        Err(RepositoryError::Conflict { field: "email" })
    ));
}
