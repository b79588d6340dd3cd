use simple_article_api::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{InMemoryRepository, PostgresRepository, RepositoryState},
    seed,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Brings the service up in order: configuration, logging, repository, optional
/// seeding, then the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load().expect("FATAL: invalid configuration");

    // 2. Logging Filter Setup
    // RUST_LOG wins; otherwise debug for this crate, info for the HTTP layer.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "simple_article_api=debug,tower_http=info".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Repository Initialization
    // Postgres when DATABASE_URL is set (always in production), otherwise a
    // throwaway in-memory store for local poking around.
    let repo: RepositoryState = match config.db_url.as_deref() {
        Some(db_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(db_url)
                .await
                .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("FATAL: Failed to run database migrations.");

            Arc::new(PostgresRepository::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory repository; data is lost on exit");
            Arc::new(InMemoryRepository::new())
        }
    };

    // 5. Demo data
    if config.seed_database {
        seed::run(&*repo)
            .await
            .expect("FATAL: Failed to seed the database.");
    }

    // 6. Router and Server Startup
    let bind_address = config.bind_address.clone();
    let app = create_router(AppState::new(repo, config));

    let listener = TcpListener::bind(&bind_address)
        .await
        .expect("FATAL: Failed to bind the listen address. Check BIND_ADDRESS.");

    tracing::info!("Listening on {}", bind_address);
    tracing::info!("API Documentation (Swagger UI) available at: http://{}/api/documentation", bind_address);

    axum::serve(listener, app).await.unwrap();
}
