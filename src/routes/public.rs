use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that do not require a bearer token. Everything here either reports
/// liveness or hands out tokens.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers and monitoring.
        .route("/health", get(|| async { "ok" }))
        // POST /register
        // Creates a user and returns a token for it.
        .route("/register", post(handlers::auth::register_user))
        // POST /login
        // Exchanges credentials for a token.
        .route("/login", post(handlers::auth::login))
}
