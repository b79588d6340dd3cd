use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Authenticated Router Module
///
/// The article and category resources. This router is always mounted behind the
/// `auth_middleware` route layer, so every handler runs with a verified identity.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Categories ---
        // GET/POST /categories
        .route(
            "/categories",
            get(handlers::categories::list_categories).post(handlers::categories::create_category),
        )
        // PUT/DELETE /categories/{id}
        // Delete is a soft delete; articles keep pointing at the category.
        .route(
            "/categories/{id}",
            put(handlers::categories::update_category).delete(handlers::categories::delete_category),
        )
        // --- Articles ---
        // GET /articles?search=...&page=...
        // Ten per page, optional title/content substring filter.
        .route(
            "/articles",
            get(handlers::articles::list_articles).post(handlers::articles::create_article),
        )
        // GET/PUT/DELETE /articles/{id}
        .route(
            "/articles/{id}",
            get(handlers::articles::show_article)
                .put(handlers::articles::update_article)
                .delete(handlers::articles::delete_article),
        )
}
