//! Resource handlers.
//!
//! Each handler is a plain async function over request-scoped extractors. The flow is
//! always validate → persist → wrap in the response envelope; not-found and validation
//! failures come back as `ApiError` and are rendered at the boundary.

pub mod articles;
pub mod auth;
pub mod categories;

/// Path ids that are not integers cannot match any row.
pub(crate) fn parse_id(raw: &str) -> Option<i64> {
    raw.parse().ok()
}
