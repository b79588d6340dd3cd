use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// Fixed page size for article listings.
pub const PER_PAGE: i64 = 10;

/// A resolved, always-valid page number (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
}

impl PageRequest {
    /// Missing, non-numeric, or non-positive input falls back to the first page.
    pub fn parse(raw: Option<&str>) -> Self {
        let page = raw
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1);
        Self { page }
    }

    pub fn limit(&self) -> i64 {
        PER_PAGE
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(PER_PAGE)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1 }
    }
}

/// Paginated
///
/// Length-aware page envelope. `from`/`to` are the 1-based positions of the first
/// and last item on this page, or `null` when the page is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Paginated<T> {
    pub current_page: i64,
    pub per_page: i64,
    pub total: i64,
    pub last_page: i64,
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub data: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, request: PageRequest) -> Self {
        let per_page = request.limit();
        let last_page = ((total + per_page - 1) / per_page).max(1);
        let (from, to) = if data.is_empty() {
            (None, None)
        } else {
            let first = request.offset() + 1;
            (Some(first), Some(first + data.len() as i64 - 1))
        };

        Self {
            current_page: request.page,
            per_page,
            total,
            last_page,
            from,
            to,
            data,
        }
    }
}
