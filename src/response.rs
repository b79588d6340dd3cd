use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// ApiResponse
///
/// Success envelope shared by every resource endpoint: a human-readable message and
/// the payload under `data`. Failures use the same `message` key, rendered by `ApiError`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(message: &str, data: T) -> Self {
        Self {
            message: message.to_string(),
            data,
        }
    }
}

/// MessageResponse
///
/// Confirmation envelope for operations that return no record (deletes).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}
