use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::StatusCode,
};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Keys whose values are kept verbatim apart from empty-to-null.
const UNTRIMMED: &[&str] = &["password", "password_confirmation", "current_password"];

/// Payload
///
/// A request body read as a raw JSON object so the validation rules, not serde, decide
/// what is missing or mistyped. An empty body is an empty object; anything that is not
/// a JSON object is rejected with 400.
///
/// Strings are trimmed and empty strings become `null` before any rule sees them.
#[derive(Debug, Clone, Default)]
pub struct Payload(pub Map<String, Value>);

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Payload(normalize_object(map))
    }
}

fn normalize_object(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(key, value)| {
            let trim = !UNTRIMMED.contains(&key.as_str());
            (key, normalize(value, trim))
        })
        .collect()
}

fn normalize(value: Value, trim: bool) -> Value {
    match value {
        Value::String(text) => {
            let text = if trim { text.trim().to_string() } else { text };
            if text.is_empty() {
                Value::Null
            } else {
                Value::String(text)
            }
        }
        Value::Array(items) => Value::Array(items.into_iter().map(|v| normalize(v, true)).collect()),
        Value::Object(map) => Value::Object(normalize_object(map)),
        other => other,
    }
}

impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge,
                _ => ApiError::BadRequest("Malformed JSON body"),
            })?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Payload(Map::new()));
        }

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => Ok(Payload::from(map)),
            _ => Err(ApiError::BadRequest("Malformed JSON body")),
        }
    }
}
