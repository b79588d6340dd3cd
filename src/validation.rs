//! Rule-table field validation.
//!
//! A resource declares its input contract as a `&'static [FieldRule]`. The same
//! evaluator runs for create (`Presence::Required`) and partial update
//! (`Presence::Sometimes`) flows. Rules that need the database (`unique`,
//! `exists`) are checked by the handler afterwards through the repository and
//! recorded into the same [`FieldErrors`] set.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Whether a field has to be supplied at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Absent, `null`, or blank values fail.
    Required,
    /// Checks only run when the key is present in the body.
    Sometimes,
}

/// A single predicate on a present value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    String,
    Integer,
    Email,
    /// Maximum length in characters.
    Max(usize),
    /// Minimum length in characters.
    Min(usize),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub presence: Presence,
    pub checks: &'static [Check],
}

impl FieldRule {
    pub const fn required(field: &'static str, checks: &'static [Check]) -> Self {
        Self {
            field,
            presence: Presence::Required,
            checks,
        }
    }

    pub const fn sometimes(field: &'static str, checks: &'static [Check]) -> Self {
        Self {
            field,
            presence: Presence::Sometimes,
            checks,
        }
    }
}

/// FieldErrors
///
/// Field name → human-readable messages, serialized as a plain JSON object.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: String) {
        self.0.entry(field.to_string()).or_default().push(message);
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Records the `unique` failure for `field`.
    pub fn taken(&mut self, field: &str) {
        self.add(field, format!("The {} has already been taken.", label(field)));
    }

    /// Records the `exists` failure for `field`.
    pub fn invalid_reference(&mut self, field: &str) {
        self.add(field, format!("The selected {} is invalid.", label(field)));
    }
}

/// Evaluates `rules` against a request body. Each field stops at its first failure.
pub fn validate(body: &Map<String, Value>, rules: &[FieldRule]) -> FieldErrors {
    let mut errors = FieldErrors::default();

    for rule in rules {
        let value = body.get(rule.field);

        match (rule.presence, value) {
            (Presence::Sometimes, None) => continue,
            (Presence::Required, value) if is_missing(value) => {
                errors.add(
                    rule.field,
                    format!("The {} field is required.", label(rule.field)),
                );
                continue;
            }
            _ => {}
        }

        // A blank value that is present counts as null, so type checks reject it.
        let value = match value {
            Some(value) if !is_missing(Some(value)) => value,
            _ => &Value::Null,
        };
        if let Some(message) = rule
            .checks
            .iter()
            .find_map(|check| failed(check, rule.field, value))
        {
            errors.add(rule.field, message);
        }
    }

    errors
}

/// Borrow a string field that already passed validation, trimmed. Blank is `None`.
pub fn str_field<'a>(body: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    secret_field(body, field)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Borrow a string field verbatim. Passwords are never trimmed.
pub fn secret_field<'a>(body: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    body.get(field).and_then(Value::as_str)
}

/// Borrow an integer field that already passed validation.
pub fn int_field(body: &Map<String, Value>, field: &str) -> Option<i64> {
    body.get(field).and_then(Value::as_i64)
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

fn failed(check: &Check, field: &str, value: &Value) -> Option<String> {
    let name = label(field);
    match check {
        Check::String => {
            (!value.is_string()).then(|| format!("The {name} field must be a string."))
        }
        Check::Integer => {
            (value.as_i64().is_none()).then(|| format!("The {name} field must be an integer."))
        }
        Check::Email => {
            let valid = value.as_str().is_some_and(looks_like_email);
            (!valid).then(|| format!("The {name} field must be a valid email address."))
        }
        Check::Max(max) => value
            .as_str()
            .filter(|s| s.chars().count() > *max)
            .map(|_| format!("The {name} field must not be greater than {max} characters.")),
        Check::Min(min) => value
            .as_str()
            .filter(|s| s.chars().count() < *min)
            .map(|_| format!("The {name} field must be at least {min} characters.")),
    }
}

fn looks_like_email(candidate: &str) -> bool {
    let Some((local, domain)) = candidate.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !candidate.chars().any(char::is_whitespace)
}

fn label(field: &str) -> String {
    field.replace('_', " ")
}
