//! Typed remote API errors and response envelope handling.
//!
//! Every controller/dataplane endpoint answers with either
//! `{ "success": true, "data": ... }` or
//! `{ "success": false, "error": "...", "errorData": {...} }`.
//! This module collapses both, plus transport and non-envelope failures,
//! into one discriminated [`ApiError`] so callers never probe for
//! differently-named fields.

use colored::Colorize;
use serde_json::Value;
use thiserror::Error;

/// Category of a remote API failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    Permission,
    Authentication,
    Validation,
    NotFound,
    Server,
    Network,
}

impl ApiErrorKind {
    fn from_status(status: reqwest::StatusCode) -> Self {
        match status.as_u16() {
            401 => ApiErrorKind::Authentication,
            403 => ApiErrorKind::Permission,
            404 => ApiErrorKind::NotFound,
            400 | 422 => ApiErrorKind::Validation,
            _ => ApiErrorKind::Server,
        }
    }
}

/// A failed remote call.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
    /// Structured error payload from the server, untouched.
    pub details: Option<Value>,
    /// Pre-formatted (possibly ANSI-colored) server text, kept as a side
    /// channel for terminal display.
    pub formatted: Option<String>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            formatted: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Network, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Authentication, message)
    }

    /// Human-facing rendering with per-kind prefixes. Cosmetic only; the
    /// underlying message and details stay available on the value.
    pub fn render(&self) -> String {
        let headline = match self.kind {
            ApiErrorKind::Permission => format!("{} {}", "Permission denied:".red().bold(), self.message),
            ApiErrorKind::Authentication => format!(
                "{} {} (run 'aifabrix login')",
                "Not authenticated:".red().bold(),
                self.message
            ),
            ApiErrorKind::Validation => format!("{} {}", "Validation failed:".yellow().bold(), self.message),
            ApiErrorKind::NotFound => format!("{} {}", "Not found:".red().bold(), self.message),
            ApiErrorKind::Server => format!("{} {}", "Server error:".red().bold(), self.message),
            ApiErrorKind::Network => format!("{} {}", "Network error:".red().bold(), self.message),
        };

        let mut lines = vec![headline];
        for (field, message) in flatten_field_errors(self.details.as_ref()) {
            lines.push(format!("  {}: {}", field, message));
        }
        lines.join("\n")
    }
}

/// Pull `field: message` pairs out of the structured error payload.
/// Servers report them either as a top-level `errors` array or nested
/// under `configuration.errors`.
pub fn flatten_field_errors(details: Option<&Value>) -> Vec<(String, String)> {
    let Some(details) = details else {
        return Vec::new();
    };

    let errors = details
        .get("errors")
        .and_then(Value::as_array)
        .or_else(|| {
            details
                .get("configuration")
                .and_then(|c| c.get("errors"))
                .and_then(Value::as_array)
        });

    let Some(errors) = errors else {
        return Vec::new();
    };

    errors
        .iter()
        .filter_map(|entry| {
            let message = entry
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| entry.as_str())?;
            let field = entry
                .get("field")
                .and_then(Value::as_str)
                .unwrap_or("error");
            Some((field.to_string(), message.to_string()))
        })
        .collect()
}

/// Issue a request and unwrap the response envelope into its `data`.
pub(crate) async fn send_json(request: reqwest::RequestBuilder) -> Result<Value, ApiError> {
    let response = request
        .send()
        .await
        .map_err(|e| ApiError::network(e.to_string()))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::network(e.to_string()))?;

    let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

    if status.is_success() {
        match body.get("success").and_then(Value::as_bool) {
            Some(true) | None => Ok(body.get("data").cloned().unwrap_or(body)),
            Some(false) => Err(envelope_error(ApiErrorKind::Validation, status, &body, &text)),
        }
    } else {
        Err(envelope_error(
            ApiErrorKind::from_status(status),
            status,
            &body,
            &text,
        ))
    }
}

fn envelope_error(
    kind: ApiErrorKind,
    status: reqwest::StatusCode,
    body: &Value,
    raw: &str,
) -> ApiError {
    let message = body
        .get("error")
        .and_then(Value::as_str)
        .or_else(|| body.get("message").and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| {
            if raw.trim().is_empty() {
                status.to_string()
            } else {
                format!("{}: {}", status, raw.trim())
            }
        });

    ApiError {
        kind,
        message,
        details: body
            .get("errorData")
            .cloned()
            .or_else(|| body.get("details").cloned()),
        formatted: body
            .get("formatted")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}
