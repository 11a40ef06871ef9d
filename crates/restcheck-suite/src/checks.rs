// crates/restcheck-suite/src/checks.rs
// ============================================================================
// Module: Check Assertions
// Description: Status, equality, and JSON shape assertions for cases.
// Purpose: Turn response mismatches into descriptive case failures.
// Dependencies: restcheck-core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Assertions used by the check cases. Each returns a [`CheckError`] naming
//! the expected and observed values.

use std::fmt;

use restcheck_core::ApiResponse;
use restcheck_core::ClientError;
use serde_json::Value;
use thiserror::Error;

/// Maximum number of body characters echoed into a status mismatch message.
const MAX_BODY_EXCERPT: usize = 200;

/// Reason a check case failed.
#[derive(Debug, Error)]
pub enum CheckError {
    /// An assertion did not hold.
    #[error("{0}")]
    Failed(String),
    /// The request itself failed.
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl CheckError {
    /// Creates an assertion failure.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Result alias for check steps.
pub type CheckResult<T = ()> = Result<T, CheckError>;

/// Fails with `message` unless `condition` holds.
///
/// # Errors
///
/// Returns [`CheckError::Failed`] when the condition is false.
pub fn require(condition: bool, message: impl Into<String>) -> CheckResult {
    if condition { Ok(()) } else { Err(CheckError::failed(message)) }
}

/// Fails unless `actual == expected`.
///
/// # Errors
///
/// Returns [`CheckError::Failed`] describing both values on mismatch.
#[allow(clippy::use_debug, reason = "Debug output names the mismatched values.")]
pub fn require_eq<T>(actual: &T, expected: &T, context: &str) -> CheckResult
where
    T: PartialEq + fmt::Debug + ?Sized,
{
    if actual == expected {
        return Ok(());
    }
    Err(CheckError::failed(format!("{context}: expected {expected:?}, got {actual:?}")))
}

/// Fails unless the response carries the expected status.
///
/// # Errors
///
/// Returns [`CheckError::Failed`] with a body excerpt on mismatch.
pub fn require_status(response: &ApiResponse, expected: u16) -> CheckResult {
    if response.status() == expected {
        return Ok(());
    }
    Err(CheckError::failed(format!(
        "expected status {expected}, got {} (body: {})",
        response.status(),
        body_excerpt(response.body())
    )))
}

/// Returns the body as a JSON array.
///
/// # Errors
///
/// Returns [`CheckError::Failed`] when the value is not an array.
pub fn array_of(value: &Value) -> CheckResult<&[Value]> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| {
            CheckError::failed(format!("expected a JSON array, got {}", body_excerpt(value)))
        })
}

/// Fails unless `items` has exactly `expected` entries.
///
/// # Errors
///
/// Returns [`CheckError::Failed`] on length mismatch.
pub fn require_len(items: &[Value], expected: usize) -> CheckResult {
    require(items.len() == expected, format!("expected {expected} items, got {}", items.len()))
}

/// Reads an unsigned integer field from a JSON object.
///
/// # Errors
///
/// Returns [`CheckError::Failed`] when the field is missing or not a `u64`.
pub fn field_u64(value: &Value, key: &str) -> CheckResult<u64> {
    value
        .get(key)
        .and_then(Value::as_u64)
        .ok_or_else(|| {
            CheckError::failed(format!("missing integer field `{key}` in {}", body_excerpt(value)))
        })
}

/// Reads a string field from a JSON object.
///
/// # Errors
///
/// Returns [`CheckError::Failed`] when the field is missing or not a string.
pub fn field_str<'a>(value: &'a Value, key: &str) -> CheckResult<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            CheckError::failed(format!("missing string field `{key}` in {}", body_excerpt(value)))
        })
}

/// Returns true when any top-level value of a JSON object equals `needle`.
#[must_use]
pub fn has_string_value(record: &Value, needle: &str) -> bool {
    record
        .as_object()
        .is_some_and(|object| object.values().any(|value| value.as_str() == Some(needle)))
}

/// Renders a bounded, single-line excerpt of a JSON value.
#[must_use]
pub fn body_excerpt(value: &Value) -> String {
    let rendered = value.to_string();
    if rendered.chars().count() <= MAX_BODY_EXCERPT {
        return rendered;
    }
    let mut excerpt: String = rendered.chars().take(MAX_BODY_EXCERPT).collect();
    excerpt.push_str("...");
    excerpt
}
