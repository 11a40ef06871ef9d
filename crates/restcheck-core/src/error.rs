// crates/restcheck-core/src/error.rs
// ============================================================================
// Module: Client Errors
// Description: Error taxonomy for HTTP exchanges with the server under test.
// Purpose: Distinguish transport failures from status and decode mismatches.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`ClientError`] separates transport failures, which are retried, from
//! unexpected statuses and undecodable bodies, which are reported as-is.

use serde_json::Value;
use thiserror::Error;

/// Errors raised while building, sending, or decoding API requests.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The underlying HTTP client could not be constructed.
    #[error("failed to build http client: {0}")]
    Build(String),
    /// The request URL could not be assembled from the base URL and path.
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
    /// The request never produced a response.
    #[error("{method} {path} failed after {attempts} attempt(s): {message}")]
    Transport {
        /// HTTP method label.
        method: &'static str,
        /// Request path relative to the base URL.
        path: String,
        /// Number of send attempts made.
        attempts: u32,
        /// Transport error description.
        message: String,
    },
    /// The server answered with a failure status while failures were not expected.
    #[error("{method} {path} returned unexpected status {status}")]
    UnexpectedStatus {
        /// HTTP method label.
        method: &'static str,
        /// Request path relative to the base URL.
        path: String,
        /// Status code returned by the server.
        status: u16,
        /// Response body as returned by the server.
        body: Value,
    },
    /// A response body did not match the expected shape.
    #[error("failed to decode {context}: {message}")]
    Decode {
        /// What was being decoded.
        context: String,
        /// Decoder error description.
        message: String,
    },
}

impl ClientError {
    /// Returns the status code when the error carries one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus {
                status, ..
            } => Some(*status),
            _ => None,
        }
    }
}
