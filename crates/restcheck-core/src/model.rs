// crates/restcheck-core/src/model.rs
// ============================================================================
// Module: Resource Model
// Description: Post and user records exchanged with the server under test.
// Purpose: Give request bodies and responses a typed, loosely validated shape.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The server under test accepts records loosely: every post field except the
//! identifier is optional and unknown fields are echoed back. The types here
//! keep that looseness (`extra` captures unrecognised fields) while giving the
//! fields the suite asserts on a concrete type.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Numeric identifier of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(u64);

impl PostId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque bearer credential issued by registration.
///
/// # Invariants
/// - `Debug` output never contains the token value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a token string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the token value for use in request headers.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the token is empty or whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

// ============================================================================
// SECTION: Posts
// ============================================================================

/// A post record as sent to or returned by the server.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Post {
    /// Post identifier; assigned by the server when omitted on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PostId>,
    /// Post title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Post text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Any other fields the server stores alongside the post.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Post {
    /// Builds a post with an explicit id and title.
    #[must_use]
    pub fn titled(id: PostId, title: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Builds a post carrying only a text field.
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

// ============================================================================
// SECTION: Users
// ============================================================================

/// Registration request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Registration response body.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredUser {
    /// Issued bearer credential.
    #[serde(rename = "accessToken")]
    pub access_token: AccessToken,
    /// Stored user record, when the server echoes it.
    #[serde(default)]
    pub user: Option<Value>,
}

/// A user participating in a single check case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Credentials used for registration.
    pub credentials: Credentials,
    /// Token issued by registration; `None` until registered.
    pub access_token: Option<AccessToken>,
}

impl User {
    /// Creates an unregistered user.
    #[must_use]
    pub const fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            access_token: None,
        }
    }

    /// Records the token issued by a successful registration.
    pub fn authorize(&mut self, token: AccessToken) {
        self.access_token = Some(token);
    }
}
