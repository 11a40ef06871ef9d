// system-tests/src/stub/store.rs
// ============================================================================
// Module: Stub Data Store
// Description: In-memory posts, users, and issued tokens for the stub server.
// Purpose: Hold the resource semantics separately from the HTTP layer.
// Dependencies: rand, serde_json, url
// ============================================================================

//! ## Overview
//! [`PostStore`] keeps posts in insertion order, so newly created posts are
//! listed last. Listing applies field filters first (repeated keys match any
//! of their values), then `_start`/`_end`/`_limit` slicing. [`UserStore`]
//! registers users and issues opaque access tokens.

use std::collections::BTreeMap;
use std::collections::HashMap;

use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

/// Minimum accepted password length for registration.
pub const MIN_PASSWORD_LENGTH: usize = 4;
/// Length of the random part of an issued access token.
pub const TOKEN_LENGTH: usize = 32;

// ============================================================================
// SECTION: Rejections
// ============================================================================

/// Reasons a store operation refuses a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreRejection {
    /// The request body is malformed or fails validation (HTTP 400).
    BadRequest(String),
    /// A post with the requested id already exists (HTTP 500, as json-server).
    DuplicateId(String),
}

impl StoreRejection {
    /// Returns the HTTP status code for the rejection.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::DuplicateId(_) => 500,
        }
    }

    /// Returns the rejection message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(message) | Self::DuplicateId(message) => message,
        }
    }
}

// ============================================================================
// SECTION: List Queries
// ============================================================================

/// Parsed collection query: field filters plus slicing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Field filters; a record matches when every key matches one of its values.
    pub filters: BTreeMap<String, Vec<String>>,
    /// First index to return.
    pub start: Option<usize>,
    /// Index one past the last to return.
    pub end: Option<usize>,
    /// Maximum number of records to return.
    pub limit: Option<usize>,
}

impl ListQuery {
    /// Parses a raw query string such as `id=1&id=2&_start=0&_end=10`.
    ///
    /// Unknown `_`-prefixed keys and unparsable slice bounds are ignored.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let mut query = Self::default();
        let Some(raw) = raw else {
            return query;
        };
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            match key.as_ref() {
                "_start" => query.start = value.parse().ok(),
                "_end" => query.end = value.parse().ok(),
                "_limit" => query.limit = value.parse().ok(),
                other if other.starts_with('_') => {}
                other => {
                    query.filters.entry(other.to_string()).or_default().push(value.into_owned());
                }
            }
        }
        query
    }

    /// Returns true when the record satisfies every field filter.
    fn matches(&self, record: &Value) -> bool {
        self.filters.iter().all(|(key, wanted)| {
            record
                .get(key)
                .and_then(scalar_text)
                .is_some_and(|actual| wanted.iter().any(|value| *value == actual))
        })
    }

    /// Returns the `[from, to)` window for a list of `len` items.
    fn window(&self, len: usize) -> (usize, usize) {
        let from = self.start.unwrap_or(0).min(len);
        let to = match (self.end, self.limit) {
            (Some(end), _) => end,
            (None, Some(limit)) => from.saturating_add(limit),
            (None, None) => len,
        };
        (from, to.clamp(from, len))
    }
}

// ============================================================================
// SECTION: Posts
// ============================================================================

/// Ordered in-memory post collection.
#[derive(Debug, Clone, Default)]
pub struct PostStore {
    /// Posts in insertion order.
    posts: Vec<Value>,
}

impl PostStore {
    /// Creates a store holding posts `1..=count`.
    #[must_use]
    pub fn seeded(count: u64) -> Self {
        let posts = (1..=count)
            .map(|id| {
                json!({
                    "id": id,
                    "title": format!("seed post {id}"),
                    "text": format!("seed text {id}"),
                })
            })
            .collect();
        Self {
            posts,
        }
    }

    /// Returns the number of stored posts.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.posts.len()
    }

    /// Returns true when no posts are stored.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Lists posts matching the query, in insertion order.
    #[must_use]
    pub fn list(&self, query: &ListQuery) -> Vec<Value> {
        let matched: Vec<&Value> =
            self.posts.iter().filter(|record| query.matches(record)).collect();
        let (from, to) = query.window(matched.len());
        matched[from..to].iter().map(|record| (*record).clone()).collect()
    }

    /// Returns the post whose id renders as `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Value> {
        self.position(id).map(|index| self.posts[index].clone())
    }

    /// Appends a post, assigning the next numeric id when none is given.
    ///
    /// # Errors
    ///
    /// Returns [`StoreRejection`] for non-object bodies or duplicate ids.
    pub fn create(&mut self, body: Value) -> Result<Value, StoreRejection> {
        let mut record = into_object(body)?;
        match record.get("id").and_then(scalar_text) {
            Some(id) if self.position(&id).is_some() => {
                return Err(StoreRejection::DuplicateId(format!(
                    "Insert failed, duplicate id {id}"
                )));
            }
            Some(_) => {}
            None => {
                record.insert("id".to_string(), json!(self.next_id()));
            }
        }
        let record = Value::Object(record);
        self.posts.push(record.clone());
        Ok(record)
    }

    /// Replaces a post's fields, keeping its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreRejection::BadRequest`] for non-object bodies.
    pub fn replace(&mut self, id: &str, body: Value) -> Result<Option<Value>, StoreRejection> {
        let mut record = into_object(body)?;
        let Some(index) = self.position(id) else {
            return Ok(None);
        };
        if let Some(existing) = self.posts[index].get("id").cloned() {
            record.insert("id".to_string(), existing);
        }
        self.posts[index] = Value::Object(record);
        Ok(Some(self.posts[index].clone()))
    }

    /// Merges fields into a post, keeping its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreRejection::BadRequest`] for non-object bodies.
    pub fn patch(&mut self, id: &str, body: Value) -> Result<Option<Value>, StoreRejection> {
        let changes = into_object(body)?;
        let Some(index) = self.position(id) else {
            return Ok(None);
        };
        if let Value::Object(record) = &mut self.posts[index] {
            for (key, value) in changes {
                if key != "id" {
                    record.insert(key, value);
                }
            }
        }
        Ok(Some(self.posts[index].clone()))
    }

    /// Removes a post; returns false when it does not exist.
    pub fn delete(&mut self, id: &str) -> bool {
        match self.position(id) {
            Some(index) => {
                self.posts.remove(index);
                true
            }
            None => false,
        }
    }

    /// Returns the index of the post whose id renders as `id`.
    fn position(&self, id: &str) -> Option<usize> {
        self.posts
            .iter()
            .position(|record| record.get("id").and_then(scalar_text).as_deref() == Some(id))
    }

    /// Returns one more than the largest numeric id.
    fn next_id(&self) -> u64 {
        self.posts
            .iter()
            .filter_map(|record| record.get("id").and_then(Value::as_u64))
            .max()
            .map_or(1, |max| max.saturating_add(1))
    }
}

// ============================================================================
// SECTION: Users
// ============================================================================

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Account {
    /// Assigned user id.
    id: u64,
    /// Login email.
    email: String,
}

/// Registered users and the tokens issued to them.
#[derive(Debug, Clone, Default)]
pub struct UserStore {
    /// Accounts in registration order.
    accounts: Vec<Account>,
    /// Issued token to user id.
    tokens: HashMap<String, u64>,
}

impl UserStore {
    /// Registers a user from a `{email, password}` body and issues a token.
    ///
    /// Returns the `{accessToken, user}` response body.
    ///
    /// # Errors
    ///
    /// Returns [`StoreRejection::BadRequest`] for a missing or malformed email,
    /// a short password, or an email that is already registered.
    pub fn register(&mut self, body: &Value) -> Result<Value, StoreRejection> {
        let email = body
            .get("email")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreRejection::BadRequest("Email and password are required".into()))?;
        let password = body
            .get("password")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreRejection::BadRequest("Email and password are required".into()))?;
        if !is_email(email) {
            return Err(StoreRejection::BadRequest("Email format is invalid".into()));
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(StoreRejection::BadRequest("Password is too short".into()));
        }
        if self.accounts.iter().any(|account| account.email.eq_ignore_ascii_case(email)) {
            return Err(StoreRejection::BadRequest("Email already exists".into()));
        }

        let id = u64::try_from(self.accounts.len()).unwrap_or(u64::MAX).saturating_add(1);
        self.accounts.push(Account {
            id,
            email: email.to_string(),
        });
        let token = issue_token(id);
        self.tokens.insert(token.clone(), id);
        Ok(json!({
            "accessToken": token,
            "user": { "email": email, "id": id },
        }))
    }

    /// Returns the user id for an issued token.
    #[must_use]
    pub fn user_for(&self, token: &str) -> Option<u64> {
        self.tokens.get(token).copied()
    }

    /// Returns the number of registered users.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns true when no users are registered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Renders a scalar JSON value the way it appears in a query string.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Unwraps a JSON object body.
fn into_object(body: Value) -> Result<Map<String, Value>, StoreRejection> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(StoreRejection::BadRequest("request body must be a JSON object".into())),
    }
}

/// Loose `local@domain.tld` shape check.
fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.contains('.')
        && !value.chars().any(char::is_whitespace)
}

/// Issues an opaque token: the user id plus [`TOKEN_LENGTH`] random characters.
fn issue_token(id: u64) -> String {
    let secret: String =
        OsRng.sample_iter(&Alphanumeric).take(TOKEN_LENGTH).map(char::from).collect();
    format!("stub.{id}.{secret}")
}
