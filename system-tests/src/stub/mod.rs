// system-tests/src/stub/mod.rs
// ============================================================================
// Module: Stub REST API
// Description: axum server emulating the post API, registration, and guard.
// Purpose: Give the check suite a deterministic local target.
// Dependencies: axum, serde_json, tokio
// ============================================================================

//! ## Overview
//! Routes:
//! - `GET|POST /posts`, `GET|PUT|PATCH|DELETE /posts/{id}`
//! - `PUT|DELETE /posts` answer 404 (no such entity)
//! - `POST /register` answers 201 with `{accessToken, user}`
//! - `/{scope}/posts[/{id}]`: reads are public, writes need
//!   `Authorization: Bearer <token>` for a registered user
//!
//! Missing resources answer 404 with `{}`. Every request is logged with the
//! credential headers it carried so tests can assert on what the client sent.
//! [`StubOptions`] switches let negative tests make the server misbehave.

#![allow(clippy::unused_async, reason = "axum handlers are async even when they never await.")]

mod store;

use std::net::SocketAddr;
use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::thread;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::Path;
use axum::extract::RawQuery;
use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::middleware;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use tokio::runtime::Builder;
use tokio::sync::oneshot;

pub use store::ListQuery;
pub use store::MIN_PASSWORD_LENGTH;
pub use store::PostStore;
pub use store::StoreRejection;
pub use store::TOKEN_LENGTH;
pub use store::UserStore;

/// Header some clients use to repeat the access token.
pub const ACCESS_TOKEN_HEADER: &str = "accesstoken";

// ============================================================================
// SECTION: Options
// ============================================================================

/// Behavior switches for the stub server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubOptions {
    /// Number of posts seeded with ids `1..=seed_posts`.
    pub seed_posts: u64,
    /// Require a valid bearer token for writes under the guarded scope.
    pub enforce_auth: bool,
    /// Guard path segment, e.g. `664` for `/664/posts`.
    pub scope: String,
    /// Serve list results in reverse order.
    pub reverse_lists: bool,
    /// Answer updates with the stored post unchanged.
    pub ignore_updates: bool,
    /// Answer deletes with 200 but keep the post.
    pub ignore_deletes: bool,
}

impl Default for StubOptions {
    fn default() -> Self {
        Self {
            seed_posts: 100,
            enforce_auth: true,
            scope: "664".to_string(),
            reverse_lists: false,
            ignore_updates: false,
            ignore_deletes: false,
        }
    }
}

// ============================================================================
// SECTION: Request Log
// ============================================================================

/// Recorded request metadata for stub calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StubRequest {
    /// HTTP method.
    pub method: String,
    /// Path and query as received.
    pub path: String,
    /// Whether an `Authorization: Bearer` header was present.
    pub bearer: bool,
    /// Whether an `accessToken` header was present.
    pub access_token_header: bool,
    /// Response status code.
    pub status: u16,
}

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared server state.
#[derive(Clone)]
struct StubState {
    /// Behavior switches.
    options: Arc<StubOptions>,
    /// Post collection.
    posts: Arc<Mutex<PostStore>>,
    /// Registered users and tokens.
    users: Arc<Mutex<UserStore>>,
    /// Request log.
    requests: Arc<Mutex<Vec<StubRequest>>>,
}

impl StubState {
    /// Builds seeded state from options.
    fn new(options: StubOptions) -> Self {
        Self {
            posts: Arc::new(Mutex::new(PostStore::seeded(options.seed_posts))),
            users: Arc::new(Mutex::new(UserStore::default())),
            requests: Arc::new(Mutex::new(Vec::new())),
            options: Arc::new(options),
        }
    }
}

/// Builds the stub router and returns it with handles to its request log and
/// post store.
#[must_use]
pub fn router(options: StubOptions) -> (Router, StubInspector) {
    let state = StubState::new(options);
    let inspector = StubInspector {
        requests: Arc::clone(&state.requests),
        posts: Arc::clone(&state.posts),
        users: Arc::clone(&state.users),
    };
    let scoped = format!("/{}/posts", state.options.scope);
    let scoped_item = format!("{scoped}/{{id}}");
    let app = Router::new()
        .route(
            "/posts",
            get(list_posts).post(create_post).put(missing_entity).delete(missing_entity),
        )
        .route(
            "/posts/{id}",
            get(read_post).put(replace_post).patch(patch_post).delete(delete_post),
        )
        .route(&scoped, get(list_posts).post(guarded_create_post))
        .route(
            &scoped_item,
            get(read_post)
                .put(guarded_replace_post)
                .patch(guarded_patch_post)
                .delete(guarded_delete_post),
        )
        .route("/register", post(register))
        .fallback(missing_entity)
        .layer(middleware::from_fn_with_state(state.clone(), record_request))
        .with_state(state);
    (app, inspector)
}

/// Read access to a running stub's state.
#[derive(Clone)]
pub struct StubInspector {
    /// Request log.
    requests: Arc<Mutex<Vec<StubRequest>>>,
    /// Post collection.
    posts: Arc<Mutex<PostStore>>,
    /// Registered users.
    users: Arc<Mutex<UserStore>>,
}

impl StubInspector {
    /// Returns captured requests in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<StubRequest> {
        self.requests.lock().map_or_else(|_| Vec::new(), |entries| entries.clone())
    }

    /// Returns the stored post with the given id.
    #[must_use]
    pub fn post(&self, id: &str) -> Option<Value> {
        self.posts.lock().ok().and_then(|posts| posts.get(id))
    }

    /// Returns the number of stored posts.
    #[must_use]
    pub fn post_count(&self) -> usize {
        self.posts.lock().map_or(0, |posts| posts.len())
    }

    /// Returns the number of registered users.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.lock().map_or(0, |users| users.len())
    }
}

// ============================================================================
// SECTION: Server Handle
// ============================================================================

/// Handle for a stub server running on a background thread.
pub struct StubServerHandle {
    /// Base URL, e.g. `http://127.0.0.1:40123`.
    base_url: String,
    /// Shutdown trigger.
    shutdown: Option<oneshot::Sender<()>>,
    /// Server thread.
    join: Option<thread::JoinHandle<()>>,
    /// State inspector.
    inspector: StubInspector,
}

impl StubServerHandle {
    /// Returns the server base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the state inspector.
    #[must_use]
    pub const fn inspector(&self) -> &StubInspector {
        &self.inspector
    }

    /// Returns captured requests in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<StubRequest> {
        self.inspector.requests()
    }
}

impl Drop for StubServerHandle {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Spawns a stub server on an ephemeral loopback port.
///
/// # Errors
///
/// Returns an error when the listener cannot be bound.
pub fn spawn_stub(options: StubOptions) -> Result<StubServerHandle, String> {
    spawn_stub_on(SocketAddr::from(([127, 0, 0, 1], 0)), options)
}

/// Spawns a stub server on the given address.
///
/// # Errors
///
/// Returns an error when the listener cannot be bound.
pub fn spawn_stub_on(addr: SocketAddr, options: StubOptions) -> Result<StubServerHandle, String> {
    let listener =
        StdTcpListener::bind(addr).map_err(|err| format!("stub bind failed: {err}"))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("stub listener nonblocking failed: {err}"))?;
    let local = listener.local_addr().map_err(|err| format!("stub local addr failed: {err}"))?;
    let base_url = format!("http://{local}");

    let (app, inspector) = router(options);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let join = thread::spawn(move || {
        let Ok(runtime) = Builder::new_current_thread().enable_all().build() else {
            return;
        };
        runtime.block_on(async move {
            let Ok(listener) = tokio::net::TcpListener::from_std(listener) else {
                return;
            };
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });
    });
    Ok(StubServerHandle {
        base_url,
        shutdown: Some(shutdown_tx),
        join: Some(join),
        inspector,
    })
}

// ============================================================================
// SECTION: Middleware
// ============================================================================

/// Logs each request with its credential headers and response status.
async fn record_request(State(state): State<StubState>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request
        .uri()
        .path_and_query()
        .map_or_else(|| request.uri().path().to_string(), ToString::to_string);
    let headers = request.headers();
    let bearer = bearer_token(headers).is_some();
    let access_token_header = headers.contains_key(ACCESS_TOKEN_HEADER);

    let response = next.run(request).await;
    if let Ok(mut requests) = state.requests.lock() {
        requests.push(StubRequest {
            method,
            path,
            bearer,
            access_token_header,
            status: response.status().as_u16(),
        });
    }
    response
}

// ============================================================================
// SECTION: Post Handlers
// ============================================================================

/// `GET /posts` with filters and slicing.
async fn list_posts(State(state): State<StubState>, RawQuery(query): RawQuery) -> Response {
    let query = ListQuery::parse(query.as_deref());
    match lock(&state.posts) {
        Ok(posts) => {
            let mut listed = posts.list(&query);
            if state.options.reverse_lists {
                listed.reverse();
            }
            Json(Value::Array(listed)).into_response()
        }
        Err(response) => response,
    }
}

/// `GET /posts/{id}`.
async fn read_post(State(state): State<StubState>, Path(id): Path<String>) -> Response {
    match lock(&state.posts) {
        Ok(posts) => posts.get(&id).map_or_else(not_found, |post| Json(post).into_response()),
        Err(response) => response,
    }
}

/// `POST /posts`.
async fn create_post(State(state): State<StubState>, body: Bytes) -> Response {
    let body = match parse_body(&body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    match lock(&state.posts) {
        Ok(mut posts) => match posts.create(body) {
            Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
            Err(rejection) => rejected(&rejection),
        },
        Err(response) => response,
    }
}

/// `PUT /posts/{id}`.
async fn replace_post(
    State(state): State<StubState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let body = match parse_body(&body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    if state.options.ignore_updates {
        return unchanged(&state, &id);
    }
    match lock(&state.posts) {
        Ok(mut posts) => updated(posts.replace(&id, body)),
        Err(response) => response,
    }
}

/// `PATCH /posts/{id}`.
async fn patch_post(
    State(state): State<StubState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let body = match parse_body(&body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    if state.options.ignore_updates {
        return unchanged(&state, &id);
    }
    match lock(&state.posts) {
        Ok(mut posts) => updated(posts.patch(&id, body)),
        Err(response) => response,
    }
}

/// `DELETE /posts/{id}`.
async fn delete_post(State(state): State<StubState>, Path(id): Path<String>) -> Response {
    match lock(&state.posts) {
        Ok(posts) if state.options.ignore_deletes => {
            if posts.get(&id).is_some() {
                Json(json!({})).into_response()
            } else {
                not_found()
            }
        }
        Ok(mut posts) => {
            if posts.delete(&id) {
                Json(json!({})).into_response()
            } else {
                not_found()
            }
        }
        Err(response) => response,
    }
}

/// Any route without a matching entity.
async fn missing_entity() -> Response {
    not_found()
}

// ============================================================================
// SECTION: Guarded Handlers
// ============================================================================

/// `POST /{scope}/posts`.
async fn guarded_create_post(
    State(state): State<StubState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    create_post(State(state), body).await
}

/// `PUT /{scope}/posts/{id}`.
async fn guarded_replace_post(
    State(state): State<StubState>,
    headers: HeaderMap,
    id: Path<String>,
    body: Bytes,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    replace_post(State(state), id, body).await
}

/// `PATCH /{scope}/posts/{id}`.
async fn guarded_patch_post(
    State(state): State<StubState>,
    headers: HeaderMap,
    id: Path<String>,
    body: Bytes,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    patch_post(State(state), id, body).await
}

/// `DELETE /{scope}/posts/{id}`.
async fn guarded_delete_post(
    State(state): State<StubState>,
    headers: HeaderMap,
    id: Path<String>,
) -> Response {
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    delete_post(State(state), id).await
}

/// Checks the bearer token against issued tokens when auth is enforced.
fn authorize(state: &StubState, headers: &HeaderMap) -> Result<(), Response> {
    if !state.options.enforce_auth {
        return Ok(());
    }
    let Some(token) = bearer_token(headers) else {
        return Err(unauthorized("Missing authorization header"));
    };
    let users = lock(&state.users)?;
    if users.user_for(token).is_some() {
        Ok(())
    } else {
        Err(unauthorized("jwt malformed"))
    }
}

// ============================================================================
// SECTION: Registration
// ============================================================================

/// `POST /register`.
async fn register(State(state): State<StubState>, body: Bytes) -> Response {
    let body = match parse_body(&body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    match lock(&state.users) {
        Ok(mut users) => match users.register(&body) {
            Ok(registered) => (StatusCode::CREATED, Json(registered)).into_response(),
            Err(rejection) => rejected(&rejection),
        },
        Err(response) => response,
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Extracts the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Parses a JSON body; an empty body is treated as `{}`.
fn parse_body(bytes: &Bytes) -> Result<Value, Response> {
    if bytes.is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_slice(bytes).map_err(|err| {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": err.to_string() }))).into_response()
    })
}

/// Maps an update result to 200, 404, or a rejection.
fn updated(result: Result<Option<Value>, StoreRejection>) -> Response {
    match result {
        Ok(Some(record)) => Json(record).into_response(),
        Ok(None) => not_found(),
        Err(rejection) => rejected(&rejection),
    }
}

/// Answers an ignored update with the stored post as it was.
fn unchanged(state: &StubState, id: &str) -> Response {
    match lock(&state.posts) {
        Ok(posts) => posts.get(id).map_or_else(not_found, |post| Json(post).into_response()),
        Err(response) => response,
    }
}

/// Acquires a store lock, mapping poisoning to a 500 response.
fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, Response> {
    mutex.lock().map_err(|_| {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "store lock poisoned" })))
            .into_response()
    })
}

/// 404 with an empty object body.
fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({}))).into_response()
}

/// 401 with a plain-text reason.
fn unauthorized(reason: &'static str) -> Response {
    (StatusCode::UNAUTHORIZED, reason).into_response()
}

/// Maps a store rejection to its status and a plain-text reason.
fn rejected(rejection: &StoreRejection) -> Response {
    let status =
        StatusCode::from_u16(rejection.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, rejection.message().to_string()).into_response()
}
