// crates/restcheck-suite/src/cases.rs
// ============================================================================
// Module: Check Cases
// Description: The ordered post, registration, and authorization checks.
// Purpose: Encode each end-to-end scenario as a chain of requests + asserts.
// Dependencies: restcheck-core, serde_json, tracing
// ============================================================================

//! ## Overview
//! Every case is a flat script: build a request, send it, assert on status
//! and body, and optionally chain a follow-up request using data taken from
//! the previous response (a freshly issued access token or a freshly created
//! post id). The cases rely on fixture data already present on the server:
//! posts `1..=page_size` and the configured pair of known ids.

use std::fmt;
use std::str::FromStr;

use restcheck_core::ApiClient;
use restcheck_core::FakeData;
use restcheck_core::Post;
use restcheck_core::PostId;
use restcheck_core::RegisteredUser;
use restcheck_core::RequestSpec;
use restcheck_core::User;
use serde_json::json;

use crate::checks::CheckError;
use crate::checks::CheckResult;
use crate::checks::array_of;
use crate::checks::field_str;
use crate::checks::field_u64;
use crate::checks::has_string_value;
use crate::checks::require;
use crate::checks::require_eq;
use crate::checks::require_len;
use crate::checks::require_status;
use crate::runner::SuiteSettings;

// ============================================================================
// SECTION: Paths
// ============================================================================

/// Post collection path.
pub const POSTS_PATH: &str = "/posts";
/// Registration path.
pub const REGISTER_PATH: &str = "/register";

/// Returns the path of a single post.
#[must_use]
pub fn post_path(id: PostId) -> String {
    format!("{POSTS_PATH}/{id}")
}

// ============================================================================
// SECTION: Case Identifiers
// ============================================================================

/// Identifier of a check case, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CaseId {
    /// `GET /posts` answers 200.
    GetAllPosts,
    /// The first page holds ids `1..=page_size` in order.
    GetFirstPage,
    /// Filtering by two ids returns exactly those posts, in order.
    GetPostsByIds,
    /// A scoped create without credentials answers 401.
    CreatePostUnauthorized,
    /// Register, then create a scoped post with the issued token.
    CreatePostWithToken,
    /// Create a post and read back the echoed fields.
    CreatePost,
    /// Updating the collection itself answers 404.
    UpdateMissingEntity,
    /// Create, then update the created post.
    CreateThenUpdate,
    /// Deleting the collection itself answers 404.
    DeleteMissingEntity,
    /// Create, update, delete, then confirm the post is gone.
    CreateUpdateDelete,
}

impl CaseId {
    /// All cases in run order.
    pub const ALL: [Self; 10] = [
        Self::GetAllPosts,
        Self::GetFirstPage,
        Self::GetPostsByIds,
        Self::CreatePostUnauthorized,
        Self::CreatePostWithToken,
        Self::CreatePost,
        Self::UpdateMissingEntity,
        Self::CreateThenUpdate,
        Self::DeleteMissingEntity,
        Self::CreateUpdateDelete,
    ];

    /// Returns the stable case name used for selection and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetAllPosts => "get_all_posts",
            Self::GetFirstPage => "get_first_ten_posts",
            Self::GetPostsByIds => "get_posts_by_ids",
            Self::CreatePostUnauthorized => "create_post_unauthorized",
            Self::CreatePostWithToken => "create_post_with_token",
            Self::CreatePost => "create_post",
            Self::UpdateMissingEntity => "update_missing_entity",
            Self::CreateThenUpdate => "create_then_update",
            Self::DeleteMissingEntity => "delete_missing_entity",
            Self::CreateUpdateDelete => "create_update_delete",
        }
    }

    /// Returns a human-readable title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::GetAllPosts => "Get all posts",
            Self::GetFirstPage => "Get first page of posts",
            Self::GetPostsByIds => "Get posts by two ids",
            Self::CreatePostUnauthorized => "Create a post (unauthorized)",
            Self::CreatePostWithToken => "Create a post with access token",
            Self::CreatePost => "Create post",
            Self::UpdateMissingEntity => "Update non-existing entity",
            Self::CreateThenUpdate => "Create entity, update entity",
            Self::DeleteMissingEntity => "Delete non-existing entity",
            Self::CreateUpdateDelete => "Create entity, update entity, delete entity",
        }
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseId {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|case| case.as_str() == trimmed)
            .ok_or_else(|| format!("unknown case: {trimmed}"))
    }
}

// ============================================================================
// SECTION: Case Context
// ============================================================================

/// Per-case resources: the client, the data generator, and fixture settings.
pub struct CaseContext<'a> {
    /// Client under which every request is sent.
    client: &'a ApiClient,
    /// Body generator.
    fake: &'a mut FakeData,
    /// Fixture settings for the target.
    settings: &'a SuiteSettings,
    /// Notes collected for the report.
    notes: Vec<String>,
}

impl<'a> CaseContext<'a> {
    /// Creates a context for a single case.
    pub const fn new(
        client: &'a ApiClient,
        fake: &'a mut FakeData,
        settings: &'a SuiteSettings,
    ) -> Self {
        Self {
            client,
            fake,
            settings,
            notes: Vec::new(),
        }
    }

    /// Records a progress note for the report and the log.
    pub fn note(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(note = %message, "case step");
        self.notes.push(message);
    }

    /// Consumes the context and returns its notes.
    #[must_use]
    pub fn into_notes(self) -> Vec<String> {
        self.notes
    }
}

// ============================================================================
// SECTION: Dispatch
// ============================================================================

/// Runs a single case to completion.
///
/// # Errors
///
/// Returns [`CheckError`] when a request fails or an assertion does not hold.
pub async fn execute(case: CaseId, ctx: &mut CaseContext<'_>) -> CheckResult {
    match case {
        CaseId::GetAllPosts => get_all_posts(ctx).await,
        CaseId::GetFirstPage => get_first_page(ctx).await,
        CaseId::GetPostsByIds => get_posts_by_ids(ctx).await,
        CaseId::CreatePostUnauthorized => create_post_unauthorized(ctx).await,
        CaseId::CreatePostWithToken => create_post_with_token(ctx).await,
        CaseId::CreatePost => create_post(ctx).await.map(|_| ()),
        CaseId::UpdateMissingEntity => update_missing_entity(ctx).await,
        CaseId::CreateThenUpdate => create_then_update(ctx).await.map(|_| ()),
        CaseId::DeleteMissingEntity => delete_missing_entity(ctx).await,
        CaseId::CreateUpdateDelete => create_update_delete(ctx).await,
    }
}

// ============================================================================
// SECTION: Read Cases
// ============================================================================

/// Lists all posts.
async fn get_all_posts(ctx: &mut CaseContext<'_>) -> CheckResult {
    let response = ctx.client.send(RequestSpec::get(POSTS_PATH).fail_on_status(false)).await?;
    require_status(&response, 200)
}

/// Fetches the first page and checks its size and order.
async fn get_first_page(ctx: &mut CaseContext<'_>) -> CheckResult {
    let page_size = ctx.settings.page_size;
    let request = RequestSpec::get(POSTS_PATH)
        .query("_start", 0)
        .query("_end", page_size)
        .fail_on_status(false);
    let response = ctx.client.send(request).await?;
    require_status(&response, 200)?;

    let posts = array_of(response.body())?;
    require_len(posts, page_size)?;
    for (index, post) in posts.iter().enumerate() {
        let expected = u64::try_from(index + 1)
            .map_err(|_| CheckError::failed("page index exceeds u64 range"))?;
        require_eq(&field_u64(post, "id")?, &expected, &format!("id of post at index {index}"))?;
    }
    Ok(())
}

/// Filters by two known ids.
async fn get_posts_by_ids(ctx: &mut CaseContext<'_>) -> CheckResult {
    let (first, second) = ctx.settings.known_ids;
    let request = RequestSpec::get(POSTS_PATH)
        .query("id", first)
        .query("id", second)
        .fail_on_status(false);
    let response = ctx.client.send(request).await?;
    require_status(&response, 200)?;

    let posts = array_of(response.body())?;
    require_len(posts, 2)?;
    require_eq(&field_u64(&posts[0], "id")?, &first.get(), "id of first filtered post")?;
    require_eq(&field_u64(&posts[1], "id")?, &second.get(), "id of second filtered post")
}

// ============================================================================
// SECTION: Authorization Cases
// ============================================================================

/// Posts to the guarded scope without credentials.
async fn create_post_unauthorized(ctx: &mut CaseContext<'_>) -> CheckResult {
    let body = Post::with_text(ctx.fake.lorem_default());
    let request =
        RequestSpec::post(ctx.settings.scoped_posts_path()).json(&body)?.fail_on_status(false);
    let response = ctx.client.send(request).await?;
    require_status(&response, 401)
}

/// Registers, then creates and reads back under the guarded scope.
async fn create_post_with_token(ctx: &mut CaseContext<'_>) -> CheckResult {
    ctx.note("register user");
    let mut user = User::new(ctx.fake.credentials());
    let request = RequestSpec::post(REGISTER_PATH).json(&user.credentials)?.fail_on_status(false);
    let response = ctx.client.send(request).await?;
    require_status(&response, 201)?;
    let registered: RegisteredUser = response.json()?;
    require(!registered.access_token.is_blank(), "registration returned an empty access token")?;
    if let Some(record) = &registered.user {
        let email = field_str(record, "email")?;
        require_eq(email, user.credentials.email.as_str(), "registered user email")?;
    }
    user.authorize(registered.access_token);
    let token = user
        .access_token
        .as_ref()
        .ok_or_else(|| CheckError::failed("user holds no access token after registration"))?;
    ctx.note(format!("registered {}", user.credentials.email));

    ctx.note("create scoped post");
    let title = ctx.fake.lorem_words(2, 5);
    let scoped = ctx.settings.scoped_posts_path();
    let request = RequestSpec::post(scoped.as_str())
        .json(&Post::with_text(title.as_str()))?
        .bearer(token)
        .fail_on_status(false);
    let response = ctx.client.send(request).await?;
    require_status(&response, 201)?;
    require_eq(field_str(response.body(), "text")?, title.as_str(), "created scoped post text")?;

    let response = ctx.client.send(RequestSpec::get(scoped.as_str())).await?;
    let posts = array_of(response.body())?;
    let last = posts
        .last()
        .ok_or_else(|| CheckError::failed(format!("{scoped} returned no posts after create")))?;
    require(
        has_string_value(last, &title),
        format!("last post in {scoped} does not contain title \"{title}\""),
    )
}

// ============================================================================
// SECTION: Write Cases
// ============================================================================

/// Creates a post with a random id and title and checks the echo.
async fn create_post(ctx: &mut CaseContext<'_>) -> CheckResult<(PostId, String)> {
    let id = ctx.fake.post_id();
    let title = ctx.fake.lorem_words(1, 5);
    let request = RequestSpec::post(POSTS_PATH)
        .json(&Post::titled(id, title.as_str()))?
        .fail_on_status(false);
    let response = ctx.client.send(request).await?;
    require_status(&response, 201)?;
    let created: Post = response.json()?;
    require_eq(&created.id, &Some(id), "created post id")?;
    require_eq(&created.title.as_deref(), &Some(title.as_str()), "created post title")?;
    ctx.note(format!("created post {id}"));
    Ok((id, title))
}

/// Replaces the title of an existing post and checks the echo.
async fn update_title(ctx: &mut CaseContext<'_>, id: PostId) -> CheckResult<String> {
    let title = ctx.fake.lorem_words(1, 5);
    let request = RequestSpec::put(post_path(id))
        .json(&json!({ "title": title }))?
        .fail_on_status(false);
    let response = ctx.client.send(request).await?;
    require_status(&response, 200)?;
    let updated: Post = response.json()?;
    require_eq(&updated.id, &Some(id), "updated post id")?;
    require_eq(&updated.title.as_deref(), &Some(title.as_str()), "updated post title")?;
    Ok(title)
}

/// Sends a collection-level update.
async fn update_missing_entity(ctx: &mut CaseContext<'_>) -> CheckResult {
    let request = RequestSpec::put(POSTS_PATH)
        .json(&json!({ "userid": ctx.fake.lorem_default() }))?
        .fail_on_status(false);
    let response = ctx.client.send(request).await?;
    require_status(&response, 404)
}

/// Creates a post and replaces its title.
async fn create_then_update(ctx: &mut CaseContext<'_>) -> CheckResult<PostId> {
    let (id, _) = create_post(ctx).await?;
    update_title(ctx, id).await?;
    Ok(id)
}

/// Sends a collection-level delete.
async fn delete_missing_entity(ctx: &mut CaseContext<'_>) -> CheckResult {
    let request = RequestSpec::delete(POSTS_PATH)
        .json(&json!({ "userid": ctx.fake.lorem_default() }))?
        .fail_on_status(false);
    let response = ctx.client.send(request).await?;
    require_status(&response, 404)
}

/// Full lifecycle ending with a 404 lookup.
async fn create_update_delete(ctx: &mut CaseContext<'_>) -> CheckResult {
    let id = create_then_update(ctx).await?;

    let response =
        ctx.client.send(RequestSpec::delete(post_path(id)).fail_on_status(false)).await?;
    require_status(&response, 200)?;
    ctx.note(format!("deleted post {id}"));

    let response = ctx.client.send(RequestSpec::get(post_path(id)).fail_on_status(false)).await?;
    require_status(&response, 404)
}
