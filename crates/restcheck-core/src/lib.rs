// crates/restcheck-core/src/lib.rs
// ============================================================================
// Module: Restcheck Core Library
// Description: HTTP client, resource model, and synthetic data for API checks.
// Purpose: Provide the request primitive every Restcheck case is built on.
// Dependencies: reqwest, serde, rand, thiserror, tracing
// ============================================================================

//! ## Overview
//! `restcheck-core` holds the building blocks of the check suite: a JSON HTTP
//! client with transcript capture, the loosely typed post and user records
//! exchanged with the server under test, and a synthetic data generator for
//! request bodies.
//!
//! Security posture: server responses are untrusted; access tokens are never
//! written to transcripts or debug output.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod error;
pub mod fake;
pub mod model;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use client::ApiClient;
pub use client::ApiResponse;
pub use client::ClientConfig;
pub use client::Method;
pub use client::RequestSpec;
pub use client::TranscriptEntry;
pub use error::ClientError;
pub use fake::FakeData;
pub use model::AccessToken;
pub use model::Credentials;
pub use model::Post;
pub use model::PostId;
pub use model::RegisteredUser;
pub use model::User;
