// system-tests/src/lib.rs
// ============================================================================
// Module: Restcheck System Tests Library
// Description: Shared configuration and the stub REST API for system tests.
// Purpose: Provide a local server and env settings for end-to-end suite runs.
// Dependencies: axum, serde_json, tokio, url
// ============================================================================

//! ## Overview
//! This crate hosts the env-driven system-test configuration and an in-process
//! stub of the REST API under test: a post collection with slicing and field
//! filters, user registration issuing access tokens, and a guarded scope
//! where reads are public and writes need a token. The suites in
//! `system-tests/tests` run the full check suite against it.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod stub;
