// crates/restcheck-config/src/lib.rs
// ============================================================================
// Module: Restcheck Config Library
// Description: Canonical config model and validation for restcheck.toml.
// Purpose: Single source of truth for target, fixture, and report settings.
// Dependencies: restcheck-core, serde, toml, url
// ============================================================================

//! ## Overview
//! `restcheck-config` defines the configuration model for a Restcheck run:
//! which server to target, which fixture data the server is assumed to hold,
//! and where reports go. Validation is strict and fail-closed.
//!
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
