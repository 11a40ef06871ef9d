// crates/restcheck-suite/src/lib.rs
// ============================================================================
// Module: Restcheck Suite Library
// Description: Named CRUD check cases, sequential runner, and reports.
// Purpose: Execute the post/registration/authorization checks end to end.
// Dependencies: restcheck-core, restcheck-config, serde, serde_jcs, tracing
// ============================================================================

//! ## Overview
//! The suite is a fixed, ordered table of check cases. Each case issues one
//! or more chained requests through [`restcheck_core::ApiClient`] and asserts
//! on the final response. [`Suite::run`] executes cases one at a time and
//! collects a [`SuiteReport`]; [`ReportWriter`] persists it with the HTTP
//! transcript.
//!
//! Invariants:
//! - A case runs to completion before the next case starts.
//! - A failing case never prevents later cases from running unless fail-fast
//!   is requested.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod cases;
pub mod checks;
pub mod report;
pub mod runner;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use cases::CaseId;
pub use checks::CheckError;
pub use checks::CheckResult;
pub use report::ReportError;
pub use report::ReportWriter;
pub use runner::CaseOutcome;
pub use runner::CaseStatus;
pub use runner::Suite;
pub use runner::SuiteError;
pub use runner::SuiteReport;
pub use runner::SuiteSettings;
