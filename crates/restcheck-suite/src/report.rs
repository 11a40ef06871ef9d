// crates/restcheck-suite/src/report.rs
// ============================================================================
// Module: Suite Reports
// Description: JSON, Markdown, and text renderings of a suite run.
// Purpose: Persist run outcomes and the HTTP transcript as artifacts.
// Dependencies: restcheck-core, serde, serde_jcs
// ============================================================================

//! ## Overview
//! [`ReportWriter`] writes three artifacts into a directory:
//! `report.json` (canonical JCS JSON), `report.md`, and `transcript.json`.
//! [`render_text`] produces the console summary used by the CLI.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use restcheck_core::TranscriptEntry;
use serde::Serialize;
use thiserror::Error;

use crate::runner::CaseStatus;
use crate::runner::SuiteReport;

/// File name of the canonical JSON report.
pub const REPORT_JSON: &str = "report.json";
/// File name of the Markdown report.
pub const REPORT_MARKDOWN: &str = "report.md";
/// File name of the HTTP transcript.
pub const TRANSCRIPT_JSON: &str = "transcript.json";

/// Errors raised while writing report artifacts.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Filesystem failure.
    #[error("report io error at {path}: {message}")]
    Io {
        /// Path being written.
        path: String,
        /// I/O error description.
        message: String,
    },
    /// Serialization failure.
    #[error("report serialization failed: {0}")]
    Serialize(String),
}

/// Writes report artifacts into a directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    /// Output directory.
    dir: PathBuf,
}

impl ReportWriter {
    /// Creates a writer rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
        }
    }

    /// Writes the report and transcript, returning the written paths.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] when the directory or a file cannot be written.
    pub fn write(
        &self,
        report: &SuiteReport,
        transcript: &[TranscriptEntry],
    ) -> Result<Vec<PathBuf>, ReportError> {
        fs::create_dir_all(&self.dir).map_err(|err| io_error(&self.dir, &err))?;
        let written = vec![
            self.write_bytes(REPORT_JSON, &canonical_json(report)?)?,
            self.write_bytes(REPORT_MARKDOWN, render_markdown(report).as_bytes())?,
            self.write_bytes(TRANSCRIPT_JSON, &canonical_json(&transcript)?)?,
        ];
        Ok(written)
    }

    /// Writes one file under the output directory.
    fn write_bytes(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, ReportError> {
        let path = self.dir.join(name);
        fs::write(&path, bytes).map_err(|err| io_error(&path, &err))?;
        Ok(path)
    }
}

/// Serializes a value as canonical JCS JSON.
///
/// # Errors
///
/// Returns [`ReportError::Serialize`] when the value cannot be serialized.
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, ReportError> {
    serde_jcs::to_vec(value).map_err(|err| ReportError::Serialize(err.to_string()))
}

/// Renders the Markdown report.
#[must_use]
pub fn render_markdown(report: &SuiteReport) -> String {
    let mut out = String::new();
    out.push_str("# Restcheck Report\n\n");
    out.push_str("## Summary\n\n");
    let _ = writeln!(out, "- Target: {}", report.base_url);
    let _ = writeln!(out, "- Passed: {}", report.passed);
    let _ = writeln!(out, "- Failed: {}", report.failed);
    let _ = writeln!(out, "- Skipped: {}", report.skipped);
    let _ = writeln!(out, "- Duration (ms): {}", report.duration_ms);
    out.push_str("\n## Cases\n\n");
    out.push_str("| Case | Status | Duration (ms) |\n");
    out.push_str("| --- | --- | --- |\n");
    for case in &report.cases {
        let status = case.status.as_str();
        let _ = writeln!(out, "| {} | {status} | {} |", case.title, case.duration_ms);
    }
    let failures: Vec<_> =
        report.cases.iter().filter(|case| case.status == CaseStatus::Fail).collect();
    out.push_str("\n## Failures\n\n");
    if failures.is_empty() {
        out.push_str("- None\n");
    } else {
        for case in failures {
            let reason = case.failure.as_deref().unwrap_or("no failure message");
            let _ = writeln!(out, "- {}: {}", case.name, reason);
        }
    }
    out
}

/// Renders the console summary: one line per case plus a totals line.
#[must_use]
pub fn render_text(report: &SuiteReport) -> String {
    let mut out = String::new();
    for case in &report.cases {
        let label = match case.status {
            CaseStatus::Pass => "PASS",
            CaseStatus::Fail => "FAIL",
            CaseStatus::Skipped => "SKIP",
        };
        let _ = writeln!(out, "{label} {} ({} ms)", case.name, case.duration_ms);
        if let Some(failure) = &case.failure {
            let _ = writeln!(out, "     {failure}");
        }
    }
    let _ = writeln!(
        out,
        "{} passed, {} failed, {} skipped against {}",
        report.passed, report.failed, report.skipped, report.base_url
    );
    out
}

/// Wraps an I/O failure with its path.
fn io_error(path: &Path, err: &std::io::Error) -> ReportError {
    ReportError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}
