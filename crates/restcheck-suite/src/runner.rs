// crates/restcheck-suite/src/runner.rs
// ============================================================================
// Module: Suite Runner
// Description: Case selection, sequential execution, and outcome collection.
// Purpose: Run cases one at a time and summarize the results.
// Dependencies: restcheck-core, restcheck-config, serde, tracing
// ============================================================================

//! ## Overview
//! [`Suite`] holds an ordered list of [`CaseId`]s plus fixture settings.
//! [`Suite::run`] awaits each case in turn; a case, including every chained
//! request it makes, completes before the next one begins. Failures are
//! recorded and the run continues unless fail-fast is enabled, in which case
//! the remaining cases are reported as skipped.

use std::time::Instant;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use restcheck_config::ConfigError;
use restcheck_config::FixtureConfig;
use restcheck_core::ApiClient;
use restcheck_core::FakeData;
use restcheck_core::PostId;
use restcheck_core::client::elapsed_ms;
use serde::Serialize;
use thiserror::Error;
use tracing::Instrument;

use crate::cases;
use crate::cases::CaseContext;
use crate::cases::CaseId;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Fixture settings shared by every case in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteSettings {
    /// Guard path segment placed before `/posts` for authorized writes.
    pub scope: String,
    /// Two existing post ids, in request order.
    pub known_ids: (PostId, PostId),
    /// Size of the first page; ids `1..=page_size` must exist.
    pub page_size: usize,
}

impl Default for SuiteSettings {
    fn default() -> Self {
        Self {
            scope: "664".to_string(),
            known_ids: (PostId::new(55), PostId::new(60)),
            page_size: 10,
        }
    }
}

impl SuiteSettings {
    /// Builds settings from the validated fixtures config section.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::Config`] when the section is invalid.
    pub fn from_config(fixtures: &FixtureConfig) -> Result<Self, SuiteError> {
        fixtures.validate()?;
        Ok(Self {
            scope: fixtures.scope.clone(),
            known_ids: fixtures.known_pair()?,
            page_size: fixtures.page_size,
        })
    }

    /// Returns the guarded post collection path, e.g. `/664/posts`.
    #[must_use]
    pub fn scoped_posts_path(&self) -> String {
        format!("/{}{}", self.scope, cases::POSTS_PATH)
    }
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Final status of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    /// Every assertion held.
    Pass,
    /// A request or assertion failed.
    Fail,
    /// Not run because an earlier case failed under fail-fast.
    Skipped,
}

impl CaseStatus {
    /// Returns a stable label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Skipped => "skipped",
        }
    }
}

/// Result of one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseOutcome {
    /// Stable case name.
    pub name: &'static str,
    /// Human-readable case title.
    pub title: &'static str,
    /// Final status.
    pub status: CaseStatus,
    /// Wall time spent in the case.
    pub duration_ms: u64,
    /// Failure description when the case failed.
    pub failure: Option<String>,
    /// Progress notes recorded by the case.
    pub notes: Vec<String>,
}

impl CaseOutcome {
    /// Outcome for a case not run after fail-fast.
    fn skipped(case: CaseId) -> Self {
        Self {
            name: case.as_str(),
            title: case.title(),
            status: CaseStatus::Skipped,
            duration_ms: 0,
            failure: None,
            notes: Vec::new(),
        }
    }
}

/// Summary of a suite run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteReport {
    /// Base URL of the server under test.
    pub base_url: String,
    /// Wall-clock start time in Unix milliseconds.
    pub started_at_ms: u64,
    /// Total wall time of the run.
    pub duration_ms: u64,
    /// Number of passing cases.
    pub passed: usize,
    /// Number of failing cases.
    pub failed: usize,
    /// Number of skipped cases.
    pub skipped: usize,
    /// Per-case outcomes in run order.
    pub cases: Vec<CaseOutcome>,
}

impl SuiteReport {
    /// Tallies outcomes into a report.
    fn new(
        base_url: String,
        started_at_ms: u64,
        duration_ms: u64,
        cases: Vec<CaseOutcome>,
    ) -> Self {
        let count = |status: CaseStatus| cases.iter().filter(|case| case.status == status).count();
        Self {
            base_url,
            started_at_ms,
            duration_ms,
            passed: count(CaseStatus::Pass),
            failed: count(CaseStatus::Fail),
            skipped: count(CaseStatus::Skipped),
            cases,
        }
    }

    /// Returns true when no case failed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Returns the outcome of a named case.
    #[must_use]
    pub fn outcome(&self, case: CaseId) -> Option<&CaseOutcome> {
        self.cases.iter().find(|outcome| outcome.name == case.as_str())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while assembling a suite.
#[derive(Debug, Error)]
pub enum SuiteError {
    /// A selected case name does not exist.
    #[error("unknown case: {0}")]
    UnknownCase(String),
    /// Fixture settings are invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ============================================================================
// SECTION: Suite
// ============================================================================

/// Ordered set of cases sharing one set of fixture settings.
#[derive(Debug, Clone)]
pub struct Suite {
    /// Cases in run order.
    cases: Vec<CaseId>,
    /// Fixture settings.
    settings: SuiteSettings,
    /// Stop after the first failure.
    fail_fast: bool,
}

impl Suite {
    /// Returns every case in run order.
    #[must_use]
    pub fn standard(settings: SuiteSettings) -> Self {
        Self {
            cases: CaseId::ALL.to_vec(),
            settings,
            fail_fast: false,
        }
    }

    /// Restricts the suite to the named cases, keeping run order.
    ///
    /// An empty selection keeps every case.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::UnknownCase`] for a name that matches no case.
    pub fn select<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self, SuiteError> {
        if names.is_empty() {
            return Ok(self);
        }
        let mut wanted = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let case: CaseId =
                name.parse().map_err(|_| SuiteError::UnknownCase(name.to_string()))?;
            wanted.push(case);
        }
        self.cases.retain(|case| wanted.contains(case));
        Ok(self)
    }

    /// Stops after the first failing case when enabled.
    #[must_use]
    pub const fn with_fail_fast(mut self, enabled: bool) -> Self {
        self.fail_fast = enabled;
        self
    }

    /// Returns the selected cases in run order.
    #[must_use]
    pub fn cases(&self) -> &[CaseId] {
        &self.cases
    }

    /// Runs the selected cases sequentially.
    pub async fn run(&self, client: &ApiClient, fake: &mut FakeData) -> SuiteReport {
        let started_at_ms = now_millis();
        let started = Instant::now();
        tracing::info!(base_url = %client.base_url(), cases = self.cases.len(), "suite started");

        let mut outcomes = Vec::with_capacity(self.cases.len());
        let mut halted = false;
        for case in &self.cases {
            if halted {
                outcomes.push(CaseOutcome::skipped(*case));
                continue;
            }
            let outcome = run_case(*case, client, fake, &self.settings).await;
            halted = self.fail_fast && outcome.status == CaseStatus::Fail;
            outcomes.push(outcome);
        }

        let base_url = client.base_url().to_string();
        let report = SuiteReport::new(base_url, started_at_ms, elapsed_ms(started), outcomes);
        tracing::info!(
            passed = report.passed,
            failed = report.failed,
            skipped = report.skipped,
            duration_ms = report.duration_ms,
            "suite finished"
        );
        report
    }
}

/// Runs one case inside its own span and converts the result to an outcome.
async fn run_case(
    case: CaseId,
    client: &ApiClient,
    fake: &mut FakeData,
    settings: &SuiteSettings,
) -> CaseOutcome {
    let span = tracing::info_span!("case", name = case.as_str());
    let started = Instant::now();
    let mut ctx = CaseContext::new(client, fake, settings);
    let result = cases::execute(case, &mut ctx).instrument(span).await;
    let duration_ms = elapsed_ms(started);
    let notes = ctx.into_notes();

    match result {
        Ok(()) => {
            tracing::info!(case = case.as_str(), duration_ms, "case passed");
            CaseOutcome {
                name: case.as_str(),
                title: case.title(),
                status: CaseStatus::Pass,
                duration_ms,
                failure: None,
                notes,
            }
        }
        Err(err) => {
            tracing::warn!(case = case.as_str(), duration_ms, error = %err, "case failed");
            CaseOutcome {
                name: case.as_str(),
                title: case.title(),
                status: CaseStatus::Fail,
                duration_ms,
                failure: Some(err.to_string()),
                notes,
            }
        }
    }
}

/// Wall-clock milliseconds since the Unix epoch.
fn now_millis() -> u64 {
    let millis = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
    u64::try_from(millis).unwrap_or(u64::MAX)
}
