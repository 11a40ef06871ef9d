// system-tests/tests/helpers/artifacts.rs
// ============================================================================
// Module: Test Artifacts
// Description: Per-test artifact roots and pass/fail summaries.
// Purpose: Leave a summary and the suite report behind for every test run.
// Dependencies: system-tests, restcheck-suite, serde
// ============================================================================

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use restcheck_suite::SuiteReport;
use restcheck_suite::report::canonical_json;
use serde::Serialize;
use system_tests::config::SystemTestConfig;

/// Default artifact root when `RESTCHECK_SYSTEM_TEST_RUN_ROOT` is unset.
const DEFAULT_RUN_ROOT: &str = "target/system-tests";

/// Case totals of the last suite run recorded by a test.
#[derive(Debug, Clone, Serialize)]
struct SuiteTotals {
    /// Server the suite ran against.
    base_url: String,
    /// Passing cases.
    passed: usize,
    /// Failing cases.
    failed: usize,
    /// Skipped cases.
    skipped: usize,
}

/// Contents of `summary.json`.
#[derive(Debug, Serialize)]
struct TestSummary<'a> {
    /// Test function name.
    test_name: &'a str,
    /// `pass`, `panic`, or `unknown`.
    status: &'a str,
    /// Time since the reporter was created.
    duration_ms: u128,
    /// Suite totals, when the test recorded a run.
    suite: Option<&'a SuiteTotals>,
    /// Free-form notes.
    notes: Vec<String>,
    /// Files written next to the summary.
    artifacts: Vec<String>,
}

/// Wall-clock milliseconds since the Unix epoch.
fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

/// Artifact directory of a single system-test.
#[derive(Debug, Clone)]
pub struct TestArtifacts {
    /// `<run root>/<test name>`.
    root: PathBuf,
}

impl TestArtifacts {
    /// Creates `<run root>/<test name>`; the run root defaults to a fresh
    /// timestamped directory under `target/system-tests`.
    pub fn new(test_name: &str) -> io::Result<Self> {
        let config = SystemTestConfig::load().map_err(io::Error::other)?;
        let run_root = config.run_root.unwrap_or_else(|| {
            PathBuf::from(DEFAULT_RUN_ROOT).join(format!("run_{}", now_millis()))
        });
        let root = run_root.join(test_name);
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
        })
    }

    /// Directory handed to `ReportWriter` for suite reports.
    pub fn report_dir(&self) -> PathBuf {
        self.root.join("report")
    }

    /// Writes `value` as canonical JSON.
    pub fn write_json<T: Serialize>(&self, name: &str, value: &T) -> io::Result<PathBuf> {
        let bytes = canonical_json(value).map_err(|err| io::Error::other(err.to_string()))?;
        self.write_file(name, &bytes)
    }

    /// Writes raw bytes under the artifact root.
    fn write_file(&self, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.root.join(name);
        fs::write(&path, bytes)?;
        Ok(path)
    }
}

/// Writes `summary.json` and `summary.md`, including when a test panics.
pub struct TestReporter {
    /// Artifact directory.
    artifacts: TestArtifacts,
    /// Test function name.
    test_name: String,
    /// Creation time in Unix milliseconds.
    started_at_ms: u128,
    /// Totals from [`TestReporter::record_suite`].
    suite: Option<SuiteTotals>,
    /// Set once a summary was written.
    finalized: bool,
}

impl TestReporter {
    /// Creates a reporter for the named test.
    pub fn new(test_name: &str) -> io::Result<Self> {
        Ok(Self {
            artifacts: TestArtifacts::new(test_name)?,
            test_name: test_name.to_string(),
            started_at_ms: now_millis(),
            suite: None,
            finalized: false,
        })
    }

    /// Returns the artifact directory.
    pub fn artifacts(&self) -> &TestArtifacts {
        &self.artifacts
    }

    /// Records suite totals for the summary.
    pub fn record_suite(&mut self, report: &SuiteReport) {
        self.suite = Some(SuiteTotals {
            base_url: report.base_url.clone(),
            passed: report.passed,
            failed: report.failed,
            skipped: report.skipped,
        });
    }

    /// Writes the final summary for the test.
    pub fn finish(
        &mut self,
        status: &str,
        notes: Vec<String>,
        artifacts: Vec<String>,
    ) -> io::Result<()> {
        let summary = TestSummary {
            test_name: &self.test_name,
            status,
            duration_ms: now_millis().saturating_sub(self.started_at_ms),
            suite: self.suite.as_ref(),
            notes,
            artifacts,
        };
        self.artifacts.write_json("summary.json", &summary)?;
        self.artifacts.write_file("summary.md", summary_markdown(&summary).as_bytes())?;
        self.finalized = true;
        Ok(())
    }
}

impl Drop for TestReporter {
    fn drop(&mut self) {
        if self.finalized {
            return;
        }
        let status = if std::thread::panicking() { "panic" } else { "unknown" };
        let _ = self.finish(status, vec!["no summary was written by the test".to_string()], vec![]);
    }
}

/// Renders `summary.md`.
fn summary_markdown(summary: &TestSummary<'_>) -> String {
    let mut out = format!("# {}\n\n", summary.test_name);
    let _ = writeln!(out, "Status: **{}** in {} ms", summary.status, summary.duration_ms);
    if let Some(suite) = summary.suite {
        let _ = writeln!(
            out,
            "\nSuite against `{}`: {} passed, {} failed, {} skipped",
            suite.base_url, suite.passed, suite.failed, suite.skipped
        );
    }
    for (heading, items) in [("Notes", &summary.notes), ("Artifacts", &summary.artifacts)] {
        let _ = writeln!(out, "\n## {heading}\n");
        if items.is_empty() {
            out.push_str("- None\n");
        }
        for item in items {
            let _ = writeln!(out, "- {item}");
        }
    }
    out
}
