// system-tests/tests/suites/smoke.rs
// ============================================================================
// Module: Smoke Tests
// Description: Full suite runs against the stub and an optional live target.
// Purpose: Confirm every case passes end to end and reports are written.
// Dependencies: system-tests helpers
// ============================================================================

//! ## Overview
//! Full suite runs against the stub and an optional live target.
//! Invariants:
//! - Cases run in their fixed order and all pass against the stub.
//! - Report artifacts are produced for every run.

use restcheck_suite::CaseId;
use restcheck_suite::CaseStatus;
use restcheck_suite::Suite;
use restcheck_suite::SuiteSettings;
use system_tests::config::SystemTestConfig;

use crate::helpers;
use helpers::artifacts::TestReporter;
use helpers::harness::client_for;
use helpers::harness::failures;
use helpers::harness::run_suite;
use helpers::harness::start_stub;
use helpers::harness::write_suite_artifacts;

#[tokio::test(flavor = "multi_thread")]
async fn full_suite_passes_against_stub() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("full_suite_passes_against_stub")?;
    let stub = start_stub()?;
    let client = client_for(stub.base_url())?;

    let suite = Suite::standard(SuiteSettings::default());
    let report = run_suite(&suite, &client).await;
    let mut artifacts = write_suite_artifacts(&mut reporter, &report, &client)?;

    assert!(report.is_success(), "failing cases: {}", failures(&report));
    assert_eq!(report.passed, CaseId::ALL.len());
    assert_eq!(report.skipped, 0);
    let names: Vec<&str> = report.cases.iter().map(|case| case.name).collect();
    let expected: Vec<&str> = CaseId::ALL.iter().map(|case| case.as_str()).collect();
    assert_eq!(names, expected);
    assert!(report.cases.iter().all(|case| case.status == CaseStatus::Pass));

    let report_dir = reporter.artifacts().report_dir();
    assert!(report_dir.join("report.json").is_file());
    assert!(report_dir.join("report.md").is_file());
    assert!(report_dir.join("transcript.json").is_file());

    artifacts.splice(0..0, ["summary.json".to_string(), "summary.md".to_string()]);
    reporter.finish(
        "pass",
        vec![format!("{} cases passed against the stub", report.passed)],
        artifacts,
    )?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn transcript_records_every_request_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("transcript_records_every_request_in_order")?;
    let stub = start_stub()?;
    let client = client_for(stub.base_url())?;

    let report = run_suite(&Suite::standard(SuiteSettings::default()), &client).await;
    assert!(report.is_success(), "failing cases: {}", failures(&report));

    let transcript = client.transcript();
    let requests = stub.requests();
    assert_eq!(transcript.len(), requests.len());
    for (index, (entry, seen)) in transcript.iter().zip(&requests).enumerate() {
        assert_eq!(entry.sequence, u64::try_from(index + 1)?);
        assert_eq!(entry.method, seen.method);
        assert_eq!(entry.status, Some(seen.status));
    }

    reporter.artifacts().write_json("transcript.json", &transcript)?;
    reporter.artifacts().write_json("stub_requests.json", &requests)?;
    reporter.finish(
        "pass",
        vec![format!("{} requests matched between client and stub", requests.len())],
        vec![
            "summary.json".to_string(),
            "summary.md".to_string(),
            "transcript.json".to_string(),
            "stub_requests.json".to_string(),
        ],
    )?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn live_target_suite() -> Result<(), Box<dyn std::error::Error>> {
    let config = SystemTestConfig::load()?;
    let Some(target) = config.target_url else {
        return Ok(());
    };
    let mut reporter = TestReporter::new("live_target_suite")?;
    let client = client_for(target.as_str())?;

    let report = run_suite(&Suite::standard(SuiteSettings::default()), &client).await;
    let mut artifacts = write_suite_artifacts(&mut reporter, &report, &client)?;
    assert!(report.is_success(), "failing cases against {target}: {}", failures(&report));

    artifacts.splice(0..0, ["summary.json".to_string(), "summary.md".to_string()]);
    reporter.finish("pass", vec![format!("live target {target} passed")], artifacts)?;
    Ok(())
}
