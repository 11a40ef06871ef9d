// system-tests/tests/suites/fault_detection.rs
// ============================================================================
// Module: Fault Detection Tests
// Description: Runs the suite against deliberately misbehaving stubs.
// Purpose: Prove each check fails when the server breaks its contract.
// Dependencies: system-tests helpers
// ============================================================================

//! ## Overview
//! Runs the suite against deliberately misbehaving stubs.
//! Invariants:
//! - A contract violation fails exactly the cases that cover it.
//! - A failing case does not stop later cases.
//! - Each failure message names the mismatched field or status.

use restcheck_suite::CaseId;
use restcheck_suite::CaseStatus;
use restcheck_suite::Suite;
use restcheck_suite::SuiteReport;
use restcheck_suite::SuiteSettings;
use system_tests::stub::StubOptions;

use crate::helpers;
use helpers::artifacts::TestReporter;
use helpers::harness::allocate_closed_addr;
use helpers::harness::client_for;
use helpers::harness::run_suite;
use helpers::harness::start_stub_with;
use helpers::harness::write_suite_artifacts;

fn failed_cases(report: &SuiteReport) -> Vec<&'static str> {
    report
        .cases
        .iter()
        .filter(|case| case.status == CaseStatus::Fail)
        .map(|case| case.name)
        .collect()
}

fn failure_of(report: &SuiteReport, case: CaseId) -> String {
    report.outcome(case).and_then(|outcome| outcome.failure.clone()).unwrap_or_default()
}

#[tokio::test(flavor = "multi_thread")]
async fn open_guard_is_detected() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("open_guard_is_detected")?;
    let stub = start_stub_with(StubOptions {
        enforce_auth: false,
        ..StubOptions::default()
    })?;
    let client = client_for(stub.base_url())?;

    let report = run_suite(&Suite::standard(SuiteSettings::default()), &client).await;
    let mut artifacts = write_suite_artifacts(&mut reporter, &report, &client)?;

    assert_eq!(failed_cases(&report), vec![CaseId::CreatePostUnauthorized.as_str()]);
    assert_eq!(report.passed, CaseId::ALL.len() - 1);
    let failure = failure_of(&report, CaseId::CreatePostUnauthorized);
    assert!(failure.contains("expected status 401, got 201"), "{failure}");

    artifacts.splice(0..0, ["summary.json".to_string(), "summary.md".to_string()]);
    reporter.finish("pass", vec!["unguarded scoped create was flagged".to_string()], artifacts)?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_fixture_posts_are_detected() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("missing_fixture_posts_are_detected")?;
    let stub = start_stub_with(StubOptions {
        seed_posts: 5,
        ..StubOptions::default()
    })?;
    let client = client_for(stub.base_url())?;

    let report = run_suite(&Suite::standard(SuiteSettings::default()), &client).await;
    let mut artifacts = write_suite_artifacts(&mut reporter, &report, &client)?;

    assert_eq!(
        failed_cases(&report),
        vec![CaseId::GetFirstPage.as_str(), CaseId::GetPostsByIds.as_str()]
    );
    let page = failure_of(&report, CaseId::GetFirstPage);
    assert!(page.contains("expected 10 items, got 5"), "{page}");
    let filtered = failure_of(&report, CaseId::GetPostsByIds);
    assert!(filtered.contains("expected 2 items, got 0"), "{filtered}");

    artifacts.splice(0..0, ["summary.json".to_string(), "summary.md".to_string()]);
    reporter.finish("pass", vec!["short fixture data was flagged".to_string()], artifacts)?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn reversed_listing_is_detected() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("reversed_listing_is_detected")?;
    let stub = start_stub_with(StubOptions {
        reverse_lists: true,
        ..StubOptions::default()
    })?;
    let client = client_for(stub.base_url())?;

    let report = run_suite(&Suite::standard(SuiteSettings::default()), &client).await;
    let mut artifacts = write_suite_artifacts(&mut reporter, &report, &client)?;

    assert_eq!(
        failed_cases(&report),
        vec![
            CaseId::GetFirstPage.as_str(),
            CaseId::GetPostsByIds.as_str(),
            CaseId::CreatePostWithToken.as_str(),
        ]
    );
    let page = failure_of(&report, CaseId::GetFirstPage);
    assert!(page.contains("id of post at index 0: expected 1, got 10"), "{page}");
    let filtered = failure_of(&report, CaseId::GetPostsByIds);
    assert!(filtered.contains("id of first filtered post: expected 55, got 60"), "{filtered}");
    let scoped = failure_of(&report, CaseId::CreatePostWithToken);
    assert!(scoped.contains("last post in /664/posts does not contain title"), "{scoped}");

    artifacts.splice(0..0, ["summary.json".to_string(), "summary.md".to_string()]);
    reporter.finish("pass", vec!["reversed list order was flagged".to_string()], artifacts)?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn ignored_update_is_detected() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("ignored_update_is_detected")?;
    let stub = start_stub_with(StubOptions {
        ignore_updates: true,
        ..StubOptions::default()
    })?;
    let client = client_for(stub.base_url())?;

    let report = run_suite(&Suite::standard(SuiteSettings::default()), &client).await;
    let mut artifacts = write_suite_artifacts(&mut reporter, &report, &client)?;

    assert_eq!(
        failed_cases(&report),
        vec![CaseId::CreateThenUpdate.as_str(), CaseId::CreateUpdateDelete.as_str()]
    );
    for case in [CaseId::CreateThenUpdate, CaseId::CreateUpdateDelete] {
        let failure = failure_of(&report, case);
        assert!(failure.contains("updated post title: expected"), "{case}: {failure}");
    }

    artifacts.splice(0..0, ["summary.json".to_string(), "summary.md".to_string()]);
    reporter.finish("pass", vec!["unapplied update was flagged".to_string()], artifacts)?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn ignored_delete_is_detected() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("ignored_delete_is_detected")?;
    let stub = start_stub_with(StubOptions {
        ignore_deletes: true,
        ..StubOptions::default()
    })?;
    let client = client_for(stub.base_url())?;

    let report = run_suite(&Suite::standard(SuiteSettings::default()), &client).await;
    let mut artifacts = write_suite_artifacts(&mut reporter, &report, &client)?;

    assert_eq!(failed_cases(&report), vec![CaseId::CreateUpdateDelete.as_str()]);
    let failure = failure_of(&report, CaseId::CreateUpdateDelete);
    assert!(failure.contains("expected status 404, got 200"), "{failure}");
    let outcome = report.outcome(CaseId::CreateUpdateDelete).ok_or("missing outcome")?;
    assert!(outcome.notes.iter().any(|note| note.starts_with("deleted post")));

    artifacts.splice(0..0, ["summary.json".to_string(), "summary.md".to_string()]);
    reporter.finish("pass", vec!["post readable after delete was flagged".to_string()], artifacts)?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_fails_every_case() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("unreachable_server_fails_every_case")?;
    let addr = allocate_closed_addr()?;
    let client = client_for(&format!("http://{addr}"))?;

    let report = run_suite(&Suite::standard(SuiteSettings::default()), &client).await;

    assert_eq!(report.failed, CaseId::ALL.len());
    assert_eq!(report.skipped, 0);
    for case in &report.cases {
        let failure = case.failure.as_deref().unwrap_or_default();
        assert!(failure.contains("failed after 1 attempt(s)"), "{}: {failure}", case.name);
    }
    let transcript = client.transcript();
    assert_eq!(transcript.len(), CaseId::ALL.len());
    assert!(transcript.iter().all(|entry| entry.status.is_none() && entry.error.is_some()));

    reporter.finish(
        "pass",
        vec!["every case failed with a transport error and the run continued".to_string()],
        vec!["summary.json".to_string(), "summary.md".to_string()],
    )?;
    Ok(())
}
