// system-tests/tests/suites/reads.rs
// ============================================================================
// Module: Read Case Tests
// Description: Listing, pagination, and id-filter cases against the stub.
// Purpose: Confirm the read cases send the expected queries and pass.
// Dependencies: system-tests helpers
// ============================================================================

//! ## Overview
//! Listing, pagination, and id-filter cases against the stub.

use restcheck_suite::CaseId;

use crate::helpers;
use helpers::artifacts::TestReporter;
use helpers::harness::client_for;
use helpers::harness::failures;
use helpers::harness::run_suite;
use helpers::harness::start_stub;
use helpers::harness::suite_of;

#[tokio::test(flavor = "multi_thread")]
async fn read_cases_pass() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("read_cases_pass")?;
    let stub = start_stub()?;
    let client = client_for(stub.base_url())?;

    let suite = suite_of(&[CaseId::GetAllPosts, CaseId::GetFirstPage, CaseId::GetPostsByIds])?;
    let report = run_suite(&suite, &client).await;
    assert!(report.is_success(), "failing cases: {}", failures(&report));
    assert_eq!(report.passed, 3);

    let paths: Vec<String> = stub.requests().into_iter().map(|request| request.path).collect();
    assert_eq!(paths, vec!["/posts", "/posts?_start=0&_end=10", "/posts?id=55&id=60"]);

    reporter.finish(
        "pass",
        vec!["read cases issued list, page, and id-filter queries".to_string()],
        vec!["summary.json".to_string(), "summary.md".to_string()],
    )?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn first_page_response_is_ordered() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("first_page_response_is_ordered")?;
    let stub = start_stub()?;
    let client = client_for(stub.base_url())?;

    let report = run_suite(&suite_of(&[CaseId::GetFirstPage])?, &client).await;
    assert!(report.is_success(), "failing cases: {}", failures(&report));

    let transcript = client.transcript();
    let entry = transcript.first().ok_or("no transcript entry")?;
    let ids: Vec<u64> = entry
        .response
        .as_array()
        .ok_or("page response is not an array")?
        .iter()
        .filter_map(|post| post["id"].as_u64())
        .collect();
    assert_eq!(ids, (1..=10).collect::<Vec<_>>());

    reporter.finish(
        "pass",
        vec!["first page holds ids 1..=10 in order".to_string()],
        vec!["summary.json".to_string(), "summary.md".to_string()],
    )?;
    Ok(())
}
