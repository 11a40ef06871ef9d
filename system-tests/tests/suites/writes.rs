// system-tests/tests/suites/writes.rs
// ============================================================================
// Module: Write Case Tests
// Description: Create, update, and delete cases against the stub.
// Purpose: Confirm chained writes hit the created id and leave no residue.
// Dependencies: system-tests helpers
// ============================================================================

//! ## Overview
//! Create, update, and delete cases against the stub.
//! Invariants:
//! - Chained requests reuse the id returned by the create step.
//! - Collection-level update and delete never touch stored posts.

use restcheck_suite::CaseId;
use system_tests::stub::StubOptions;

use crate::helpers;
use helpers::artifacts::TestReporter;
use helpers::harness::client_for;
use helpers::harness::failures;
use helpers::harness::run_suite;
use helpers::harness::start_stub;
use helpers::harness::suite_of;

#[tokio::test(flavor = "multi_thread")]
async fn create_update_delete_leaves_no_residue() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("create_update_delete_leaves_no_residue")?;
    let stub = start_stub()?;
    let client = client_for(stub.base_url())?;
    let seeded = usize::try_from(StubOptions::default().seed_posts)?;

    let report = run_suite(&suite_of(&[CaseId::CreateUpdateDelete])?, &client).await;
    assert!(report.is_success(), "failing cases: {}", failures(&report));
    assert_eq!(stub.inspector().post_count(), seeded);

    let calls: Vec<(String, u16)> = stub
        .requests()
        .into_iter()
        .map(|request| (format!("{} {}", request.method, request.path), request.status))
        .collect();
    assert_eq!(calls.len(), 4);
    let created_path = calls[1].0.trim_start_matches("PUT ").to_string();
    assert_eq!(calls[0], ("POST /posts".to_string(), 201));
    assert_eq!(calls[1].1, 200);
    assert_eq!(calls[2], (format!("DELETE {created_path}"), 200));
    assert_eq!(calls[3], (format!("GET {created_path}"), 404));

    reporter.finish(
        "pass",
        vec!["create, update, delete, and confirm-gone used one id".to_string()],
        vec!["summary.json".to_string(), "summary.md".to_string()],
    )?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn create_then_update_persists_new_title() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("create_then_update_persists_new_title")?;
    let stub = start_stub()?;
    let client = client_for(stub.base_url())?;

    let report = run_suite(&suite_of(&[CaseId::CreateThenUpdate])?, &client).await;
    assert!(report.is_success(), "failing cases: {}", failures(&report));

    let transcript = client.transcript();
    let update = transcript.iter().find(|entry| entry.method == "PUT").ok_or("no update sent")?;
    let id = update.path.trim_start_matches("/posts/");
    let stored = stub.inspector().post(id).ok_or("updated post missing from store")?;
    let sent_title = update.request.as_ref().and_then(|body| body["title"].as_str());
    assert_eq!(stored["title"].as_str(), sent_title);
    assert_eq!(stored["id"].to_string(), id);

    reporter.finish(
        "pass",
        vec![format!("post {id} stored the updated title")],
        vec!["summary.json".to_string(), "summary.md".to_string()],
    )?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn collection_level_writes_answer_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let mut reporter = TestReporter::new("collection_level_writes_answer_not_found")?;
    let stub = start_stub()?;
    let client = client_for(stub.base_url())?;
    let before = stub.inspector().post_count();

    let suite = suite_of(&[CaseId::UpdateMissingEntity, CaseId::DeleteMissingEntity])?;
    let report = run_suite(&suite, &client).await;
    assert!(report.is_success(), "failing cases: {}", failures(&report));
    assert_eq!(stub.inspector().post_count(), before);

    let statuses: Vec<u16> = stub.requests().iter().map(|request| request.status).collect();
    assert_eq!(statuses, vec![404, 404]);

    reporter.finish(
        "pass",
        vec!["PUT and DELETE on /posts answered 404".to_string()],
        vec!["summary.json".to_string(), "summary.md".to_string()],
    )?;
    Ok(())
}
