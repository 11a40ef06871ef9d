// system-tests/tests/helpers/harness.rs
// ============================================================================
// Module: Stub Server Harness
// Description: Helpers for running the check suite against the stub server.
// Purpose: Provide deterministic stub startup, clients, and suite runs.
// Dependencies: system-tests, restcheck-core, restcheck-suite
// ============================================================================

use std::net::SocketAddr;
use std::net::TcpListener;
use std::time::Duration;

use restcheck_core::ApiClient;
use restcheck_core::ClientConfig;
use restcheck_core::FakeData;
use restcheck_suite::CaseId;
use restcheck_suite::ReportWriter;
use restcheck_suite::Suite;
use restcheck_suite::SuiteReport;
use restcheck_suite::SuiteSettings;
use system_tests::stub::StubOptions;
use system_tests::stub::StubServerHandle;
use system_tests::stub::spawn_stub;
use url::Url;

use super::artifacts::TestReporter;
use super::timeouts::resolve_timeout;

/// Seed for generated request data; fixed so failures reproduce.
pub const FAKE_SEED: u64 = 0x5EED;

/// Per-request timeout used against the local stub.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Starts a stub server with default behavior.
pub fn start_stub() -> Result<StubServerHandle, String> {
    spawn_stub(StubOptions::default())
}

/// Starts a stub server with custom behavior.
pub fn start_stub_with(options: StubOptions) -> Result<StubServerHandle, String> {
    spawn_stub(options)
}

/// Builds a client for a base URL with the resolved test timeout.
pub fn client_for(base_url: &str) -> Result<ApiClient, String> {
    client_with_attempts(base_url, 1)
}

/// Builds a client that retries transport failures.
pub fn client_with_attempts(base_url: &str, max_attempts: u32) -> Result<ApiClient, String> {
    let url = Url::parse(base_url).map_err(|err| format!("invalid base url {base_url}: {err}"))?;
    let mut config = ClientConfig::new(url);
    config.timeout = resolve_timeout(REQUEST_TIMEOUT);
    config.max_attempts = max_attempts;
    ApiClient::new(config).map_err(|err| err.to_string())
}

/// Returns a suite restricted to the given cases, in run order.
pub fn suite_of(cases: &[CaseId]) -> Result<Suite, String> {
    let names: Vec<&str> = cases.iter().map(|case| case.as_str()).collect();
    Suite::standard(SuiteSettings::default()).select(&names).map_err(|err| err.to_string())
}

/// Runs a suite with seeded fake data.
pub async fn run_suite(suite: &Suite, client: &ApiClient) -> SuiteReport {
    let mut fake = FakeData::seeded(FAKE_SEED);
    suite.run(client, &mut fake).await
}

/// Records suite totals and writes the report and transcript under the
/// test's artifact root.
pub fn write_suite_artifacts(
    reporter: &mut TestReporter,
    report: &SuiteReport,
    client: &ApiClient,
) -> Result<Vec<String>, String> {
    reporter.record_suite(report);
    let dir = reporter.artifacts().report_dir();
    let written = ReportWriter::new(&dir)
        .write(report, &client.transcript())
        .map_err(|err| err.to_string())?;
    Ok(written
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| format!("report/{}", name.to_string_lossy()))
        .collect())
}

/// Returns a loopback address with nothing listening on it.
pub fn allocate_closed_addr() -> Result<SocketAddr, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("failed to bind loopback: {err}"))?;
    let addr =
        listener.local_addr().map_err(|err| format!("failed to read listener address: {err}"))?;
    drop(listener);
    Ok(addr)
}

/// Renders failing case names and reasons for assertion messages.
pub fn failures(report: &SuiteReport) -> String {
    report
        .cases
        .iter()
        .filter_map(|case| case.failure.as_ref().map(|reason| format!("{}: {reason}", case.name)))
        .collect::<Vec<_>>()
        .join("; ")
}
