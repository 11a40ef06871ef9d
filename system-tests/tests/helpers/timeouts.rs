// system-tests/tests/helpers/timeouts.rs
// ============================================================================
// Module: System Test Timeouts
// Description: Centralized timeout configuration with env overrides.
// Purpose: Keep system-test timeouts consistent and configurable across suites.
// ============================================================================

use std::time::Duration;

use system_tests::config::SystemTestConfig;

/// Returns the effective timeout, honoring `RESTCHECK_SYSTEM_TEST_TIMEOUT_SEC` when set.
/// The override acts as a minimum to avoid shortening explicitly longer test timeouts.
#[must_use]
pub fn resolve_timeout(requested: Duration) -> Duration {
    match SystemTestConfig::load() {
        Ok(config) => config.timeout.map_or(requested, |floor| requested.max(floor)),
        Err(err) => panic!("{err}"),
    }
}
