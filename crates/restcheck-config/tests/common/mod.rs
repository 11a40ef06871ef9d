// crates/restcheck-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared fixtures for restcheck-config integration tests.
// Purpose: Build minimal valid configs and assert on validation failures.
// =============================================================================

//! Shared fixtures for restcheck-config integration tests.

#![allow(dead_code, reason = "Shared helpers are reused across multiple test binaries.")]

use restcheck_config::ConfigError;
use restcheck_config::RestcheckConfig;

/// Result type used by config tests.
pub type TestResult = Result<(), String>;

/// Returns a minimal valid configuration.
pub fn minimal_config() -> Result<RestcheckConfig, ConfigError> {
    RestcheckConfig::from_toml_str("[target]\nbase_url = \"http://127.0.0.1:3000\"\n")
}

/// Asserts that a validation result failed with a message containing `needle`.
pub fn assert_invalid(result: Result<(), ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(()) => Err("expected invalid config".to_string()),
    }
}
