// system-tests/src/config/env.rs
// ============================================================================
// Module: System Test Environment
// Description: Environment-backed configuration for system tests.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: url
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement to avoid silent
//! misconfiguration. Invalid UTF-8 fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

// ============================================================================
// SECTION: Environment Constants
// ============================================================================

/// Environment keys for system test configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemTestEnv {
    /// Optional run root override.
    RunRoot,
    /// Optional bind address for the standalone stub server.
    StubBind,
    /// Optional live target URL; enables the live-server suite.
    TargetUrl,
    /// Optional timeout override in seconds (positive integer).
    TimeoutSeconds,
}

impl SystemTestEnv {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RunRoot => "RESTCHECK_SYSTEM_TEST_RUN_ROOT",
            Self::StubBind => "RESTCHECK_SYSTEM_TEST_STUB_BIND",
            Self::TargetUrl => "RESTCHECK_SYSTEM_TEST_TARGET_URL",
            Self::TimeoutSeconds => "RESTCHECK_SYSTEM_TEST_TIMEOUT_SEC",
        }
    }
}

// ============================================================================
// SECTION: Config Types
// ============================================================================

/// Typed system test configuration derived from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SystemTestConfig {
    /// Optional run root override.
    pub run_root: Option<PathBuf>,
    /// Optional stub server bind address.
    pub stub_bind: Option<SocketAddr>,
    /// Optional live target URL.
    pub target_url: Option<Url>,
    /// Optional timeout override in seconds (positive integer).
    pub timeout: Option<Duration>,
}

impl SystemTestConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when an environment value is not valid UTF-8, is empty,
    /// or fails validation (for example, an invalid timeout or URL).
    pub fn load() -> Result<Self, String> {
        let run_root = read_env_nonempty(SystemTestEnv::RunRoot.as_str())?.map(PathBuf::from);
        let stub_bind = read_env_nonempty(SystemTestEnv::StubBind.as_str())?
            .map(|value| parse_bind(SystemTestEnv::StubBind.as_str(), &value))
            .transpose()?;
        let target_url = read_env_nonempty(SystemTestEnv::TargetUrl.as_str())?
            .map(|value| parse_target_url(SystemTestEnv::TargetUrl.as_str(), &value))
            .transpose()?;
        let timeout = read_env_nonempty(SystemTestEnv::TimeoutSeconds.as_str())?
            .map(|value| parse_timeout_seconds(SystemTestEnv::TimeoutSeconds.as_str(), &value))
            .transpose()?;
        Ok(Self {
            run_root,
            stub_bind,
            target_url,
            timeout,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns an error when the environment variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, String> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string().map(Some).map_err(|_| format!("{name} must be valid UTF-8"))
    })
}

/// Reads an environment variable and rejects empty values.
///
/// # Errors
///
/// Returns an error when the variable is set but empty or whitespace.
fn read_env_nonempty(name: &str) -> Result<Option<String>, String> {
    match read_env_strict(name)? {
        Some(value) if value.trim().is_empty() => Err(format!("{name} must not be empty")),
        Some(value) => Ok(Some(value)),
        None => Ok(None),
    }
}

/// Parses a positive timeout value from an environment variable string.
///
/// # Errors
///
/// Returns an error when the value is missing, non-numeric, or zero.
fn parse_timeout_seconds(name: &str, raw: &str) -> Result<Duration, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(format!("{name} must be a positive integer number of seconds"));
    }
    let secs: u64 = trimmed
        .parse()
        .map_err(|_| format!("{name} must be a positive integer number of seconds"))?;
    if secs == 0 {
        return Err(format!("{name} must be greater than zero"));
    }
    Ok(Duration::from_secs(secs))
}

/// Parses a socket address such as `127.0.0.1:3000`.
///
/// # Errors
///
/// Returns an error when the value is not an `ip:port` pair.
fn parse_bind(name: &str, raw: &str) -> Result<SocketAddr, String> {
    raw.trim().parse().map_err(|_| format!("{name} must be an ip:port socket address"))
}

/// Parses an absolute http(s) URL.
///
/// # Errors
///
/// Returns an error when the value does not parse or uses another scheme.
fn parse_target_url(name: &str, raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw.trim()).map_err(|err| format!("{name} is not a valid url: {err}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("{name} must use http or https"));
    }
    Ok(url)
}
