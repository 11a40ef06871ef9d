// crates/restcheck-config/src/config.rs
// ============================================================================
// Module: Restcheck Configuration
// Description: restcheck.toml model, resolution rules, and validation.
// Purpose: Turn untrusted config input into validated run settings.
// Dependencies: restcheck-core, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is resolved in order: explicit path, then the
//! `RESTCHECK_CONFIG` environment variable, then `restcheck.toml` in the
//! working directory. An explicit or env-selected file must exist; the default
//! file is optional and built-in defaults apply when it is absent.
//! `RESTCHECK_BASE_URL` overrides `target.base_url` after the file is read.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use restcheck_core::ClientConfig;
use restcheck_core::PostId;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Limits and Defaults
// ============================================================================

/// Environment variable selecting the config file.
pub const CONFIG_ENV_VAR: &str = "RESTCHECK_CONFIG";
/// Environment variable overriding the target base URL.
pub const BASE_URL_ENV_VAR: &str = "RESTCHECK_BASE_URL";
/// Config file name looked up in the working directory.
pub const DEFAULT_CONFIG_NAME: &str = "restcheck.toml";
/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default per-request timeout in milliseconds.
pub(crate) const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Maximum per-request timeout in milliseconds.
pub(crate) const MAX_TIMEOUT_MS: u64 = 600_000;
/// Maximum send attempts per request.
pub(crate) const MAX_ATTEMPTS: u32 = 10;
/// Default guard scope segment for authorized writes.
pub(crate) const DEFAULT_SCOPE: &str = "664";
/// Default pair of post ids assumed to exist on the server.
pub(crate) const DEFAULT_KNOWN_IDS: [u64; 2] = [55, 60];
/// Default page size for the pagination check.
pub(crate) const DEFAULT_PAGE_SIZE: usize = 10;
/// Maximum page size for the pagination check.
pub(crate) const MAX_PAGE_SIZE: usize = 100;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Restcheck run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RestcheckConfig {
    /// Server under test.
    #[serde(default)]
    pub target: TargetConfig,
    /// Fixture data assumed to exist on the server.
    #[serde(default)]
    pub fixtures: FixtureConfig,
    /// Report output settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Server under test and request policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Base URL of the REST server.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Send attempts per request; `1` disables retries.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// Fixture data the checks rely on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureConfig {
    /// Guard path segment placed before `/posts` for authorized writes.
    #[serde(default = "default_scope")]
    pub scope: String,
    /// Exactly two existing post ids fetched by the id-filter check.
    #[serde(default = "default_known_ids")]
    pub known_ids: Vec<u64>,
    /// Page size for the pagination check; ids `1..=page_size` must exist.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            scope: default_scope(),
            known_ids: default_known_ids(),
            page_size: default_page_size(),
        }
    }
}

/// Report output settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Directory for report artifacts; reports are skipped when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl RestcheckConfig {
    /// Loads configuration using process environment for resolution.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |name| env::var(name).ok())
    }

    /// Loads configuration with an injectable environment lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match resolve_path(path, &lookup)? {
            Some(resolved) => Self::parse_file(&resolved)?,
            None => Self::default(),
        };
        config.apply_env_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a config file without applying overrides or validation.
    fn parse_file(path: &Path) -> Result<Self, ConfigError> {
        validate_path(path)?;
        let bytes = fs::read(path)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Applies environment overrides.
    fn apply_env_overrides<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(BASE_URL_ENV_VAR) {
            if base_url.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{BASE_URL_ENV_VAR} must not be empty")));
            }
            self.target.base_url = base_url.trim().to_string();
        }
        Ok(())
    }

    /// Replaces the target base URL and revalidates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the URL is invalid.
    pub fn set_base_url(&mut self, base_url: &str) -> Result<(), ConfigError> {
        self.target.base_url = base_url.trim().to_string();
        self.target.validate()
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.target.validate()?;
        self.fixtures.validate()?;
        self.report.validate()
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

impl TargetConfig {
    /// Validates the target section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a field is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parsed_base_url()?;
        if self.timeout_ms == 0 || self.timeout_ms > MAX_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "target.timeout_ms must be between 1 and {MAX_TIMEOUT_MS}"
            )));
        }
        if self.max_attempts == 0 || self.max_attempts > MAX_ATTEMPTS {
            return Err(ConfigError::Invalid(format!(
                "target.max_attempts must be between 1 and {MAX_ATTEMPTS}"
            )));
        }
        Ok(())
    }

    /// Parses the base URL, requiring an http(s) scheme and a host.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the URL is malformed or unsupported.
    pub fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.base_url)
            .map_err(|err| ConfigError::Invalid(format!("target.base_url is invalid: {err}")))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Invalid("target.base_url must use http or https".to_string()));
        }
        if url.host_str().is_none() {
            return Err(ConfigError::Invalid("target.base_url must include a host".to_string()));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(ConfigError::Invalid(
                "target.base_url must not include a query or fragment".to_string(),
            ));
        }
        Ok(url)
    }

    /// Builds HTTP client settings from the target section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the section is invalid.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        self.validate()?;
        let mut client = ClientConfig::new(self.parsed_base_url()?);
        client.timeout = Duration::from_millis(self.timeout_ms);
        client.max_attempts = self.max_attempts;
        Ok(client)
    }
}

impl FixtureConfig {
    /// Validates the fixtures section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a field is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scope = self.scope.as_str();
        if scope.is_empty() || scope.trim() != scope {
            return Err(ConfigError::Invalid(
                "fixtures.scope must be non-empty and trimmed".to_string(),
            ));
        }
        if scope.contains(['/', '?', '#']) {
            return Err(ConfigError::Invalid(
                "fixtures.scope must be a single path segment".to_string(),
            ));
        }
        self.known_pair()?;
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "fixtures.page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(())
    }

    /// Returns the two known post ids in request order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] unless exactly two distinct positive ids are set.
    pub fn known_pair(&self) -> Result<(PostId, PostId), ConfigError> {
        match self.known_ids.as_slice() {
            [first, second] if *first > 0 && *second > 0 && first != second => {
                Ok((PostId::new(*first), PostId::new(*second)))
            }
            _ => Err(ConfigError::Invalid(
                "fixtures.known_ids must hold exactly two distinct positive ids".to_string(),
            )),
        }
    }
}

impl ReportConfig {
    /// Validates the report section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the report directory path is unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(dir) = &self.dir {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("report.dir must not be empty".to_string()));
            }
            validate_path(dir)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI, environment, or the default file.
fn resolve_path<F>(path: Option<&Path>, lookup: &F) -> Result<Option<PathBuf>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = path {
        return Ok(Some(path.to_path_buf()));
    }
    if let Some(env_path) = lookup(CONFIG_ENV_VAR) {
        if env_path.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("{CONFIG_ENV_VAR} must not be empty")));
        }
        return Ok(Some(PathBuf::from(env_path)));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_NAME);
    Ok(default.is_file().then_some(default))
}

/// Validates a path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    if path.to_string_lossy().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    Ok(())
}

/// Default server base URL.
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// Default request timeout.
const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Default attempts per request.
const fn default_max_attempts() -> u32 {
    1
}

/// Default guarded scope segment.
fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

/// Default fixture ids.
fn default_known_ids() -> Vec<u64> {
    DEFAULT_KNOWN_IDS.to_vec()
}

/// Default first-page size.
const fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}
