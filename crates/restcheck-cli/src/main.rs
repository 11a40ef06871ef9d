// crates/restcheck-cli/src/main.rs
// ============================================================================
// Module: Restcheck CLI Entry Point
// Description: Command dispatcher for running and inspecting the check suite.
// Purpose: Run the REST checks against a target server from the command line.
// Dependencies: clap, restcheck-config, restcheck-core, restcheck-suite, tokio,
// tracing-subscriber.
// ============================================================================

//! ## Overview
//! `restcheck run` loads the config, builds the HTTP client, runs the selected
//! cases in order, and prints a summary. The exit code is non-zero when any
//! case fails. Logs go to stderr and are filtered by `RESTCHECK_LOG`; command
//! output goes to stdout.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use restcheck_config::RestcheckConfig;
use restcheck_core::ApiClient;
use restcheck_core::FakeData;
use restcheck_core::TranscriptEntry;
use restcheck_suite::CaseId;
use restcheck_suite::ReportWriter;
use restcheck_suite::Suite;
use restcheck_suite::SuiteReport;
use restcheck_suite::SuiteSettings;
use restcheck_suite::report::canonical_json;
use restcheck_suite::report::render_text;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable holding the log filter directive.
const LOG_ENV: &str = "RESTCHECK_LOG";
/// Log filter used when `RESTCHECK_LOG` is unset or invalid.
const DEFAULT_LOG_FILTER: &str = "info";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "restcheck", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the check suite against a target server.
    Run(RunCommand),
    /// List case names in run order.
    List,
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for the `run` command.
#[derive(Args, Debug)]
struct RunCommand {
    /// Optional config file path (defaults to restcheck.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Override the target base URL.
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,
    /// Run only the named case (repeatable).
    #[arg(long = "case", value_name = "NAME")]
    cases: Vec<String>,
    /// Stop after the first failing case.
    #[arg(long)]
    fail_fast: bool,
    /// Write report artifacts into this directory.
    #[arg(long, value_name = "DIR")]
    report_dir: Option<PathBuf>,
    /// Summary output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Summary output formats.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    /// One line per case plus totals.
    Text,
    /// Canonical JSON report.
    Json,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a restcheck configuration file.
    Validate(ConfigValidateCommand),
}

/// Arguments for the `config validate` command.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to restcheck.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    init_logging()?;
    match cli.command {
        Commands::Run(command) => command_run(command).await,
        Commands::List => command_list(),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

/// Installs the stderr log subscriber.
fn init_logging() -> CliResult<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .map_err(|err| CliError::new(format!("failed to initialize logging: {err}")))
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes the `run` command.
async fn command_run(command: RunCommand) -> CliResult<ExitCode> {
    let config = load_run_config(&command)?;
    let client_config = config
        .target
        .client_config()
        .map_err(|err| CliError::new(format!("invalid target: {err}")))?;
    let client = ApiClient::new(client_config)
        .map_err(|err| CliError::new(format!("failed to build client: {err}")))?;
    let suite = build_suite(&config, &command)?;

    let mut fake = FakeData::new();
    let report = suite.run(&client, &mut fake).await;

    let dir = report_dir(&command, &config);
    finish_run(&mut std::io::stdout(), &report, &client.transcript(), command.format, dir)
}

/// Prints the summary, then persists the report when a directory is set.
///
/// The summary is on `out` before any report file is attempted.
fn finish_run<W: Write>(
    out: &mut W,
    report: &SuiteReport,
    transcript: &[TranscriptEntry],
    format: OutputFormat,
    dir: Option<PathBuf>,
) -> CliResult<ExitCode> {
    let summary = render_summary(report, format)?;
    writeln!(out, "{}", summary.trim_end()).map_err(|err| CliError::new(output_error(&err)))?;

    if let Some(dir) = dir {
        let written = ReportWriter::new(dir)
            .write(report, transcript)
            .map_err(|err| CliError::new(format!("failed to write report: {err}")))?;
        for path in written {
            tracing::info!(path = %path.display(), "report written");
        }
    }
    Ok(if report.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Loads the config and applies command-line overrides.
fn load_run_config(command: &RunCommand) -> CliResult<RestcheckConfig> {
    let mut config = RestcheckConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    if let Some(base_url) = &command.base_url {
        config
            .set_base_url(base_url)
            .map_err(|err| CliError::new(format!("invalid --base-url: {err}")))?;
    }
    Ok(config)
}

/// Builds the suite from fixture settings and the case selection.
fn build_suite(config: &RestcheckConfig, command: &RunCommand) -> CliResult<Suite> {
    let settings = SuiteSettings::from_config(&config.fixtures)
        .map_err(|err| CliError::new(format!("invalid fixtures: {err}")))?;
    let suite = Suite::standard(settings)
        .select(&command.cases)
        .map_err(|err| CliError::new(err.to_string()))?;
    Ok(suite.with_fail_fast(command.fail_fast))
}

/// Returns the report directory; the flag wins over the config file.
fn report_dir(command: &RunCommand, config: &RestcheckConfig) -> Option<PathBuf> {
    command.report_dir.clone().or_else(|| config.report.dir.clone())
}

/// Renders the run summary in the requested format.
fn render_summary(report: &SuiteReport, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Text => Ok(render_text(report)),
        OutputFormat::Json => {
            let bytes = canonical_json(report).map_err(|err| CliError::new(err.to_string()))?;
            String::from_utf8(bytes).map_err(|err| CliError::new(err.to_string()))
        }
    }
}

// ============================================================================
// SECTION: List Command
// ============================================================================

/// Executes the `list` command.
fn command_list() -> CliResult<ExitCode> {
    for line in case_lines() {
        write_stdout_line(&line).map_err(|err| CliError::new(output_error(&err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Renders one `name  title` line per case in run order.
fn case_lines() -> Vec<String> {
    CaseId::ALL.iter().map(|case| format!("{:<26} {}", case.as_str(), case.title())).collect()
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let config = RestcheckConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    write_stdout_line(&format!("config ok (target {})", config.target.base_url))
        .map_err(|err| CliError::new(output_error(&err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output failure message.
fn output_error(error: &std::io::Error) -> String {
    format!("failed to write stdout: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
