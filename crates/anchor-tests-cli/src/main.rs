// crates/anchor-tests-cli/src/main.rs
// ============================================================================
// Module: Anchor Tests CLI Entry Point
// Description: Command dispatcher for planning and running conformance tests.
// Purpose: Provide the `anchor-tests` binary over the built-in suites.
// Dependencies: anchor-tests-config, anchor-tests-core, anchor-tests-http,
// anchor-tests-suites, clap, serde_json, thiserror, tokio.
// ============================================================================

//! ## Overview
//! The CLI loads `anchor-tests.toml`, applies command-line overrides to the
//! `[run]` section, and then either prints the resolved plan (`list`) or
//! executes it (`run`). Results stream to stdout as each test finishes; the
//! exit code is non-zero when any test failed or the pass was cancelled.
//! Ctrl-C requests cancellation between tests.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anchor_tests_config::AnchorTestsConfig;
use anchor_tests_config::OutputFormat;
use anchor_tests_config::config_toml_example;
use anchor_tests_config::default_config_path;
use anchor_tests_core::CancelFlag;
use anchor_tests_core::Harness;
use anchor_tests_core::PlanEntry;
use anchor_tests_core::ProtocolId;
use anchor_tests_core::RunSummary;
use anchor_tests_core::TestRunRecord;
use anchor_tests_core::TestStatus;
use anchor_tests_http::ReqwestCaller;
use anchor_tests_suites::default_catalog;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde_json::json;
use thiserror::Error;
use tokio::sync::mpsc;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "anchor-tests", version, disable_help_subcommand = true)]
struct Cli {
    /// Config file path (defaults to `ANCHOR_TESTS_CONFIG`, then `anchor-tests.toml`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the resolved test plan without running it.
    List(RunArgs),
    /// Run the resolved test plan.
    Run(RunArgs),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate the configuration file.
    Validate,
    /// Print an example configuration file.
    Example,
}

/// Overrides applied to the `[run]` section.
#[derive(Args, Debug, Clone, Default)]
struct RunArgs {
    /// Anchor home domain (e.g. `testanchor.stellar.org`).
    #[arg(long, value_name = "DOMAIN")]
    domain: Option<String>,
    /// Protocols to test; repeat or separate with commas (e.g. `1,sep-10,6`).
    #[arg(long = "protocol", value_name = "ID", value_delimiter = ',')]
    protocols: Vec<ProtocolId>,
    /// Asset code to exercise.
    #[arg(long, value_name = "CODE")]
    asset_code: Option<String>,
    /// Print network calls for every test.
    #[arg(long)]
    verbose: bool,
    /// Output format.
    #[arg(long, value_enum, value_name = "FORMAT")]
    format: Option<FormatArg>,
}

/// Output format flag.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum FormatArg {
    /// Human-readable lines.
    Text,
    /// One JSON document per line.
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self { message }
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
    match cli.command {
        Commands::List(args) => command_list(cli.config.as_deref(), &args),
        Commands::Run(args) => command_run(cli.config.as_deref(), &args).await,
        Commands::Config { command } => command_config(cli.config.as_deref(), &command),
    }
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(path: Option<&Path>, command: &ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate => {
            AnchorTestsConfig::load(path)
                .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
            stdout_line("config is valid")?;
        }
        ConfigCommand::Example => stdout_line(config_toml_example().trim_end())?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Loads the config file and applies `args`.
///
/// A missing default config file is treated as an empty one so a run can be
/// driven entirely by flags; an explicit `--config` path must exist.
fn load_config(path: Option<&Path>, args: &RunArgs) -> CliResult<AnchorTestsConfig> {
    let implicit_missing =
        path.is_none() && default_config_path().is_ok_and(|default| !default.exists());
    let mut config = if implicit_missing {
        AnchorTestsConfig::default()
    } else {
        AnchorTestsConfig::load(path)
            .map_err(|err| CliError::new(format!("failed to load config: {err}")))?
    };
    apply_overrides(&mut config, args);
    config.validate_for_run().map_err(|err| CliError::new(err.to_string()))?;
    Ok(config)
}

/// Applies command-line overrides to the loaded config.
fn apply_overrides(config: &mut AnchorTestsConfig, args: &RunArgs) {
    if let Some(domain) = &args.domain {
        config.run.domain.clone_from(domain);
    }
    if !args.protocols.is_empty() {
        config.run.protocols.clone_from(&args.protocols);
    }
    if let Some(asset_code) = &args.asset_code {
        config.run.asset_code = Some(asset_code.clone());
    }
    if args.verbose {
        config.run.verbose = true;
    }
    if let Some(format) = args.format {
        config.output.format = format.into();
    }
}

/// Builds a harness over the built-in suites.
fn build_harness(config: &AnchorTestsConfig) -> CliResult<Harness> {
    let catalog = default_catalog()
        .map_err(|err| CliError::new(format!("built-in catalog is invalid: {err}")))?;
    let caller = ReqwestCaller::new().map_err(|err| CliError::new(err.to_string()))?;
    let events = config.event_sink().map_err(|err| CliError::new(err.to_string()))?;
    Ok(Harness::new(Arc::new(catalog), Arc::new(caller)).with_events(events))
}

// ============================================================================
// SECTION: List Command
// ============================================================================

/// Executes the `list` command.
fn command_list(path: Option<&Path>, args: &RunArgs) -> CliResult<ExitCode> {
    let config = load_config(path, args)?;
    let harness = build_harness(&config)?;
    let plan = harness.plan(&config.run).map_err(|err| CliError::new(err.to_string()))?;
    for entry in plan.entries() {
        let line = match config.output.format {
            OutputFormat::Text => render_plan_entry(&entry),
            OutputFormat::Json => serde_json::to_string(&entry).map_err(json_error)?,
        };
        stdout_line(&line)?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Renders one plan entry as text.
fn render_plan_entry(entry: &PlanEntry) -> String {
    let mut line = format!("[{}] {}: {}", entry.protocol, entry.test_id, entry.assertion);
    if !entry.dependencies.is_empty() {
        let after: Vec<&str> = entry.dependencies.iter().map(|id| id.as_str()).collect();
        line.push_str(&format!(" (after {})", after.join(", ")));
    }
    line
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes the `run` command, streaming results as they complete.
async fn command_run(path: Option<&Path>, args: &RunArgs) -> CliResult<ExitCode> {
    let config = load_config(path, args)?;
    let harness = build_harness(&config)?;
    let cancel = CancelFlag::new();
    let mut execution = harness
        .run_with_cancel(config.run.clone(), cancel.clone())
        .map_err(|err| CliError::new(err.to_string()))?;

    let (sender, mut receiver) = mpsc::unbounded_channel::<TestRunRecord>();
    let worker = tokio::task::spawn_blocking(move || {
        for run in execution.by_ref() {
            if sender.send(run.to_record()).is_err() {
                break;
            }
        }
        *execution.summary()
    });

    let format = config.output.format;
    let verbose = config.run.verbose;
    loop {
        tokio::select! {
            record = receiver.recv() => {
                let Some(record) = record else { break };
                for line in render_record(&record, format, verbose)? {
                    stdout_line(&line)?;
                }
            }
            signal = tokio::signal::ctrl_c(), if !cancel.is_cancelled() => {
                signal.map_err(|err| CliError::new(format!("signal handler failed: {err}")))?;
                cancel.cancel();
                stderr_line("cancellation requested; stopping after the current test")?;
            }
        }
    }

    let summary =
        worker.await.map_err(|err| CliError::new(format!("run worker failed: {err}")))?;
    stdout_line(&render_summary(&summary, format)?)?;
    Ok(if summary.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Renders one result as output lines.
fn render_record(
    record: &TestRunRecord,
    format: OutputFormat,
    verbose: bool,
) -> CliResult<Vec<String>> {
    if format == OutputFormat::Json {
        return Ok(vec![serde_json::to_string(record).map_err(json_error)?]);
    }
    let label = match record.status {
        TestStatus::Passed => "PASS",
        TestStatus::Failed => "FAIL",
        TestStatus::Skipped => "SKIP",
    };
    let mut lines = vec![format!(
        "{label} [{}] {} ({}): {}",
        record.protocol, record.test_id, record.group, record.assertion
    )];
    if let Some(failure) = &record.failure {
        lines.push(format!("     {}: {}", failure.kind, failure.message));
    }
    if verbose {
        for call in &record.network_calls {
            let outcome = call
                .response
                .as_ref()
                .map_or_else(|| "no response".to_string(), |response| response.status.to_string());
            lines.push(format!("     {} {} -> {outcome}", call.request.method, call.request.url));
        }
    }
    Ok(lines)
}

/// Renders the closing summary line.
fn render_summary(summary: &RunSummary, format: OutputFormat) -> CliResult<String> {
    if format == OutputFormat::Json {
        let summary = serde_json::to_value(summary).map_err(json_error)?;
        return serde_json::to_string(&json!({ "summary": summary })).map_err(json_error);
    }
    let mut line = format!(
        "{} passed, {} failed, {} skipped of {} planned",
        summary.passed, summary.failed, summary.skipped, summary.planned
    );
    if summary.cancelled {
        line.push_str(" (cancelled)");
    }
    Ok(line)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Maps a serialization failure to a [`CliError`].
fn json_error(err: serde_json::Error) -> CliError {
    CliError::new(format!("json output failed: {err}"))
}

/// Writes a line to stdout.
fn stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| CliError::new(format!("failed to write to stdout: {err}")))
}

/// Writes a line to stderr.
fn stderr_line(message: &str) -> CliResult<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
        .map_err(|err| CliError::new(format!("failed to write to stderr: {err}")))
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = stderr_line(message);
    ExitCode::FAILURE
}
