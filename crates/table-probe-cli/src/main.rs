// crates/table-probe-cli/src/main.rs
// ============================================================================
// Module: Table Probe CLI Entry Point
// Description: Command dispatcher for contract runs, pings, and config checks.
// Purpose: Turn a run summary into report output and a process exit status.
// Dependencies: clap, table-probe-config, table-probe-core, thiserror, tokio.
// ============================================================================

//! ## Overview
//! `table-probe` verifies a running table-viewer API. `run` (the default)
//! executes the full contract suite, `ping` checks reachability only, and
//! `config validate` loads and validates `table-probe.toml`. The process exits
//! 0 when every critical check passed and 1 otherwise, including on usage or
//! configuration errors.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use table_probe_cli::render;
use table_probe_config::EventSinkKind;
use table_probe_config::ProbeConfig;
use table_probe_core::CheckOutcome;
use table_probe_core::ContractClient;
use table_probe_core::ContractSuite;
use table_probe_core::ContractVerifier;
use table_probe_core::FileEventSink;
use table_probe_core::NoopEventSink;
use table_probe_core::ProbeEventSink;
use table_probe_core::StderrEventSink;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "table-probe", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Options shared by every command.
    #[command(flatten)]
    global: GlobalArgs,
    /// Selected subcommand (defaults to `run`).
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options shared by every command; flags override config file values.
#[derive(Args, Debug, Clone, Default)]
struct GlobalArgs {
    /// Base URL of the table-viewer server.
    #[arg(long, value_name = "URL", global = true)]
    base_url: Option<String>,
    /// Config file path (overrides `TABLE_PROBE_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECS", global = true)]
    timeout_secs: Option<u64>,
    /// Append JSON-line request events to this file.
    #[arg(long, value_name = "PATH", global = true)]
    event_log: Option<PathBuf>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full contract suite.
    Run(RunCommand),
    /// Check that the tables endpoint is reachable.
    Ping,
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for `run`.
#[derive(Args, Debug, Default)]
struct RunCommand {
    /// Report format written to stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Also write the canonical JSON summary to this file.
    #[arg(long, value_name = "PATH")]
    summary_out: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the config file.
    Validate,
}

/// Report output formats.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    /// One line per check plus a summary line.
    #[default]
    Text,
    /// Canonical JSON run summary.
    Json,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return Ok(usage_exit(&err)),
    };

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("table-probe {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    match cli.command.unwrap_or_else(|| Commands::Run(RunCommand::default())) {
        Commands::Run(command) => command_run(&cli.global, &command).await,
        Commands::Ping => command_ping(&cli.global).await,
        Commands::Config {
            command: ConfigCommand::Validate,
        } => command_config_validate(&cli.global),
    }
}

/// Prints clap output and maps it to an exit code.
///
/// Help and version requests succeed; usage errors exit with 1.
fn usage_exit(err: &clap::Error) -> ExitCode {
    let _ = err.print();
    if err.use_stderr() { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes the full contract suite.
async fn command_run(global: &GlobalArgs, command: &RunCommand) -> CliResult<ExitCode> {
    let config = load_config(global)?;
    let verifier = build_verifier(&config)?;
    let suite = ContractSuite::new(verifier, config.suite_options());
    let summary = suite.run().await;

    match command.format {
        OutputFormat::Text => {
            for line in render::text_report(&summary) {
                write_stdout_line(&line)
                    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            }
        }
        OutputFormat::Json => {
            let bytes =
                render::canonical_json(&summary).map_err(|err| CliError::new(err.to_string()))?;
            write_stdout_bytes(&bytes)
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
    }
    if let Some(path) = &command.summary_out {
        let bytes =
            render::canonical_json(&summary).map_err(|err| CliError::new(err.to_string()))?;
        write_file(path, &bytes)?;
    }

    Ok(if summary.passed() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

// ============================================================================
// SECTION: Ping Command
// ============================================================================

/// Executes the connectivity ping.
async fn command_ping(global: &GlobalArgs) -> CliResult<ExitCode> {
    let config = load_config(global)?;
    let verifier = build_verifier(&config)?;
    let result = verifier.verify_connectivity().await;
    write_stdout_line(&render::check_line(&result))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(match result.outcome() {
        CheckOutcome::Failed(_) => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}

// ============================================================================
// SECTION: Config Command
// ============================================================================

/// Executes the config validation command.
fn command_config_validate(global: &GlobalArgs) -> CliResult<ExitCode> {
    let config = load_config(global)?;
    let source = config.source.as_ref().map_or_else(
        || "defaults; no config file found".to_string(),
        |path| path.display().to_string(),
    );
    write_stdout_line(&format!("Config valid ({source})"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line(&format!(
        "target: {}{} (timeout {}s)",
        config.target.base_url.trim_end_matches('/'),
        config.target.api_prefix,
        config.target.timeout_secs
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Setup Helpers
// ============================================================================

/// Loads the config file and applies command-line overrides.
fn load_config(global: &GlobalArgs) -> CliResult<ProbeConfig> {
    let mut config = ProbeConfig::load(global.config.as_deref())
        .map_err(|err| CliError::new(format!("Failed to load config: {err}")))?;
    apply_overrides(&mut config, global);
    config.validate().map_err(|err| CliError::new(format!("Failed to load config: {err}")))?;
    Ok(config)
}

/// Applies command-line overrides on top of file values.
fn apply_overrides(config: &mut ProbeConfig, global: &GlobalArgs) {
    if let Some(base_url) = &global.base_url {
        config.target.base_url.clone_from(base_url);
    }
    if let Some(timeout_secs) = global.timeout_secs {
        config.target.timeout_secs = timeout_secs;
    }
    if let Some(path) = &global.event_log {
        config.logging.sink = EventSinkKind::File;
        config.logging.path = Some(path.clone());
    }
}

/// Builds the verifier for a validated config.
fn build_verifier(config: &ProbeConfig) -> CliResult<ContractVerifier> {
    let client = ContractClient::new(config.client_config())
        .map_err(|err| CliError::new(err.to_string()))?;
    let sink = build_event_sink(config)?;
    Ok(ContractVerifier::new(client, config.catalog(), sink))
}

/// Builds the configured event sink.
fn build_event_sink(config: &ProbeConfig) -> CliResult<Arc<dyn ProbeEventSink>> {
    match (config.logging.sink, &config.logging.path) {
        (EventSinkKind::None, _) => Ok(Arc::new(NoopEventSink)),
        (EventSinkKind::Stderr, _) => Ok(Arc::new(StderrEventSink)),
        (EventSinkKind::File, Some(path)) => {
            let sink = FileEventSink::new(path).map_err(|err| {
                CliError::new(format!("Failed to open event log {}: {err}", path.display()))
            })?;
            Ok(Arc::new(sink))
        }
        (EventSinkKind::File, None) => {
            Err(CliError::new("Event log path is required for the file sink".to_string()))
        }
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a file, mapping failures to a CLI error.
fn write_file(path: &Path, bytes: &[u8]) -> CliResult<()> {
    fs::write(path, bytes)
        .map_err(|err| CliError::new(format!("Failed to write {}: {err}", path.display())))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("Failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
