// crates/model-gate-cli/src/main.rs
// ============================================================================
// Module: Model Gate CLI Entry Point
// Description: Command dispatcher for serving, config checks, and envelopes.
// Purpose: Provide the `model-gate` operator binary.
// Dependencies: clap, model-gate-cli, model-gate-config, serde_json, tokio
// ============================================================================

//! ## Overview
//! `model-gate serve` runs the gateway and rollout agent until Ctrl-C.
//! `model-gate config validate` checks a configuration file and reports every
//! invalid field. `model-gate envelope keygen` and `envelope sign` produce keys
//! and signed envelopes for the agent.
//! Security posture: input files are size-limited; secrets are only written
//! to stdout on explicit request.

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
use model_gate_cli::envelope_tools::generate_keypair;
use model_gate_cli::envelope_tools::read_envelope_data;
use model_gate_cli::envelope_tools::read_signing_key;
use model_gate_cli::envelope_tools::sign_envelope;
use model_gate_cli::runtime::build_runtime;
use model_gate_cli::runtime::run;
use model_gate_config::ConfigError;
use model_gate_config::ModelGateConfig;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "model-gate", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the gateway and run the rollout agent.
    Serve(ConfigArgs),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Envelope key and signing utilities.
    Envelope {
        /// Selected envelope subcommand.
        #[command(subcommand)]
        command: EnvelopeCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a configuration file.
    Validate(ConfigArgs),
}

/// Envelope subcommands.
#[derive(Subcommand, Debug)]
enum EnvelopeCommand {
    /// Generate a signing key pair.
    Keygen,
    /// Sign envelope data.
    Sign(SignCommand),
}

/// Shared config path argument.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Optional config file path (defaults to model-gate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for envelope signing.
#[derive(Args, Debug)]
struct SignCommand {
    /// File holding the base64 signing key.
    #[arg(long, value_name = "PATH")]
    signing_key: PathBuf,
    /// Envelope type tag.
    #[arg(long = "type", value_name = "TYPE")]
    kind: String,
    /// JSON file holding the envelope data.
    #[arg(long, value_name = "PATH")]
    data: PathBuf,
    /// Optional key identifier placed on the envelope.
    #[arg(long, value_name = "ID")]
    key_id: Option<String>,
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
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run_cli(Cli::parse()).await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run_cli(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Commands::Serve(args) => command_serve(args).await,
        Commands::Config {
            command: ConfigCommand::Validate(args),
        } => command_config_validate(&args),
        Commands::Envelope {
            command,
        } => match command {
            EnvelopeCommand::Keygen => command_keygen(),
            EnvelopeCommand::Sign(command) => command_sign(&command),
        },
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(args: ConfigArgs) -> CliResult<ExitCode> {
    let config = ModelGateConfig::load(args.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let runtime = build_runtime(&config)
        .await
        .map_err(|err| CliError::new(format!("failed to initialize: {err}")))?;
    write_stderr_line(&format!("model-gate listening on {}", runtime.bind))
        .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    run(runtime, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
    .map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the config validation command.
fn command_config_validate(args: &ConfigArgs) -> CliResult<ExitCode> {
    match ModelGateConfig::load(args.config.as_deref()) {
        Ok(_) => {
            write_stdout_line("config ok")
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => Err(CliError::new(describe_config_error(&err))),
    }
}

/// Executes the `envelope keygen` command.
fn command_keygen() -> CliResult<ExitCode> {
    let keypair = generate_keypair();
    let rendered = serde_json::to_string_pretty(&keypair)
        .map_err(|err| CliError::new(format!("failed to render key pair: {err}")))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `envelope sign` command.
fn command_sign(command: &SignCommand) -> CliResult<ExitCode> {
    let signing_key =
        read_signing_key(&command.signing_key).map_err(|err| CliError::new(err.to_string()))?;
    let data = read_envelope_data(&command.data).map_err(|err| CliError::new(err.to_string()))?;
    let envelope = sign_envelope(&command.kind, data, &signing_key, command.key_id.clone())
        .map_err(|err| CliError::new(format!("failed to sign envelope: {err}")))?;
    let rendered = serde_json::to_string(&envelope)
        .map_err(|err| CliError::new(format!("failed to render envelope: {err}")))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Renders a config error, one field failure per line.
fn describe_config_error(err: &ConfigError) -> String {
    let fields = err.field_errors();
    if fields.is_empty() {
        return err.to_string();
    }
    let mut message = String::from("invalid config:");
    for field in fields {
        message.push_str("\n  ");
        message.push_str(&field.to_string());
    }
    message
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
