// crates/serving-contract-cli/src/main.rs
// ============================================================================
// Module: Serving Contract CLI Entry Point
// Description: Command dispatcher for config, contract, and batch workflows.
// Purpose: Check a served model's contract offline and preview batching.
// Dependencies: clap, serving-contract-config, serving-contract-core, serde,
//               thiserror, tracing-subscriber.
// ============================================================================

//! ## Overview
//! The serving contract CLI validates client configuration, checks saved
//! model metadata and configuration documents against the configured
//! expectations, and previews how `.npy` inputs would be batched. Results go
//! to stdout as JSON; diagnostics go to stderr through `tracing`.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod npy;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serving_contract_config::ClientConfig;
use serving_contract_config::config_toml_example;
use serving_contract_core::BatchPlan;
use serving_contract_core::CastPolicy;
use serving_contract_core::ContractSource;
use serving_contract_core::DataType;
use serving_contract_core::HostTensor;
use serving_contract_core::InputFormat;
use serving_contract_core::ModelClient;
use serving_contract_core::ModelConfig;
use serving_contract_core::ModelMetadata;
use serving_contract_core::ModelRef;
use serving_contract_core::SourceError;
use serving_contract_core::connect;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::npy::decode_npy;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a saved metadata or configuration document.
const MAX_DOCUMENT_BYTES: usize = 4 * 1024 * 1024;
/// Maximum size of a single `.npy` input.
const MAX_NPY_BYTES: usize = 512 * 1024 * 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "serving-contract", version, disable_help_subcommand = true)]
struct Cli {
    /// Log level used when `RUST_LOG` is unset.
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    log_level: LogLevel,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Client configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Model contract checks against saved documents.
    Contract {
        /// Selected contract subcommand.
        #[command(subcommand)]
        command: ContractCommand,
    },
    /// Batch previews for saved inputs.
    Batch {
        /// Selected batch subcommand.
        #[command(subcommand)]
        command: BatchCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a client configuration file.
    Validate(ConfigValidateCommand),
    /// Print an example client configuration.
    Example,
}

/// Contract subcommands.
#[derive(Subcommand, Debug)]
enum ContractCommand {
    /// Validate saved metadata and configuration documents.
    Check(DocumentArgs),
}

/// Batch subcommands.
#[derive(Subcommand, Debug)]
enum BatchCommand {
    /// Show the batches generated for `.npy` inputs.
    Plan(BatchPlanCommand),
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Config file path (defaults to `SERVING_CONTRACT_CONFIG` or
    /// `serving-contract.toml`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Paths to the client config and the saved server documents.
#[derive(Args, Debug, Clone)]
struct DocumentArgs {
    /// Config file path (defaults to `SERVING_CONTRACT_CONFIG` or
    /// `serving-contract.toml`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Saved model metadata JSON.
    #[arg(long, value_name = "PATH")]
    metadata: PathBuf,
    /// Saved model configuration JSON.
    #[arg(long = "model-config", value_name = "PATH")]
    model_config: PathBuf,
}

/// Arguments for `batch plan`.
#[derive(Args, Debug)]
struct BatchPlanCommand {
    /// Client config and saved documents.
    #[command(flatten)]
    documents: DocumentArgs,
    /// `.npy` input files in model input order.
    #[arg(long = "input", value_name = "PATH", required = true)]
    inputs: Vec<PathBuf>,
}

/// Log levels accepted by `--log-level`.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum LogLevel {
    /// Errors only.
    Error,
    /// Warnings and errors.
    Warn,
    /// Informational messages.
    Info,
    /// Debug diagnostics.
    Debug,
    /// Everything.
    Trace,
}

impl LogLevel {
    /// Returns the filter directive for the level.
    const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

// ============================================================================
// SECTION: Output Types
// ============================================================================

/// JSON summary of a validated client.
#[derive(Debug, Serialize)]
struct ClientSummary {
    /// Model reference as `name[:version]`.
    model: String,
    /// Configured server address.
    server: String,
    /// Reported maximum batch size.
    max_batch_size: u32,
    /// Cast policy applied to batch slices.
    cast_policy: CastPolicy,
    /// Input details in model order.
    inputs: Vec<InputSummary>,
    /// Output names in model order.
    outputs: Vec<String>,
}

/// JSON summary of one model input.
#[derive(Debug, Serialize)]
struct InputSummary {
    /// Input name.
    name: String,
    /// Declared datatype.
    datatype: DataType,
    /// Reported shape.
    shape: Vec<i64>,
    /// Declared layout.
    format: InputFormat,
}

/// JSON summary of a batch plan.
#[derive(Debug, Serialize)]
struct PlanSummary {
    /// Model reference as `name[:version]`.
    model: String,
    /// Batch arithmetic.
    plan: BatchPlan,
    /// Generated batches in order.
    batches: Vec<BatchSummary>,
}

/// JSON summary of one generated batch.
#[derive(Debug, Serialize)]
struct BatchSummary {
    /// Batch index.
    index: usize,
    /// Rows in the batch.
    rows: usize,
    /// Per-input slices.
    inputs: Vec<SliceSummary>,
}

/// JSON summary of one input slice.
#[derive(Debug, Serialize)]
struct SliceSummary {
    /// Input name.
    name: String,
    /// Datatype after casting.
    datatype: DataType,
    /// Slice shape.
    shape: Vec<usize>,
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
    /// Constructs a new [`CliError`] from a message.
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
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_level)?;
    match cli.command {
        Commands::Config {
            command,
        } => command_config(command),
        Commands::Contract {
            command,
        } => command_contract(command),
        Commands::Batch {
            command,
        } => command_batch(command),
    }
}

/// Installs the stderr log subscriber; `RUST_LOG` overrides `level`.
fn init_logging(level: LogLevel) -> CliResult<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| CliError::new(format!("failed to initialize logging: {err}")))
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
        ConfigCommand::Example => {
            write_stdout_bytes(config_toml_example().as_bytes())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    write_stdout_line(&format!(
        "config ok: model {} with {} inputs and {} outputs",
        config.model_ref(),
        config.inputs.len(),
        config.outputs.len()
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Contract Commands
// ============================================================================

/// Dispatches contract subcommands.
fn command_contract(command: ContractCommand) -> CliResult<ExitCode> {
    match command {
        ContractCommand::Check(args) => {
            let (config, client) = build_client(&args)?;
            write_json(&client_summary(&config, &client))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Loads config and documents, then validates the contract.
fn build_client(args: &DocumentArgs) -> CliResult<(ClientConfig, ModelClient)> {
    let config = load_config(args.config.as_deref())?;
    let source = FileContractSource {
        metadata: args.metadata.clone(),
        model_config: args.model_config.clone(),
    };
    let client = connect(&source, &config.model_ref(), &config.expected_contract())
        .map_err(|err| CliError::new(format!("contract check failed: {err}")))?
        .with_cast_policy(config.cast_policy());
    Ok((config, client))
}

/// Builds the JSON summary for a validated client.
fn client_summary(config: &ClientConfig, client: &ModelClient) -> ClientSummary {
    let inputs = client
        .input_names()
        .iter()
        .zip(client.input_datatypes())
        .zip(client.input_shapes())
        .zip(client.input_formats())
        .map(|(((name, datatype), shape), format)| InputSummary {
            name: name.clone(),
            datatype: *datatype,
            shape: shape.to_vec(),
            format: *format,
        })
        .collect();
    ClientSummary {
        model: config.model_ref().to_string(),
        server: config.server.url.clone(),
        max_batch_size: client.max_batch_size(),
        cast_policy: client.cast_policy(),
        inputs,
        outputs: client.output_names().to_vec(),
    }
}

// ============================================================================
// SECTION: Batch Commands
// ============================================================================

/// Dispatches batch subcommands.
fn command_batch(command: BatchCommand) -> CliResult<ExitCode> {
    match command {
        BatchCommand::Plan(command) => {
            let (config, client) = build_client(&command.documents)?;
            let inputs =
                command.inputs.iter().map(|path| load_npy(path)).collect::<CliResult<Vec<_>>>()?;
            let summary = plan_batches(&client, inputs, config.model_ref())?;
            write_json(&summary)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Runs the batch generator and summarizes every batch.
fn plan_batches(
    client: &ModelClient,
    inputs: Vec<HostTensor>,
    model: ModelRef,
) -> CliResult<PlanSummary> {
    let batches = client
        .batches(inputs)
        .map_err(|err| CliError::new(format!("batching failed: {err}")))?;
    let plan = batches.plan();
    let batches = batches
        .map(|batch| {
            let batch = batch.map_err(|err| CliError::new(format!("batching failed: {err}")))?;
            Ok(BatchSummary {
                index: batch.index,
                rows: batch.rows(),
                inputs: batch
                    .inputs
                    .iter()
                    .map(|input| SliceSummary {
                        name: input.name.clone(),
                        datatype: input.data.datatype(),
                        shape: input.shape().to_vec(),
                    })
                    .collect(),
            })
        })
        .collect::<CliResult<Vec<_>>>()?;
    Ok(PlanSummary {
        model: model.to_string(),
        plan,
        batches,
    })
}

/// Reads and decodes one `.npy` input.
fn load_npy(path: &Path) -> CliResult<HostTensor> {
    let bytes = read_bytes_with_limit(path, MAX_NPY_BYTES)
        .map_err(|err| CliError::new(read_error(path, &err)))?;
    let tensor = decode_npy(&bytes)
        .map_err(|err| CliError::new(format!("{}: {err}", path.display())))?;
    debug!(
        path = %path.display(),
        datatype = %tensor.datatype(),
        shape = ?tensor.shape(),
        "loaded npy input"
    );
    Ok(tensor)
}

// ============================================================================
// SECTION: File Contract Source
// ============================================================================

/// Contract source backed by saved JSON documents.
#[derive(Debug)]
struct FileContractSource {
    /// Metadata document path.
    metadata: PathBuf,
    /// Configuration document path.
    model_config: PathBuf,
}

impl ContractSource for FileContractSource {
    fn model_metadata(&self, model: &ModelRef) -> Result<ModelMetadata, SourceError> {
        let metadata: ModelMetadata = read_json(&self.metadata)?;
        if metadata.name != model.name {
            return Err(SourceError::NotFound(format!(
                "{} (metadata describes '{}')",
                model.name, metadata.name
            )));
        }
        Ok(metadata)
    }

    fn model_config(&self, _model: &ModelRef) -> Result<ModelConfig, SourceError> {
        let value: Value = read_json(&self.model_config)?;
        ModelConfig::from_json_value(value).map_err(|err| {
            SourceError::Unavailable(format!("{}: {err}", self.model_config.display()))
        })
    }
}

/// Reads a bounded JSON document.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SourceError> {
    let bytes = read_bytes_with_limit(path, MAX_DOCUMENT_BYTES)
        .map_err(|err| SourceError::Unavailable(read_error(path, &err)))?;
    serde_json::from_slice(&bytes)
        .map_err(|err| SourceError::Unavailable(format!("{}: {err}", path.display())))
}

// ============================================================================
// SECTION: File Helpers
// ============================================================================

/// Loads and validates the client config.
fn load_config(path: Option<&Path>) -> CliResult<ClientConfig> {
    ClientConfig::load(path).map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let size = file.metadata().map_err(ReadLimitError::Io)?.len();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1)).read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Formats a bounded read failure.
fn read_error(path: &Path, error: &ReadLimitError) -> String {
    match error {
        ReadLimitError::Io(err) => format!("failed to read {}: {err}", path.display()),
        ReadLimitError::TooLarge {
            size,
            limit,
        } => format!("{} exceeds size limit ({size} > {limit} bytes)", path.display()),
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a pretty JSON document to stdout.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to serialize output: {err}")))?;
    write_stdout_line(&text).map_err(|err| CliError::new(output_error("stdout", &err)))
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

/// Formats an output stream error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
