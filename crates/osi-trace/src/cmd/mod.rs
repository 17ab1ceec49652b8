use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use osi_trace_file::McapCompression;
use osi_trace_message::MessageKind;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod analyze;
pub mod convert;
pub mod dump;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print statistics and recommended MCAP settings for an .osi file.
    Analyze(AnalyzeArgs),
    /// Convert a trace file into MCAP.
    Convert(ConvertArgs),
    /// List the messages of a trace file.
    Dump(DumpArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Analyze(args) => analyze::run(args, format),
        Command::Convert(args) => convert::run(args, format),
        Command::Dump(args) => dump::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum CompressionArg {
    None,
    Lz4,
    Zstd,
}

impl From<CompressionArg> for McapCompression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::None => McapCompression::None,
            CompressionArg::Lz4 => McapCompression::Lz4,
            CompressionArg::Zstd => McapCompression::Zstd,
        }
    }
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Binary .osi trace file.
    pub path: PathBuf,
    /// Number of messages sampled for timestamps (0 reads all).
    #[arg(long, default_value_t = osi_trace_analyzer::config::ANALYSIS_SAMPLE_SIZE)]
    pub sample_size: usize,
    /// Wall-clock span of recorded data each MCAP chunk should hold, in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub target_chunk_duration: Option<f64>,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input trace file (.osi, .txth or .mcap).
    pub input: PathBuf,
    /// Output .mcap file.
    pub output: PathBuf,
    /// Message type of a single-channel input (e.g. SensorView). Inferred from the file name if omitted.
    #[arg(long, value_name = "KIND")]
    pub input_type: Option<MessageKind>,
    /// Topic written for single-channel inputs.
    #[arg(long, default_value = "ConvertedTrace")]
    pub topic: String,
    /// MCAP chunk size in bytes.
    #[arg(long, value_name = "BYTES", conflicts_with = "auto_tune")]
    pub chunk_size: Option<u64>,
    /// MCAP chunk compression.
    #[arg(long, value_enum, conflicts_with = "auto_tune")]
    pub compression: Option<CompressionArg>,
    /// Analyze an .osi input first and apply the recommended chunk size and compression.
    #[arg(long)]
    pub auto_tune: bool,
}

#[derive(Args, Debug)]
pub struct DumpArgs {
    /// Trace file (.osi, .txth or .mcap).
    pub path: PathBuf,
    /// Message type of a single-channel input. Inferred from the file name if omitted.
    #[arg(long, value_name = "KIND")]
    pub input_type: Option<MessageKind>,
    /// Stop after N messages.
    #[arg(long)]
    pub count: Option<usize>,
    /// Skip MCAP messages that are not OSI protobuf messages instead of failing.
    #[arg(long)]
    pub skip_non_osi: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Open any supported trace file for reading.
///
/// `kind` applies to single-channel inputs only; `skip_non_osi` to MCAP only.
pub fn open_reader(
    path: &std::path::Path,
    kind: Option<MessageKind>,
    skip_non_osi: bool,
) -> CliResult<osi_trace_file::TraceFileReader> {
    use osi_trace_file::{McapReaderConfig, McapTraceReader, TraceFileReader, TraceFormat};

    let format = TraceFormat::detect(path)
        .map_err(|err| crate::exit::trace_file_error("cannot read input", err))?;
    let mut reader = match format {
        TraceFormat::Mcap => TraceFileReader::Mcap(McapTraceReader::with_config(McapReaderConfig {
            skip_non_osi_messages: skip_non_osi,
            ..McapReaderConfig::default()
        })),
        other => TraceFileReader::for_format(other),
    };

    let opened = match kind {
        Some(kind) => reader.try_open_with_kind(path, kind),
        None => reader.try_open(path),
    };
    opened.map_err(|err| {
        crate::exit::trace_file_error(&format!("failed to open {}", path.display()), err)
    })?;
    Ok(reader)
}
