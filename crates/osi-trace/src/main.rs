mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "osi-trace", version, about = "OSI trace file tools")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use osi_trace_message::MessageKind;

    use super::*;

    #[test]
    fn parses_convert_subcommand() {
        let cli = Cli::try_parse_from([
            "osi-trace",
            "convert",
            "in_sv_.osi",
            "out.mcap",
            "--input-type",
            "SensorView",
            "--compression",
            "lz4",
        ])
        .expect("convert args should parse");

        let Command::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(args.input_type, Some(MessageKind::SensorView));
        assert_eq!(args.topic, "ConvertedTrace");
        assert!(matches!(args.compression, Some(cmd::CompressionArg::Lz4)));
    }

    #[test]
    fn rejects_unknown_input_type() {
        let err = Cli::try_parse_from(["osi-trace", "dump", "x.osi", "--input-type", "Nope"])
            .expect_err("unknown kind should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn auto_tune_conflicts_with_explicit_options() {
        let err = Cli::try_parse_from([
            "osi-trace",
            "convert",
            "in_sv_.osi",
            "out.mcap",
            "--auto-tune",
            "--chunk-size",
            "1048576",
        ])
        .expect_err("conflicting args should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_analyze_with_global_format() {
        let cli = Cli::try_parse_from([
            "osi-trace",
            "analyze",
            "trace_gt_.osi",
            "--sample-size",
            "50",
            "--format",
            "json",
        ])
        .expect("analyze args should parse");
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.sample_size, 50);
        assert_eq!(args.target_chunk_duration, None);
    }
}
