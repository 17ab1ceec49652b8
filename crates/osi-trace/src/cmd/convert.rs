use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDateTime;
use osi_trace_analyzer::{analyze, recommend_mcap_options};
use osi_trace_file::{McapCompression, McapTraceWriter, McapWriterConfig, TraceFormat};
use serde::Serialize;

use crate::cmd::{open_reader, ConvertArgs};
use crate::exit::{analyze_error, trace_file_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{format_mib, new_table, print_json, OutputFormat};

#[derive(Serialize)]
struct ConvertOutput {
    input: String,
    output: String,
    messages: usize,
    topics: BTreeMap<String, usize>,
    chunk_size: u64,
    compression: McapCompression,
}

pub fn run(args: ConvertArgs, format: OutputFormat) -> CliResult<i32> {
    TraceFormat::Mcap
        .require(&args.output)
        .map_err(|err| trace_file_error("invalid output", err))?;
    if args.topic.is_empty() {
        return Err(CliError::new(USAGE, "--topic must not be empty"));
    }

    let config = writer_config(&args)?;
    let mut reader = open_reader(&args.input, args.input_type, false)?;

    let mut writer = McapTraceWriter::with_config(config.clone());
    writer
        .try_open(&args.output)
        .map_err(|err| trace_file_error("failed to create output", err))?;

    let mut metadata = McapTraceWriter::prepare_required_file_metadata();
    metadata.metadata.insert(
        "description".to_string(),
        format!("Converted from {}", args.input.display()),
    );
    metadata.metadata.insert(
        "creation_time".to_string(),
        McapTraceWriter::current_time_as_string(),
    );
    if let Some(zero_time) = zero_time_from_file_name(&args.input) {
        metadata.metadata.insert("zero_time".to_string(), zero_time);
    }
    writer
        .add_file_metadata(&metadata)
        .map_err(|err| trace_file_error("failed to write metadata", err))?;

    let mut topics: BTreeMap<String, usize> = BTreeMap::new();
    let mut messages = 0usize;
    while reader.has_next() {
        let Some(result) = reader
            .read_message()
            .map_err(|err| trace_file_error("failed to read input", err))?
        else {
            break;
        };
        let topic = if result.channel_name.is_empty() {
            args.topic.clone()
        } else {
            result.channel_name
        };
        if !topics.contains_key(&topic) {
            writer
                .add_channel(&topic, result.message_type, BTreeMap::new())
                .map_err(|err| trace_file_error("failed to add channel", err))?;
            tracing::debug!(topic = %topic, kind = %result.message_type, "added channel");
        }
        writer
            .write_message(&result.message, &topic)
            .map_err(|err| trace_file_error("failed to write message", err))?;
        *topics.entry(topic).or_default() += 1;
        messages += 1;
    }
    reader.close();
    writer
        .try_close()
        .map_err(|err| trace_file_error("failed to finish output", err))?;

    tracing::info!(
        input = %args.input.display(),
        output = %args.output.display(),
        messages,
        "conversion finished"
    );

    let out = ConvertOutput {
        input: args.input.display().to_string(),
        output: args.output.display().to_string(),
        messages,
        topics,
        chunk_size: config.chunk_size,
        compression: config.compression,
    };
    print_summary(&out, format);
    Ok(SUCCESS)
}

fn writer_config(args: &ConvertArgs) -> CliResult<McapWriterConfig> {
    if args.auto_tune {
        if TraceFormat::from_path(&args.input) != Some(TraceFormat::Binary) {
            return Err(CliError::new(USAGE, "--auto-tune requires an .osi input"));
        }
        let stats = analyze(&args.input).map_err(|err| analyze_error("auto-tune failed", err))?;
        let recommendation = recommend_mcap_options(&stats);
        tracing::info!(
            chunk_size = recommendation.chunk_size,
            compression = %recommendation.compression,
            chunk_size_rationale = %recommendation.chunk_size_rationale,
            compression_rationale = %recommendation.compression_rationale,
            "applying recommended mcap options"
        );
        return Ok(recommendation.to_writer_config());
    }

    let mut config = McapWriterConfig::default();
    if let Some(chunk_size) = args.chunk_size {
        if chunk_size == 0 {
            return Err(CliError::new(USAGE, "--chunk-size must be positive"));
        }
        config.chunk_size = chunk_size;
    }
    if let Some(compression) = args.compression {
        config.compression = compression.into();
    }
    Ok(config)
}

/// `zero_time` from a file name starting with `YYYYMMDDTHHMMSSZ`.
fn zero_time_from_file_name(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let stamp = name.get(..16)?;
    let time = NaiveDateTime::parse_from_str(stamp, "%Y%m%dT%H%M%SZ").ok()?;
    Some(time.format("%Y-%m-%dT%H:%M:%SZ").to_string())
}

fn print_summary(out: &ConvertOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            let mut table = new_table(&["TOPIC", "MESSAGES"]);
            for (topic, count) in &out.topics {
                table.add_row(vec![topic.clone(), count.to_string()]);
            }
            println!("{table}");
            println!(
                "{} -> {}: {} messages, chunk size {}, compression {}",
                out.input,
                out.output,
                out.messages,
                format_mib(out.chunk_size),
                out.compression
            );
        }
        OutputFormat::Pretty => {
            println!(
                "converted {} messages from {} to {} (chunk size {}, compression {})",
                out.messages,
                out.input,
                out.output,
                format_mib(out.chunk_size),
                out.compression
            );
            for (topic, count) in &out.topics {
                println!("  {topic}: {count}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_time_comes_from_timestamped_names() {
        assert_eq!(
            zero_time_from_file_name(Path::new(
                "/data/20240612T101500Z_sv_370_3200_618_dronetracker_sensorview.osi"
            ))
            .as_deref(),
            Some("2024-06-12T10:15:00Z")
        );
    }

    #[test]
    fn names_without_timestamp_have_no_zero_time() {
        assert_eq!(zero_time_from_file_name(Path::new("trace_sv_.osi")), None);
        assert_eq!(zero_time_from_file_name(Path::new("short.osi")), None);
        assert_eq!(zero_time_from_file_name(Path::new("20241399T101500Z_sv_.osi")), None);
    }
}
