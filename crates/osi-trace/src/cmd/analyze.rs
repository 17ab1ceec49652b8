use osi_trace_analyzer::config::TARGET_CHUNK_DURATION_SECONDS;
use osi_trace_analyzer::{
    analyze_with_sample_size, recommend_mcap_options_for, OsiFileStatistics,
    RecommendedMcapOptions,
};
use serde::Serialize;

use crate::cmd::AnalyzeArgs;
use crate::exit::{analyze_error, CliResult, SUCCESS};
use crate::output::{format_mib, format_timestamp, new_table, print_json, OutputFormat};

#[derive(Serialize)]
struct AnalyzeOutput<'a> {
    valid: bool,
    statistics: &'a OsiFileStatistics,
    recommendation: &'a RecommendedMcapOptions,
}

pub fn run(args: AnalyzeArgs, format: OutputFormat) -> CliResult<i32> {
    let stats = analyze_with_sample_size(&args.path, args.sample_size)
        .map_err(|err| analyze_error("analysis failed", err))?;
    let duration = args
        .target_chunk_duration
        .unwrap_or(TARGET_CHUNK_DURATION_SECONDS);
    let recommendation = recommend_mcap_options_for(&stats, duration);

    if !stats.is_valid() {
        tracing::warn!(
            path = %args.path.display(),
            messages = stats.message_count,
            "too few messages or no usable timing; treat the recommendation as a rough guess"
        );
    }

    match format {
        OutputFormat::Json => print_json(&AnalyzeOutput {
            valid: stats.is_valid(),
            statistics: &stats,
            recommendation: &recommendation,
        }),
        OutputFormat::Table => print_tables(&stats, &recommendation),
        OutputFormat::Pretty => {
            println!("{stats}");
            println!("{recommendation}");
        }
    }
    Ok(SUCCESS)
}

fn print_tables(stats: &OsiFileStatistics, recommendation: &RecommendedMcapOptions) {
    let frame_rate = if stats.frame_rate_assumed {
        format!("{:.2} Hz (assumed)", stats.frame_rate_hz)
    } else {
        format!("{:.2} Hz", stats.frame_rate_hz)
    };
    let message_count = if stats.is_sampled {
        format!(
            "{} (timestamps sampled from {})",
            stats.message_count, stats.timestamp_sample_count
        )
    } else {
        stats.message_count.to_string()
    };

    let mut table = new_table(&["STATISTIC", "VALUE"]);
    table
        .add_row(vec!["File".to_string(), stats.file_path.display().to_string()])
        .add_row(vec!["File size".to_string(), format_mib(stats.file_size_bytes)])
        .add_row(vec!["Messages".to_string(), message_count])
        .add_row(vec![
            "Message size".to_string(),
            format!(
                "min {} / avg {:.0} / max {} B",
                stats.min_message_size, stats.avg_message_size, stats.max_message_size
            ),
        ])
        .add_row(vec![
            "Time span".to_string(),
            format!(
                "{} .. {}",
                format_timestamp(stats.first_timestamp_ns),
                format_timestamp(stats.last_timestamp_ns)
            ),
        ])
        .add_row(vec![
            "Duration".to_string(),
            format!("{:.3} s", stats.duration_seconds),
        ])
        .add_row(vec!["Frame rate".to_string(), frame_rate])
        .add_row(vec![
            "Data rate".to_string(),
            format!("{:.2} MiB/s", stats.bytes_per_second / (1024.0 * 1024.0)),
        ])
        .add_row(vec!["Valid".to_string(), stats.is_valid().to_string()]);
    println!("{table}");

    let mut table = new_table(&["OPTION", "VALUE", "RATIONALE"]);
    table
        .add_row(vec![
            "Chunk size".to_string(),
            format_mib(recommendation.chunk_size),
            recommendation.chunk_size_rationale.clone(),
        ])
        .add_row(vec![
            "Compression".to_string(),
            format!(
                "{} ({})",
                recommendation.compression,
                recommendation.compression_level.as_str()
            ),
            recommendation.compression_rationale.clone(),
        ]);
    println!("{table}");
}
