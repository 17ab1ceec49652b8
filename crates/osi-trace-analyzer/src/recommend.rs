use std::fmt;

use osi_trace_file::{McapCompression, McapWriterConfig};
use serde::Serialize;

use crate::config::{
    MAX_CHUNK_DURATION_SECONDS, MAX_CHUNK_SIZE, MIN_CHUNK_DURATION_SECONDS, MIN_CHUNK_SIZE,
    MIN_MESSAGE_SIZE_FOR_COMPRESSION, TARGET_CHUNK_DURATION_SECONDS,
};
use crate::statistics::OsiFileStatistics;

const MIB: f64 = 1024.0 * 1024.0;

/// Compression effort accompanying a recommendation.
///
/// `mcap` exposes no level setting, so the writer always runs its codec's
/// default and that is the only level recommended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    #[default]
    Default,
}

impl CompressionLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            CompressionLevel::Default => "default",
        }
    }
}

/// MCAP writer settings derived from file statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedMcapOptions {
    pub chunk_size: u64,
    pub compression: McapCompression,
    pub compression_level: CompressionLevel,
    pub chunk_size_rationale: String,
    pub compression_rationale: String,
}

impl RecommendedMcapOptions {
    /// Writer configuration applying this recommendation.
    pub fn to_writer_config(&self) -> McapWriterConfig {
        McapWriterConfig {
            chunk_size: self.chunk_size,
            compression: self.compression,
            ..McapWriterConfig::default()
        }
    }
}

impl fmt::Display for RecommendedMcapOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Recommended MCAP Options:")?;
        writeln!(
            f,
            "  Chunk size:   {} bytes ({:.1} MiB)",
            self.chunk_size,
            self.chunk_size as f64 / MIB
        )?;
        writeln!(f, "  Rationale:    {}", self.chunk_size_rationale)?;
        write!(f, "  Compression:  {}", self.compression)?;
        if self.compression != McapCompression::None {
            write!(f, " (level: {})", self.compression_level.as_str())?;
        }
        writeln!(f)?;
        write!(f, "  Rationale:    {}", self.compression_rationale)
    }
}

/// Recommend MCAP options for the default target chunk duration.
pub fn recommend_mcap_options(stats: &OsiFileStatistics) -> RecommendedMcapOptions {
    recommend_mcap_options_for(stats, TARGET_CHUNK_DURATION_SECONDS)
}

/// Recommend MCAP options so one chunk covers about `target_chunk_duration_seconds`.
///
/// The duration is clamped to `[MIN_CHUNK_DURATION_SECONDS, MAX_CHUNK_DURATION_SECONDS]`
/// and the resulting chunk size to `[MIN_CHUNK_SIZE, MAX_CHUNK_SIZE]`.
pub fn recommend_mcap_options_for(
    stats: &OsiFileStatistics,
    target_chunk_duration_seconds: f64,
) -> RecommendedMcapOptions {
    let duration = if target_chunk_duration_seconds.is_nan() {
        TARGET_CHUNK_DURATION_SECONDS
    } else {
        target_chunk_duration_seconds.clamp(MIN_CHUNK_DURATION_SECONDS, MAX_CHUNK_DURATION_SECONDS)
    };

    let raw = stats.avg_message_size * stats.frame_rate_hz * duration;
    // `as` saturates and maps NaN to 0, which the clamp then lifts to the minimum.
    let raw_chunk_size = raw as u64;
    let chunk_size = raw_chunk_size.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE);

    let mut chunk_size_rationale = format!(
        "Target {:.1}s per chunk × {:.1} Hz × {} B/msg = {:.1} MiB",
        duration,
        stats.frame_rate_hz,
        stats.avg_message_size as u64,
        raw_chunk_size as f64 / MIB
    );
    if raw_chunk_size < MIN_CHUNK_SIZE {
        chunk_size_rationale.push_str(&format!(
            " (clamped to min {:.0} MiB)",
            MIN_CHUNK_SIZE as f64 / MIB
        ));
    } else if raw_chunk_size > MAX_CHUNK_SIZE {
        chunk_size_rationale.push_str(&format!(
            " (clamped to max {:.0} MiB)",
            MAX_CHUNK_SIZE as f64 / MIB
        ));
    }

    let (compression, compression_rationale) =
        if stats.avg_message_size < MIN_MESSAGE_SIZE_FOR_COMPRESSION as f64 {
            (
                McapCompression::None,
                format!(
                    "Messages are small (<{MIN_MESSAGE_SIZE_FOR_COMPRESSION} B avg), compression overhead may outweigh benefits"
                ),
            )
        } else {
            (
                McapCompression::Zstd,
                "Zstd provides excellent compression for protobuf data with fast decompression"
                    .to_string(),
            )
        };

    RecommendedMcapOptions {
        chunk_size,
        compression,
        compression_level: CompressionLevel::Default,
        chunk_size_rationale,
        compression_rationale,
    }
}
