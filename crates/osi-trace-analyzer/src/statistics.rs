use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::MIN_MESSAGES_FOR_RELIABLE_ANALYSIS;

/// Size and timing statistics of one binary trace file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OsiFileStatistics {
    pub file_path: PathBuf,
    pub file_size_bytes: u64,
    pub message_count: usize,
    /// True if only a subset of messages was read for timestamps.
    pub is_sampled: bool,
    pub total_message_count_estimate: usize,
    /// Number of messages whose payload was read for a timestamp.
    pub timestamp_sample_count: usize,
    /// Number of sampled messages that yielded a timestamp.
    pub timestamps_extracted: usize,

    pub min_message_size: usize,
    pub max_message_size: usize,
    pub avg_message_size: f64,
    pub total_message_bytes: u64,

    pub first_timestamp_ns: u64,
    pub last_timestamp_ns: u64,
    pub duration_seconds: f64,
    pub avg_frame_interval_seconds: f64,

    pub frame_rate_hz: f64,
    /// True if `frame_rate_hz` is the default assumption rather than measured.
    pub frame_rate_assumed: bool,
    pub bytes_per_second: f64,
}

impl OsiFileStatistics {
    /// Whether the statistics are a sound basis for recommendations.
    pub fn is_valid(&self) -> bool {
        self.message_count >= MIN_MESSAGES_FOR_RELIABLE_ANALYSIS
            && self.avg_message_size > 0.0
            && self.frame_rate_hz > 0.0
    }
}

const MIB: f64 = 1024.0 * 1024.0;

impl fmt::Display for OsiFileStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "File Analysis: {}", self.file_path.display())?;
        writeln!(
            f,
            "  File size:         {} bytes ({:.2} MiB)",
            self.file_size_bytes,
            self.file_size_bytes as f64 / MIB
        )?;
        write!(f, "  Messages:          {}", self.message_count)?;
        if self.is_sampled {
            write!(
                f,
                " (timestamps sampled from {} messages)",
                self.timestamp_sample_count
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "  Message size:      min {} B, max {} B, avg {:.0} B",
            self.min_message_size, self.max_message_size, self.avg_message_size
        )?;
        writeln!(f, "  Duration:          {:.3} s", self.duration_seconds)?;
        write!(f, "  Frame rate:        {:.2} Hz", self.frame_rate_hz)?;
        if self.frame_rate_assumed {
            write!(f, " (assumed)")?;
        }
        writeln!(f)?;
        write!(
            f,
            "  Data rate:         {:.2} MiB/s",
            self.bytes_per_second / MIB
        )?;
        if !self.is_valid() {
            writeln!(f)?;
            write!(
                f,
                "  Analysis may be unreliable (fewer than {MIN_MESSAGES_FOR_RELIABLE_ANALYSIS} messages or no usable timestamps)"
            )?;
        }
        Ok(())
    }
}
