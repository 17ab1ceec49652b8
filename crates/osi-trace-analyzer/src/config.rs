//! Analyzer constants.

pub use osi_trace_file::config::{MAX_CHUNK_SIZE, MAX_MESSAGE_SIZE, MIN_CHUNK_SIZE};

/// Default number of timestamps sampled per file.
pub const ANALYSIS_SAMPLE_SIZE: usize = 1000;

/// Below this many messages the statistics are flagged as unreliable.
pub const MIN_MESSAGES_FOR_RELIABLE_ANALYSIS: usize = 10;

/// Default amount of recorded time one MCAP chunk should cover.
pub const TARGET_CHUNK_DURATION_SECONDS: f64 = 1.0;

pub const MIN_CHUNK_DURATION_SECONDS: f64 = 0.1;

pub const MAX_CHUNK_DURATION_SECONDS: f64 = 10.0;

/// Frame rate substituted when timestamps do not yield one.
pub const DEFAULT_ASSUMED_FRAME_RATE_HZ: f64 = 10.0;

/// Frame rates outside `[MIN, MAX]` are reported as implausible.
pub const MIN_EXPECTED_FRAME_RATE_HZ: f64 = 1.0;

pub const MAX_EXPECTED_FRAME_RATE_HZ: f64 = 1000.0;

/// Average message size below which compression is not recommended.
pub const MIN_MESSAGE_SIZE_FOR_COMPRESSION: usize = 1024;
