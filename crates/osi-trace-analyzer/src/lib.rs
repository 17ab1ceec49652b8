//! Statistics and MCAP tuning recommendations for binary `.osi` trace files.
//!
//! The analyzer scans a file twice: once over the length prefixes only, then
//! again reading a sample of payloads to recover their timestamps with a
//! minimal protobuf wire walker. No schema-aware decoding is involved, so the
//! message kind need not be known.

pub mod analyzer;
pub mod config;
pub mod error;
pub mod recommend;
pub mod statistics;
pub mod wire;

pub use analyzer::{analyze, analyze_with_sample_size, sample_indices};
pub use error::{AnalyzeError, Result};
pub use recommend::{
    recommend_mcap_options, recommend_mcap_options_for, CompressionLevel, RecommendedMcapOptions,
};
pub use statistics::OsiFileStatistics;
pub use wire::extract_timestamp_nanos;
