use std::fmt;

use serde::Serialize;

/// Size of the little-endian length prefix in `.osi` files.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Largest accepted `.osi` message payload: 512 MiB.
pub const MAX_MESSAGE_SIZE: usize = 512 * 1024 * 1024;

const MIB: u64 = 1024 * 1024;

/// Default MCAP chunk size: 16 MiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 16 * MIB;

/// Smallest chunk size the analyzer recommends: 1 MiB.
pub const MIN_CHUNK_SIZE: u64 = MIB;

/// Largest chunk size the analyzer recommends: 32 MiB.
pub const MAX_CHUNK_SIZE: u64 = 32 * MIB;

/// Initial buffer capacity for one `.txth` record.
pub(crate) const TEXT_RECORD_CAPACITY: usize = 4096;

/// Chunk compression for MCAP output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum McapCompression {
    None,
    Lz4,
    #[default]
    Zstd,
}

impl McapCompression {
    pub fn as_str(self) -> &'static str {
        match self {
            McapCompression::None => "none",
            McapCompression::Lz4 => "lz4",
            McapCompression::Zstd => "zstd",
        }
    }

    pub(crate) fn to_mcap(self) -> Option<mcap::Compression> {
        match self {
            McapCompression::None => None,
            McapCompression::Lz4 => Some(mcap::Compression::Lz4),
            McapCompression::Zstd => Some(mcap::Compression::Zstd),
        }
    }
}

impl fmt::Display for McapCompression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options applied when an MCAP writer opens its file.
#[derive(Debug, Clone)]
pub struct McapWriterConfig {
    /// MCAP profile recorded in the header. Default: `"protobuf"`.
    pub profile: String,
    /// Library identifier recorded in the header.
    pub library: String,
    /// Target uncompressed chunk size in bytes. Default: 16 MiB.
    pub chunk_size: u64,
    /// Chunk compression. Default: zstd.
    pub compression: McapCompression,
}

impl Default for McapWriterConfig {
    fn default() -> Self {
        Self {
            profile: "protobuf".to_string(),
            library: format!("osi-trace-file {}", env!("CARGO_PKG_VERSION")),
            chunk_size: DEFAULT_CHUNK_SIZE,
            compression: McapCompression::default(),
        }
    }
}

/// Options applied when an MCAP reader opens its file.
#[derive(Debug, Clone, Default)]
pub struct McapReaderConfig {
    /// Skip messages without a registered OSI schema instead of failing.
    pub skip_non_osi_messages: bool,
    /// Only yield messages on these topics. `None` yields every topic.
    pub topics: Option<Vec<String>>,
    /// Only yield messages with `log_time >= start_time_ns`.
    pub start_time_ns: Option<u64>,
    /// Only yield messages with `log_time < end_time_ns`.
    pub end_time_ns: Option<u64>,
}

impl McapReaderConfig {
    pub(crate) fn accepts(&self, topic: &str, log_time: u64) -> bool {
        if let Some(topics) = &self.topics {
            if !topics.iter().any(|t| t == topic) {
                return false;
            }
        }
        if self.start_time_ns.is_some_and(|start| log_time < start) {
            return false;
        }
        if self.end_time_ns.is_some_and(|end| log_time >= end) {
            return false;
        }
        true
    }
}
