use std::path::PathBuf;

use osi_trace_message::{MessageError, MessageKind};

/// Errors that can occur while reading or writing trace files.
#[derive(Debug, thiserror::Error)]
pub enum TraceFileError {
    /// The path has no extension handled by any codec.
    #[error("unsupported trace file format: {0:?}")]
    UnsupportedFormat(String),

    /// The path does not carry the extension this codec requires.
    #[error("{path} must have a .{expected} extension")]
    WrongExtension { path: PathBuf, expected: &'static str },

    /// The input file does not exist.
    #[error("trace file not found: {0}")]
    NotFound(PathBuf),

    /// `open` was called while a file is still open.
    #[error("a trace file is already open: {0}")]
    AlreadyOpen(PathBuf),

    /// The operation requires an open file.
    #[error("no trace file is open")]
    NotOpen,

    /// The message kind was not given and could not be inferred from the file name.
    #[error("cannot determine message type of {0}; specify it explicitly")]
    UnknownMessageKind(PathBuf),

    /// A length prefix or outgoing payload is outside the accepted range.
    #[error("invalid message size {size} (expected 1..={max} bytes)")]
    InvalidMessageSize { size: usize, max: usize },

    /// The file ended in the middle of a record.
    #[error("trace file truncated while reading {0}")]
    Truncated(&'static str),

    /// A payload could not be decoded, printed, or parsed.
    #[error(transparent)]
    Message(#[from] MessageError),

    /// The MCAP container layer reported an error.
    #[error("mcap error: {0}")]
    Mcap(#[from] mcap::McapError),

    /// An MCAP message does not carry a registered OSI protobuf schema.
    #[error("unsupported message on topic {topic}: schema {schema:?}, encoding {encoding:?}")]
    UnsupportedMessage {
        topic: String,
        schema: Option<String>,
        encoding: Option<String>,
    },

    /// A message was written before the required file metadata record.
    #[error("metadata record {0} must be added before writing messages")]
    MissingRequiredMetadata(&'static str),

    /// The required file metadata record was added twice.
    #[error("metadata record {0} was already added")]
    DuplicateRequiredMetadata(&'static str),

    /// The required file metadata record lacks a mandatory field.
    #[error("metadata record {name} is missing required field {field}")]
    MissingMetadataField { name: String, field: &'static str },

    /// Topic names must be non-empty.
    #[error("topic name must not be empty")]
    EmptyTopic,

    /// A message was written to a topic that has no channel.
    #[error("topic {0} has no channel; call add_channel first")]
    UnknownTopic(String),

    /// A topic was registered again with a different message kind.
    #[error("topic {topic} already carries {existing}, cannot register it for {requested}")]
    TopicConflict {
        topic: String,
        existing: MessageKind,
        requested: MessageKind,
    },

    /// A message does not match the kind registered for its topic.
    #[error("topic {topic} carries {expected}, got {actual}")]
    TopicKindMismatch {
        topic: String,
        expected: MessageKind,
        actual: MessageKind,
    },

    /// An I/O error occurred while reading or writing the file.
    #[error("trace file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TraceFileError>;
