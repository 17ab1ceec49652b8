//! Readers and writers for OSI trace files.
//!
//! Three on-disk formats are supported, selected by file extension:
//! - `.osi`: a bare sequence of length-prefixed protobuf messages
//! - `.txth`: concatenated protobuf text format, one message per record
//! - `.mcap`: an MCAP container with one channel per topic
//!
//! [`create_reader`] and [`create_writer`] pick the right codec for a path.
//! [`TraceFileReader`] and [`TraceFileWriter`] dispatch to the concrete codec.

pub mod codec;
pub mod config;
pub mod error;
pub mod format;
pub mod reader;
pub mod writer;

pub use codec::{decode_frame, encode_frame, encode_message_frame};
pub use config::{
    McapCompression, McapReaderConfig, McapWriterConfig, DEFAULT_CHUNK_SIZE, LENGTH_PREFIX_SIZE,
    MAX_CHUNK_SIZE, MAX_MESSAGE_SIZE, MIN_CHUNK_SIZE,
};
pub use error::{Result, TraceFileError};
pub use format::{resolve_message_kind, TraceFormat};
pub use mcap::records::Metadata as FileMetadata;
pub use reader::binary::BinaryTraceReader;
pub use reader::mcap::McapTraceReader;
pub use reader::text::TextTraceReader;
pub use reader::{create_reader, ReadResult, TraceFileReader};
pub use writer::binary::BinaryTraceWriter;
pub use writer::mcap::{
    McapTraceWriter, CHANNEL_OSI_VERSION_KEY, CHANNEL_PROTOBUF_VERSION_KEY,
    REQUIRED_METADATA_FIELDS, TRACE_FILE_SPEC_VERSION, TRACE_METADATA_NAME,
};
pub use writer::text::TextTraceWriter;
pub use writer::{create_writer, TraceFileWriter};
