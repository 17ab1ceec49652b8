//! Trace file readers and the format-dispatching [`TraceFileReader`].

pub mod binary;
pub mod mcap;
pub mod text;

use std::path::Path;

use osi_trace_message::{MessageKind, TraceMessage};

use crate::error::Result;
use crate::format::TraceFormat;

use self::binary::BinaryTraceReader;
use self::mcap::McapTraceReader;
use self::text::TextTraceReader;

/// One decoded message and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadResult {
    pub message: TraceMessage,
    pub message_type: MessageKind,
    /// Topic the message was recorded on; empty for single-channel formats.
    pub channel_name: String,
}

impl ReadResult {
    pub fn new(message: TraceMessage, channel_name: String) -> Self {
        Self {
            message_type: message.kind(),
            message,
            channel_name,
        }
    }
}

/// A reader for any supported trace format.
#[derive(Debug)]
pub enum TraceFileReader {
    Binary(BinaryTraceReader),
    Text(TextTraceReader),
    Mcap(McapTraceReader),
}

impl TraceFileReader {
    /// An unopened reader for the given format.
    pub fn for_format(format: TraceFormat) -> Self {
        match format {
            TraceFormat::Binary => TraceFileReader::Binary(BinaryTraceReader::new()),
            TraceFormat::Text => TraceFileReader::Text(TextTraceReader::new()),
            TraceFormat::Mcap => TraceFileReader::Mcap(McapTraceReader::new()),
        }
    }

    pub fn format(&self) -> TraceFormat {
        match self {
            TraceFileReader::Binary(_) => TraceFormat::Binary,
            TraceFileReader::Text(_) => TraceFormat::Text,
            TraceFileReader::Mcap(_) => TraceFormat::Mcap,
        }
    }

    pub fn open(&mut self, path: impl AsRef<Path>) -> bool {
        match self {
            TraceFileReader::Binary(reader) => reader.open(path),
            TraceFileReader::Text(reader) => reader.open(path),
            TraceFileReader::Mcap(reader) => reader.open(path),
        }
    }

    pub fn try_open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        match self {
            TraceFileReader::Binary(reader) => reader.try_open(path),
            TraceFileReader::Text(reader) => reader.try_open(path),
            TraceFileReader::Mcap(reader) => reader.try_open(path),
        }
    }

    /// Open a single-channel file with an explicit kind.
    ///
    /// MCAP files describe their own schemas, so the kind is ignored there.
    pub fn try_open_with_kind(&mut self, path: impl AsRef<Path>, kind: MessageKind) -> Result<()> {
        match self {
            TraceFileReader::Binary(reader) => reader.try_open_with_kind(path, kind),
            TraceFileReader::Text(reader) => reader.try_open_with_kind(path, kind),
            TraceFileReader::Mcap(reader) => reader.try_open(path),
        }
    }

    pub fn read_message(&mut self) -> Result<Option<ReadResult>> {
        match self {
            TraceFileReader::Binary(reader) => reader.read_message(),
            TraceFileReader::Text(reader) => reader.read_message(),
            TraceFileReader::Mcap(reader) => reader.read_message(),
        }
    }

    pub fn has_next(&mut self) -> bool {
        match self {
            TraceFileReader::Binary(reader) => reader.has_next(),
            TraceFileReader::Text(reader) => reader.has_next(),
            TraceFileReader::Mcap(reader) => reader.has_next(),
        }
    }

    pub fn close(&mut self) {
        match self {
            TraceFileReader::Binary(reader) => reader.close(),
            TraceFileReader::Text(reader) => reader.close(),
            TraceFileReader::Mcap(reader) => reader.close(),
        }
    }
}

/// An unopened reader matching the extension of `path`.
pub fn create_reader(path: impl AsRef<Path>) -> Result<TraceFileReader> {
    TraceFormat::detect(path.as_ref()).map(TraceFileReader::for_format)
}
