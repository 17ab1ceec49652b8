//! Trace file writers and the format-dispatching [`TraceFileWriter`].
//!
//! Opening and closing is uniform across formats. Writing is not: MCAP
//! needs a topic per message, so messages are written through the
//! concrete writer (see [`TraceFileWriter::as_binary_mut`] and friends).

pub mod binary;
pub mod mcap;
pub mod text;

use std::path::Path;

use crate::error::Result;
use crate::format::TraceFormat;

use self::binary::BinaryTraceWriter;
use self::mcap::McapTraceWriter;
use self::text::TextTraceWriter;

/// A writer for any supported trace format.
pub enum TraceFileWriter {
    Binary(BinaryTraceWriter),
    Text(TextTraceWriter),
    Mcap(McapTraceWriter),
}

impl TraceFileWriter {
    /// An unopened writer for the given format.
    pub fn for_format(format: TraceFormat) -> Self {
        match format {
            TraceFormat::Binary => TraceFileWriter::Binary(BinaryTraceWriter::new()),
            TraceFormat::Text => TraceFileWriter::Text(TextTraceWriter::new()),
            TraceFormat::Mcap => TraceFileWriter::Mcap(McapTraceWriter::new()),
        }
    }

    pub fn format(&self) -> TraceFormat {
        match self {
            TraceFileWriter::Binary(_) => TraceFormat::Binary,
            TraceFileWriter::Text(_) => TraceFormat::Text,
            TraceFileWriter::Mcap(_) => TraceFormat::Mcap,
        }
    }

    pub fn open(&mut self, path: impl AsRef<Path>) -> bool {
        match self {
            TraceFileWriter::Binary(writer) => writer.open(path),
            TraceFileWriter::Text(writer) => writer.open(path),
            TraceFileWriter::Mcap(writer) => writer.open(path),
        }
    }

    pub fn try_open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        match self {
            TraceFileWriter::Binary(writer) => writer.try_open(path),
            TraceFileWriter::Text(writer) => writer.try_open(path),
            TraceFileWriter::Mcap(writer) => writer.try_open(path),
        }
    }

    pub fn close(&mut self) {
        match self {
            TraceFileWriter::Binary(writer) => writer.close(),
            TraceFileWriter::Text(writer) => writer.close(),
            TraceFileWriter::Mcap(writer) => writer.close(),
        }
    }

    pub fn is_open(&self) -> bool {
        match self {
            TraceFileWriter::Binary(writer) => writer.is_open(),
            TraceFileWriter::Text(writer) => writer.is_open(),
            TraceFileWriter::Mcap(writer) => writer.is_open(),
        }
    }

    pub fn as_binary_mut(&mut self) -> Option<&mut BinaryTraceWriter> {
        match self {
            TraceFileWriter::Binary(writer) => Some(writer),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextTraceWriter> {
        match self {
            TraceFileWriter::Text(writer) => Some(writer),
            _ => None,
        }
    }

    pub fn as_mcap_mut(&mut self) -> Option<&mut McapTraceWriter> {
        match self {
            TraceFileWriter::Mcap(writer) => Some(writer),
            _ => None,
        }
    }
}

/// An unopened writer matching the extension of `path`.
pub fn create_writer(path: impl AsRef<Path>) -> Result<TraceFileWriter> {
    TraceFormat::detect(path.as_ref()).map(TraceFileWriter::for_format)
}
