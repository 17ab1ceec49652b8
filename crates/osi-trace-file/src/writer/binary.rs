use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use bytes::BytesMut;
use osi_trace_message::TraceMessage;

use crate::codec::encode_message_frame;
use crate::error::{Result, TraceFileError};
use crate::format::TraceFormat;
use crate::reader::binary::report_open;

const INITIAL_BUFFER_CAPACITY: usize = 64 * 1024;

/// Writes length-prefixed binary OSI messages to a `.osi` file.
#[derive(Debug, Default)]
pub struct BinaryTraceWriter {
    file: Option<BufWriter<File>>,
    path: PathBuf,
    buf: BytesMut,
    written: u64,
}

impl BinaryTraceWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, path: impl AsRef<Path>) -> bool {
        report_open(self.try_open(path))
    }

    /// Create or truncate the file at `path`.
    pub fn try_open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if self.file.is_some() {
            return Err(TraceFileError::AlreadyOpen(self.path.clone()));
        }
        TraceFormat::Binary.require(path)?;
        let file = File::create(path)?;
        tracing::debug!(path = %path.display(), "opened binary trace file for writing");
        self.file = Some(BufWriter::new(file));
        self.path = path.to_path_buf();
        self.buf = BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY);
        self.written = 0;
        Ok(())
    }

    /// Append one message as a length-prefixed record.
    ///
    /// Messages that encode to zero bytes cannot be represented and are rejected.
    pub fn write_message(&mut self, message: &TraceMessage) -> Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Err(TraceFileError::NotOpen);
        };

        self.buf.clear();
        encode_message_frame(message, &mut self.buf)?;
        file.write_all(&self.buf)?;
        self.written += 1;
        Ok(())
    }

    /// Flush buffered records to disk.
    pub fn flush(&mut self) -> Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush().map_err(TraceFileError::Io),
            None => Err(TraceFileError::NotOpen),
        }
    }

    /// Flush and close the file. Closing an unopened writer does nothing.
    pub fn close(&mut self) {
        if let Some(mut file) = self.file.take() {
            if let Err(err) = file.flush() {
                tracing::error!(path = %self.path.display(), error = %err, "failed to flush binary trace file");
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Number of messages written since the file was opened.
    pub fn written_messages(&self) -> u64 {
        self.written
    }
}
