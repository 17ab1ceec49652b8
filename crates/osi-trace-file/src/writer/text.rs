use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use osi_trace_message::TraceMessage;

use crate::error::{Result, TraceFileError};
use crate::format::TraceFormat;
use crate::reader::binary::report_open;

/// Writes OSI messages as protobuf text format to a `.txth` file.
///
/// Records are concatenated without a separator.
#[derive(Debug, Default)]
pub struct TextTraceWriter {
    file: Option<BufWriter<File>>,
    path: PathBuf,
}

impl TextTraceWriter {
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
        TraceFormat::Text.require(path)?;
        let file = File::create(path)?;
        tracing::debug!(path = %path.display(), "opened text trace file for writing");
        self.file = Some(BufWriter::new(file));
        self.path = path.to_path_buf();
        Ok(())
    }

    pub fn write_message(&mut self, message: &TraceMessage) -> Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Err(TraceFileError::NotOpen);
        };
        let text = message.to_text()?;
        file.write_all(text.as_bytes())?;
        Ok(())
    }

    pub fn close(&mut self) {
        if let Some(mut file) = self.file.take() {
            if let Err(err) = file.flush() {
                tracing::error!(path = %self.path.display(), error = %err, "failed to flush text trace file");
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }
}
