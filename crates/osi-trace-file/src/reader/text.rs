use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use osi_trace_message::{MessageKind, TraceMessage};

use crate::config::TEXT_RECORD_CAPACITY;
use crate::error::{Result, TraceFileError};
use crate::format::{resolve_message_kind, TraceFormat};
use crate::reader::binary::report_open;
use crate::reader::ReadResult;

/// Reads protobuf text format OSI messages from a `.txth` file.
///
/// A `.txth` file has no record delimiter. The first line of the file is
/// taken as the start of every record: a record runs until the next line
/// identical to it. This holds as long as every message sets the same
/// first field, which is the case for files written by [`crate::TextTraceWriter`]
/// from messages that all carry their interface version.
#[derive(Debug, Default)]
pub struct TextTraceReader {
    file: Option<BufReader<File>>,
    path: PathBuf,
    kind: Option<MessageKind>,
    start_line: String,
    pending_line: Option<String>,
}

impl TextTraceReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a file, inferring the message kind from its name.
    pub fn open(&mut self, path: impl AsRef<Path>) -> bool {
        report_open(self.try_open(path))
    }

    /// Open a file carrying the given message kind.
    pub fn open_with_kind(&mut self, path: impl AsRef<Path>, kind: MessageKind) -> bool {
        report_open(self.try_open_with_kind(path, kind))
    }

    pub fn try_open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.open_inner(path.as_ref(), None)
    }

    pub fn try_open_with_kind(&mut self, path: impl AsRef<Path>, kind: MessageKind) -> Result<()> {
        self.open_inner(path.as_ref(), Some(kind))
    }

    fn open_inner(&mut self, path: &Path, explicit: Option<MessageKind>) -> Result<()> {
        if self.file.is_some() {
            return Err(TraceFileError::AlreadyOpen(self.path.clone()));
        }
        TraceFormat::Text.require(path)?;
        if !path.exists() {
            return Err(TraceFileError::NotFound(path.to_path_buf()));
        }
        let kind = resolve_message_kind(path, explicit)?;
        let mut file = BufReader::new(File::open(path)?);

        let first_line = read_line(&mut file)?;
        tracing::debug!(path = %path.display(), kind = %kind, "opened text trace file");
        self.start_line = first_line.clone().unwrap_or_default();
        self.pending_line = first_line;
        self.file = Some(file);
        self.path = path.to_path_buf();
        self.kind = Some(kind);
        Ok(())
    }

    /// Read and parse the next record.
    ///
    /// Returns `Ok(None)` when no further record is available or the
    /// remaining record is blank.
    pub fn read_message(&mut self) -> Result<Option<ReadResult>> {
        if !self.has_next() {
            tracing::warn!(path = %self.path.display(), "no more messages in text trace file");
            return Ok(None);
        }
        let kind = self.kind.ok_or(TraceFileError::NotOpen)?;
        let text = self.read_record()?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        let message = TraceMessage::parse_text(kind, &text)?;
        Ok(Some(ReadResult::new(message, String::new())))
    }

    /// Collect the lines of the next record, each terminated by `\n`.
    ///
    /// Leading blank lines never end a record.
    fn read_record(&mut self) -> Result<String> {
        let mut record = String::with_capacity(TEXT_RECORD_CAPACITY);
        let first = match self.pending_line.take() {
            Some(line) => Some(line),
            None => self.next_line()?,
        };
        if let Some(line) = first {
            record.push_str(&line);
            record.push('\n');
        }
        while let Some(line) = self.next_line()? {
            if line == self.start_line && !record.trim().is_empty() {
                self.pending_line = Some(line);
                break;
            }
            record.push_str(&line);
            record.push('\n');
        }
        Ok(record)
    }

    /// True while a file is open and unread content remains.
    pub fn has_next(&mut self) -> bool {
        if self.pending_line.is_some() {
            return true;
        }
        let Some(file) = self.file.as_mut() else {
            return false;
        };
        match file.fill_buf() {
            Ok(buf) => !buf.is_empty(),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "failed to read text trace file");
                false
            }
        }
    }

    pub fn close(&mut self) {
        self.file = None;
        self.kind = None;
        self.start_line.clear();
        self.pending_line = None;
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Kind of the messages in the open file.
    pub fn message_kind(&self) -> Option<MessageKind> {
        self.kind
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        match self.file.as_mut() {
            Some(file) => read_line(file),
            None => Err(TraceFileError::NotOpen),
        }
    }
}

/// Next line without its terminator, or `None` at end of file.
fn read_line(file: &mut BufReader<File>) -> Result<Option<String>> {
    let mut line = String::new();
    if file.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Some(line))
}
