use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use bytes::{Bytes, BytesMut};
use osi_trace_message::{MessageKind, TraceMessage};

use crate::codec::{decode_frame, missing_bytes};
use crate::config::{LENGTH_PREFIX_SIZE, MAX_MESSAGE_SIZE};
use crate::error::{Result, TraceFileError};
use crate::format::{resolve_message_kind, TraceFormat};
use crate::reader::ReadResult;

const INITIAL_BUFFER_CAPACITY: usize = 64 * 1024;
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Reads length-prefixed binary OSI messages from a `.osi` file.
///
/// Handles partial reads internally; callers always get complete messages.
#[derive(Debug, Default)]
pub struct BinaryTraceReader {
    file: Option<File>,
    path: PathBuf,
    buf: BytesMut,
    kind: Option<MessageKind>,
}

impl BinaryTraceReader {
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
        TraceFormat::Binary.require(path)?;
        if !path.exists() {
            return Err(TraceFileError::NotFound(path.to_path_buf()));
        }
        let kind = resolve_message_kind(path, explicit)?;
        let file = File::open(path)?;

        tracing::debug!(path = %path.display(), kind = %kind, "opened binary trace file");
        self.file = Some(file);
        self.path = path.to_path_buf();
        self.buf = BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY);
        self.kind = Some(kind);
        Ok(())
    }

    /// Read and decode the next message.
    ///
    /// Returns `Ok(None)` when no further message is available.
    pub fn read_message(&mut self) -> Result<Option<ReadResult>> {
        if !self.has_next() {
            tracing::warn!(path = %self.path.display(), "no more messages in binary trace file");
            return Ok(None);
        }
        let kind = self.kind.ok_or(TraceFileError::NotOpen)?;
        let payload = self.read_frame()?;
        let message = TraceMessage::decode(kind, &payload)?;
        Ok(Some(ReadResult::new(message, String::new())))
    }

    /// Read the next raw payload without decoding it.
    pub fn read_frame(&mut self) -> Result<Bytes> {
        loop {
            if let Some(payload) = decode_frame(&mut self.buf, MAX_MESSAGE_SIZE)? {
                return Ok(payload);
            }
            self.buf.reserve(missing_bytes(&self.buf));
            if self.fill()? == 0 {
                return Err(TraceFileError::Truncated(if self.buf.len() < LENGTH_PREFIX_SIZE {
                    "message size prefix"
                } else {
                    "message payload"
                }));
            }
        }
    }

    /// True while a file is open and unread bytes remain.
    pub fn has_next(&mut self) -> bool {
        if self.file.is_none() {
            return false;
        }
        if !self.buf.is_empty() {
            return true;
        }
        match self.fill() {
            Ok(read) => read > 0,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "failed to read binary trace file");
                false
            }
        }
    }

    pub fn close(&mut self) {
        self.file = None;
        self.buf.clear();
        self.kind = None;
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Kind of the messages in the open file.
    pub fn message_kind(&self) -> Option<MessageKind> {
        self.kind
    }

    fn fill(&mut self) -> Result<usize> {
        let Some(file) = self.file.as_mut() else {
            return Err(TraceFileError::NotOpen);
        };
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match file.read(&mut chunk) {
                Ok(read) => {
                    self.buf.extend_from_slice(&chunk[..read]);
                    return Ok(read);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TraceFileError::Io(err)),
            }
        }
    }
}

pub(crate) fn report_open(result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            tracing::error!(error = %err, "failed to open trace file");
            false
        }
    }
}
