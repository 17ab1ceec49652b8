use std::collections::HashMap;
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use mcap::records::{op, Metadata, MetadataIndex, Record};
use mcap::sans_io::read::{LinearReader, LinearReaderOptions, ReadAction};
use mcap::{McapError, MAGIC};
use osi_trace_message::{MessageKind, TraceMessage};

use crate::config::McapReaderConfig;
use crate::error::{Result, TraceFileError};
use crate::format::TraceFormat;
use crate::reader::binary::report_open;
use crate::reader::ReadResult;

/// Schema encoding of OSI channels.
const PROTOBUF_ENCODING: &str = "protobuf";

/// Opcode, length and the three footer fields.
const FOOTER_RECORD_LEN: usize = 1 + 8 + 8 + 8 + 4;

/// One message record read from the container, not yet decoded.
#[derive(Debug)]
struct StoredMessage {
    topic: String,
    schema_name: Option<String>,
    schema_encoding: Option<String>,
    log_time: u64,
    data: Vec<u8>,
}

impl StoredMessage {
    /// The registered kind of this message, if its schema is an OSI protobuf schema.
    fn osi_kind(&self) -> Option<MessageKind> {
        if self.schema_encoding.as_deref() != Some(PROTOBUF_ENCODING) {
            return None;
        }
        self.schema_name
            .as_deref()
            .and_then(MessageKind::from_type_name)
    }
}

#[derive(Debug)]
struct SchemaInfo {
    name: String,
    encoding: String,
}

#[derive(Debug)]
struct ChannelInfo {
    topic: String,
    schema_id: u16,
}

/// Pulls message records from the file one at a time.
///
/// Only the records of the chunk being read are held in memory.
struct RecordStream {
    file: File,
    reader: LinearReader,
    schemas: HashMap<u16, SchemaInfo>,
    channels: HashMap<u16, ChannelInfo>,
    finished: bool,
}

impl std::fmt::Debug for RecordStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStream")
            .field("schemas", &self.schemas)
            .field("channels", &self.channels)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl RecordStream {
    /// Stream over a file positioned just past its leading magic.
    fn new(file: File) -> Self {
        Self {
            file,
            reader: LinearReader::new_with_options(
                LinearReaderOptions::default().with_skip_start_magic(true),
            ),
            schemas: HashMap::new(),
            channels: HashMap::new(),
            finished: false,
        }
    }

    /// The next message record, or `None` at the end of the data section.
    ///
    /// The stream stops after the first error.
    fn next_message(&mut self) -> Option<std::result::Result<StoredMessage, McapError>> {
        if self.finished {
            return None;
        }
        let next = self.pull();
        if !matches!(next, Some(Ok(_))) {
            self.finished = true;
        }
        next
    }

    fn pull(&mut self) -> Option<std::result::Result<StoredMessage, McapError>> {
        let Self {
            file,
            reader,
            schemas,
            channels,
            ..
        } = self;
        while let Some(action) = reader.next_action() {
            let action = match action {
                Ok(action) => action,
                Err(err) => return Some(Err(err)),
            };
            match action {
                ReadAction::NeedMore(need) => {
                    let written = match read_retrying(file, reader.insert(need)) {
                        Ok(written) => written,
                        Err(err) => return Some(Err(McapError::Io(err))),
                    };
                    reader.set_written(written);
                }
                ReadAction::GetRecord { opcode, data } => {
                    if !matches!(opcode, op::SCHEMA | op::CHANNEL | op::MESSAGE) {
                        continue;
                    }
                    match mcap::parse_record(opcode, data) {
                        Ok(Record::Schema { header, .. }) => {
                            schemas.insert(
                                header.id,
                                SchemaInfo {
                                    name: header.name,
                                    encoding: header.encoding,
                                },
                            );
                        }
                        Ok(Record::Channel(channel)) => {
                            channels.insert(
                                channel.id,
                                ChannelInfo {
                                    topic: channel.topic,
                                    schema_id: channel.schema_id,
                                },
                            );
                        }
                        Ok(Record::Message { header, data }) => {
                            let Some(channel) = channels.get(&header.channel_id) else {
                                return Some(Err(McapError::UnknownChannel(
                                    header.sequence,
                                    header.channel_id,
                                )));
                            };
                            let schema = schemas.get(&channel.schema_id);
                            return Some(Ok(StoredMessage {
                                topic: channel.topic.clone(),
                                schema_name: schema.map(|s| s.name.clone()),
                                schema_encoding: schema.map(|s| s.encoding.clone()),
                                log_time: header.log_time,
                                data: data.into_owned(),
                            }));
                        }
                        Ok(_) => {}
                        Err(err) => return Some(Err(err)),
                    }
                }
            }
        }
        None
    }
}

fn read_retrying(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    loop {
        match file.read(buf) {
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}

/// Reads OSI messages from every channel of an `.mcap` file.
///
/// Messages are yielded in container order and decoded one at a time.
/// Each result carries the topic it was recorded on as its channel name.
#[derive(Debug, Default)]
pub struct McapTraceReader {
    stream: Option<RecordStream>,
    /// The next deliverable record, pulled ahead so `has_next` is exact.
    pending: Option<std::result::Result<StoredMessage, McapError>>,
    path: PathBuf,
    metadata: Vec<Metadata>,
    config: McapReaderConfig,
}

impl McapTraceReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: McapReaderConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn open(&mut self, path: impl AsRef<Path>) -> bool {
        report_open(self.try_open(path))
    }

    pub fn try_open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let config = self.config.clone();
        self.try_open_with_config(path, config)
    }

    /// Open a file, replacing the reader's configuration.
    pub fn open_with_config(&mut self, path: impl AsRef<Path>, config: McapReaderConfig) -> bool {
        report_open(self.try_open_with_config(path, config))
    }

    /// Open a file, replacing the reader's configuration.
    ///
    /// Fails unless the file starts with the MCAP magic and its first
    /// record can be read.
    pub fn try_open_with_config(
        &mut self,
        path: impl AsRef<Path>,
        config: McapReaderConfig,
    ) -> Result<()> {
        let path = path.as_ref();
        if self.stream.is_some() {
            return Err(TraceFileError::AlreadyOpen(self.path.clone()));
        }
        TraceFormat::Mcap.require(path)?;
        if !path.exists() {
            return Err(TraceFileError::NotFound(path.to_path_buf()));
        }

        let mut file = File::open(path)?;
        let mut magic = [0u8; MAGIC.len()];
        match file.read_exact(&mut magic) {
            Ok(()) if magic.as_slice() == MAGIC => {}
            Ok(()) => return Err(McapError::BadMagic.into()),
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
                return Err(McapError::BadMagic.into())
            }
            Err(err) => return Err(err.into()),
        }
        let metadata = match read_summary_metadata(&mut file) {
            Ok(metadata) => metadata,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to read mcap summary");
                Vec::new()
            }
        };
        file.seek(SeekFrom::Start(MAGIC.len() as u64))?;

        let mut stream = RecordStream::new(file);
        let pending = match next_accepted(&mut stream, &config) {
            Some(Err(err)) => return Err(err.into()),
            pending => pending,
        };

        tracing::debug!(
            path = %path.display(),
            metadata_records = metadata.len(),
            "opened mcap trace file"
        );
        self.stream = Some(stream);
        self.pending = pending;
        self.metadata = metadata;
        self.path = path.to_path_buf();
        self.config = config;
        Ok(())
    }

    /// Read and decode the next OSI message.
    ///
    /// Messages without a registered OSI schema are skipped when
    /// `skip_non_osi_messages` is set and reported as errors otherwise.
    pub fn read_message(&mut self) -> Result<Option<ReadResult>> {
        let Some(stream) = self.stream.as_mut() else {
            tracing::warn!("no mcap trace file is open");
            return Ok(None);
        };

        while let Some(next) = self.pending.take() {
            self.pending = next_accepted(stream, &self.config);
            let stored = next?;
            let Some(kind) = stored.osi_kind() else {
                if self.config.skip_non_osi_messages {
                    tracing::debug!(
                        topic = %stored.topic,
                        schema = ?stored.schema_name,
                        "skipping non-OSI message"
                    );
                    continue;
                }
                return Err(TraceFileError::UnsupportedMessage {
                    topic: stored.topic,
                    schema: stored.schema_name,
                    encoding: stored.schema_encoding,
                });
            };
            let message = TraceMessage::decode(kind, &stored.data)?;
            tracing::trace!(topic = %stored.topic, log_time = stored.log_time, "read mcap message");
            return Ok(Some(ReadResult::new(message, stored.topic)));
        }

        tracing::warn!(path = %self.path.display(), "no more messages in mcap trace file");
        Ok(None)
    }

    /// True while an undelivered message or read error remains.
    pub fn has_next(&self) -> bool {
        self.pending.is_some()
    }

    /// Close the file. Closing a reader that is not open is a no-op.
    pub fn close(&mut self) {
        self.stream = None;
        self.pending = None;
        self.metadata.clear();
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Applies to messages not yet pulled from the file.
    pub fn set_skip_non_osi_messages(&mut self, skip: bool) {
        self.config.skip_non_osi_messages = skip;
    }

    pub fn config(&self) -> &McapReaderConfig {
        &self.config
    }

    /// Metadata records found in the file summary.
    pub fn file_metadata(&self) -> &[Metadata] {
        &self.metadata
    }

    /// The metadata record with the given name, if present.
    pub fn file_metadata_named(&self, name: &str) -> Option<&Metadata> {
        self.metadata.iter().find(|m| m.name == name)
    }
}

/// The next record passing the topic and time filters.
///
/// Non-OSI records are dropped here when they are to be skipped, so a
/// trailing run of them does not leave `has_next` true.
fn next_accepted(
    stream: &mut RecordStream,
    config: &McapReaderConfig,
) -> Option<std::result::Result<StoredMessage, McapError>> {
    loop {
        match stream.next_message()? {
            Ok(stored) if !config.accepts(&stored.topic, stored.log_time) => continue,
            Ok(stored) if config.skip_non_osi_messages && stored.osi_kind().is_none() => {
                tracing::debug!(
                    topic = %stored.topic,
                    schema = ?stored.schema_name,
                    "skipping non-OSI message"
                );
                continue;
            }
            next => return Some(next),
        }
    }
}

/// Metadata records listed in the summary section.
///
/// Only the footer, the summary and the indexed metadata records are read.
/// Files without a summary have no listed metadata.
fn read_summary_metadata(file: &mut File) -> std::result::Result<Vec<Metadata>, McapError> {
    let len = file.metadata()?.len();
    let tail_len = FOOTER_RECORD_LEN + MAGIC.len();
    if len < (MAGIC.len() + tail_len) as u64 {
        return Ok(Vec::new());
    }
    let footer_start = len - tail_len as u64;
    let mut tail = vec![0u8; tail_len];
    file.seek(SeekFrom::Start(footer_start))?;
    file.read_exact(&mut tail)?;
    if !tail.ends_with(MAGIC) {
        // Unfinished file: no footer to follow.
        return Ok(Vec::new());
    }
    let footer = match mcap::read::LinearReader::sans_magic(&tail[..FOOTER_RECORD_LEN]).next() {
        Some(Ok(Record::Footer(footer))) => footer,
        Some(Err(err)) => return Err(err),
        _ => return Err(McapError::BadFooter),
    };
    if footer.summary_start == 0 || footer.summary_start >= footer_start {
        return Ok(Vec::new());
    }

    let summary_len = usize::try_from(footer_start - footer.summary_start)
        .map_err(|_| McapError::TooLong(footer_start - footer.summary_start))?;
    let mut summary = vec![0u8; summary_len];
    file.seek(SeekFrom::Start(footer.summary_start))?;
    file.read_exact(&mut summary)?;

    let mut indexes: Vec<MetadataIndex> = Vec::new();
    for record in mcap::read::LinearReader::sans_magic(&summary) {
        if let Record::MetadataIndex(index) = record? {
            indexes.push(index);
        }
    }

    let mut metadata = Vec::with_capacity(indexes.len());
    for index in indexes {
        let record_len =
            usize::try_from(index.length).map_err(|_| McapError::TooLong(index.length))?;
        let mut record = vec![0u8; record_len];
        file.seek(SeekFrom::Start(index.offset))?;
        file.read_exact(&mut record)?;
        let local = MetadataIndex {
            offset: 0,
            ..index
        };
        match mcap::read::metadata(&record, &local) {
            Ok(found) => metadata.push(found),
            Err(err) => {
                tracing::warn!(name = %local.name, error = %err, "failed to read mcap metadata record");
            }
        }
    }
    Ok(metadata)
}
