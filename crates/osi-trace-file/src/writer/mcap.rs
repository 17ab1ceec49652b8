use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::Utc;
use mcap::records::{MessageHeader, Metadata};
use mcap::WriteOptions;
use osi_trace_message::{
    interface_version_string, schema_descriptor_set, MessageKind, TraceMessage, PROTOBUF_VERSION,
};

use crate::config::McapWriterConfig;
use crate::error::{Result, TraceFileError};
use crate::format::TraceFormat;
use crate::reader::binary::report_open;

/// Name of the file metadata record every OSI MCAP file must carry.
pub const TRACE_METADATA_NAME: &str = "net.asam.osi.trace";

/// Version of the OSI trace file layout written to the `version` field.
pub const TRACE_FILE_SPEC_VERSION: &str = "1.0.0";

/// Fields the `net.asam.osi.trace` record must contain.
pub const REQUIRED_METADATA_FIELDS: [&str; 5] = [
    "version",
    "min_osi_version",
    "max_osi_version",
    "min_protobuf_version",
    "max_protobuf_version",
];

/// Channel metadata key holding the OSI interface version.
pub const CHANNEL_OSI_VERSION_KEY: &str = "net.asam.osi.trace.channel.osi_version";

/// Channel metadata key holding the protobuf version.
pub const CHANNEL_PROTOBUF_VERSION_KEY: &str = "net.asam.osi.trace.channel.protobuf_version";

const PROTOBUF_ENCODING: &str = "protobuf";

struct Channel {
    id: u16,
    kind: MessageKind,
}

/// Writes OSI messages to an `.mcap` file, one channel per topic.
///
/// Before the first message the `net.asam.osi.trace` metadata record must be
/// added (see [`McapTraceWriter::prepare_required_file_metadata`]) and every
/// topic must be registered with [`McapTraceWriter::add_channel`].
#[derive(Default)]
pub struct McapTraceWriter {
    writer: Option<mcap::Writer<BufWriter<File>>>,
    path: PathBuf,
    config: McapWriterConfig,
    schemas: HashMap<MessageKind, u16>,
    channels: HashMap<String, Channel>,
    required_metadata_added: bool,
    sequence: u32,
}

impl McapTraceWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: McapWriterConfig) -> Self {
        let mut writer = Self::default();
        writer.config = config;
        writer
    }

    pub fn open(&mut self, path: impl AsRef<Path>) -> bool {
        report_open(self.try_open(path))
    }

    pub fn open_with_config(&mut self, path: impl AsRef<Path>, config: McapWriterConfig) -> bool {
        report_open(self.try_open_with_config(path, config))
    }

    pub fn try_open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let config = self.config.clone();
        self.try_open_with_config(path, config)
    }

    /// Create or truncate the file at `path` and write the MCAP header.
    pub fn try_open_with_config(
        &mut self,
        path: impl AsRef<Path>,
        config: McapWriterConfig,
    ) -> Result<()> {
        let path = path.as_ref();
        if self.writer.is_some() {
            return Err(TraceFileError::AlreadyOpen(self.path.clone()));
        }
        TraceFormat::Mcap.require(path)?;

        let file = BufWriter::new(File::create(path)?);
        let writer = WriteOptions::new()
            .profile(config.profile.clone())
            .library(config.library.clone())
            .compression(config.compression.to_mcap())
            .chunk_size(Some(config.chunk_size))
            .create(file)?;

        tracing::debug!(
            path = %path.display(),
            chunk_size = config.chunk_size,
            compression = %config.compression,
            "opened mcap trace file for writing"
        );
        self.writer = Some(writer);
        self.path = path.to_path_buf();
        self.config = config;
        self.schemas.clear();
        self.channels.clear();
        self.required_metadata_added = false;
        self.sequence = 0;
        Ok(())
    }

    /// The `net.asam.osi.trace` record with every required field filled in.
    ///
    /// Optional fields such as `description`, `creation_time` or `zero_time`
    /// may be added before passing it to [`McapTraceWriter::add_file_metadata`].
    pub fn prepare_required_file_metadata() -> Metadata {
        let osi_version = interface_version_string();
        let metadata = BTreeMap::from([
            ("version".to_string(), TRACE_FILE_SPEC_VERSION.to_string()),
            ("min_osi_version".to_string(), osi_version.clone()),
            ("max_osi_version".to_string(), osi_version),
            ("min_protobuf_version".to_string(), PROTOBUF_VERSION.to_string()),
            ("max_protobuf_version".to_string(), PROTOBUF_VERSION.to_string()),
        ]);
        Metadata {
            name: TRACE_METADATA_NAME.to_string(),
            metadata,
        }
    }

    /// Write a file metadata record.
    ///
    /// A `net.asam.osi.trace` record is checked for the required fields and
    /// may only be added once. Other records are written unchecked.
    pub fn add_file_metadata(&mut self, metadata: &Metadata) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(TraceFileError::NotOpen);
        };

        let required = metadata.name == TRACE_METADATA_NAME;
        if required {
            if self.required_metadata_added {
                return Err(TraceFileError::DuplicateRequiredMetadata(TRACE_METADATA_NAME));
            }
            if let Some(field) = REQUIRED_METADATA_FIELDS
                .into_iter()
                .find(|field| !metadata.metadata.contains_key(*field))
            {
                return Err(TraceFileError::MissingMetadataField {
                    name: metadata.name.clone(),
                    field,
                });
            }
        }

        writer.write_metadata(metadata)?;
        if required {
            self.required_metadata_added = true;
        }
        Ok(())
    }

    /// Write a file metadata record built from a name and its entries.
    pub fn add_file_metadata_entries(
        &mut self,
        name: impl Into<String>,
        entries: BTreeMap<String, String>,
    ) -> Result<()> {
        self.add_file_metadata(&Metadata {
            name: name.into(),
            metadata: entries,
        })
    }

    /// Register a topic carrying messages of `kind` and return its channel id.
    ///
    /// The schema for `kind` is written once and shared by all its channels.
    /// The OSI and protobuf version keys are added to `channel_metadata`
    /// unless already present. Registering a topic again with the same kind
    /// returns the existing id; a different kind is an error.
    pub fn add_channel(
        &mut self,
        topic: &str,
        kind: MessageKind,
        mut channel_metadata: BTreeMap<String, String>,
    ) -> Result<u16> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(TraceFileError::NotOpen);
        };
        if topic.is_empty() {
            return Err(TraceFileError::EmptyTopic);
        }

        if let Some(channel) = self.channels.get(topic) {
            if channel.kind == kind {
                tracing::warn!(topic, kind = %kind, "topic already registered with this message type; reusing its channel");
                return Ok(channel.id);
            }
            return Err(TraceFileError::TopicConflict {
                topic: topic.to_string(),
                existing: channel.kind,
                requested: kind,
            });
        }

        let schema_id = match self.schemas.get(&kind) {
            Some(id) => *id,
            None => {
                let schema = schema_descriptor_set(kind)?;
                let id = writer.add_schema(kind.type_name(), PROTOBUF_ENCODING, &schema)?;
                self.schemas.insert(kind, id);
                id
            }
        };

        channel_metadata
            .entry(CHANNEL_OSI_VERSION_KEY.to_string())
            .or_insert_with(interface_version_string);
        channel_metadata
            .entry(CHANNEL_PROTOBUF_VERSION_KEY.to_string())
            .or_insert_with(|| PROTOBUF_VERSION.to_string());

        let id = writer.add_channel(schema_id, topic, PROTOBUF_ENCODING, &channel_metadata)?;
        tracing::debug!(topic, kind = %kind, channel_id = id, "added mcap channel");
        self.channels.insert(topic.to_string(), Channel { id, kind });
        Ok(id)
    }

    /// Write one message to a registered topic.
    ///
    /// Log and publish time are the message timestamp in nanoseconds.
    pub fn write_message(&mut self, message: &TraceMessage, topic: &str) -> Result<()> {
        if topic.is_empty() {
            return Err(TraceFileError::EmptyTopic);
        }
        let Some(writer) = self.writer.as_mut() else {
            return Err(TraceFileError::NotOpen);
        };
        if !self.required_metadata_added {
            return Err(TraceFileError::MissingRequiredMetadata(TRACE_METADATA_NAME));
        }
        let Some(channel) = self.channels.get(topic) else {
            return Err(TraceFileError::UnknownTopic(topic.to_string()));
        };
        if channel.kind != message.kind() {
            return Err(TraceFileError::TopicKindMismatch {
                topic: topic.to_string(),
                expected: channel.kind,
                actual: message.kind(),
            });
        }

        let log_time = message.timestamp_nanos();
        let header = MessageHeader {
            channel_id: channel.id,
            sequence: self.sequence,
            log_time,
            publish_time: log_time,
        };
        writer.write_to_known_channel(&header, &message.encode_to_vec())?;
        self.sequence = self.sequence.wrapping_add(1);
        Ok(())
    }

    /// Finish the MCAP file (summary and footer) and close it.
    ///
    /// Failures are logged; use [`McapTraceWriter::try_close`] to observe them.
    pub fn close(&mut self) {
        if let Err(err) = self.try_close() {
            tracing::error!(path = %self.path.display(), error = %err, "failed to finish mcap trace file");
        }
    }

    /// Finish the MCAP file and close it, reporting a failed finish.
    ///
    /// Closing a writer that is not open is a no-op.
    pub fn try_close(&mut self) -> Result<()> {
        let finished = match self.writer.take() {
            Some(mut writer) => writer.finish().map(|_| ()),
            None => Ok(()),
        };
        self.schemas.clear();
        self.channels.clear();
        self.required_metadata_added = false;
        finished.map_err(TraceFileError::from)
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    /// The underlying MCAP writer, for records this type does not cover.
    pub fn mcap_writer_mut(&mut self) -> Option<&mut mcap::Writer<BufWriter<File>>> {
        self.writer.as_mut()
    }

    /// Current UTC time as `YYYY-MM-DDTHH:MM:SS.dZ` (tenths of a second).
    pub fn current_time_as_string() -> String {
        let now = Utc::now();
        format!(
            "{}.{}Z",
            now.format("%Y-%m-%dT%H:%M:%S"),
            now.timestamp_subsec_millis() / 100
        )
    }
}

impl Drop for McapTraceWriter {
    fn drop(&mut self) {
        self.close();
    }
}
