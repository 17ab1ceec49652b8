use std::collections::BTreeMap;
use std::path::Path;

use osi_trace_file::{
    McapReaderConfig, McapTraceReader, McapTraceWriter, McapWriterConfig, McapCompression,
    TraceFileError, CHANNEL_OSI_VERSION_KEY, CHANNEL_PROTOBUF_VERSION_KEY, TRACE_METADATA_NAME,
};
use osi_trace_message::{osi3, MessageKind, TraceMessage, INTERFACE_VERSION};

fn ground_truth(seconds: i64, nanos: u32) -> TraceMessage {
    osi3::GroundTruth {
        version: Some(INTERFACE_VERSION),
        timestamp: Some(osi3::Timestamp::new(seconds, nanos)),
        moving_object: vec![osi3::MovingObject {
            id: Some(osi3::Identifier::new(1)),
            r#type: Some(osi3::moving_object::Type::Vehicle as i32),
            ..Default::default()
        }],
        ..Default::default()
    }
    .into()
}

fn sensor_view(seconds: i64) -> TraceMessage {
    osi3::SensorView {
        version: Some(INTERFACE_VERSION),
        timestamp: Some(osi3::Timestamp::new(seconds, 0)),
        sensor_id: Some(osi3::Identifier::new(4)),
        ..Default::default()
    }
    .into()
}

fn open_writer(path: &Path) -> McapTraceWriter {
    let mut writer = McapTraceWriter::new();
    writer.try_open(path).unwrap();
    writer
        .add_file_metadata(&McapTraceWriter::prepare_required_file_metadata())
        .unwrap();
    writer
}

#[test]
fn single_channel_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.mcap");

    let mut writer = open_writer(&path);
    writer
        .add_channel("ground_truth", MessageKind::GroundTruth, BTreeMap::new())
        .unwrap();
    let written: Vec<_> = (0..5).map(|i| ground_truth(i, 100)).collect();
    for message in &written {
        writer.write_message(message, "ground_truth").unwrap();
    }
    writer.close();

    let mut reader = McapTraceReader::new();
    reader.try_open(&path).unwrap();
    let mut read = Vec::new();
    while reader.has_next() {
        let result = reader.read_message().unwrap().unwrap();
        assert_eq!(result.channel_name, "ground_truth");
        assert_eq!(result.message_type, MessageKind::GroundTruth);
        read.push(result.message);
    }
    assert_eq!(read, written);
}

#[test]
fn multi_channel_keeps_topics_apart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("multi.mcap");

    let mut writer = open_writer(&path);
    writer
        .add_channel("gt", MessageKind::GroundTruth, BTreeMap::new())
        .unwrap();
    writer
        .add_channel("sv", MessageKind::SensorView, BTreeMap::new())
        .unwrap();
    for i in 0..3 {
        writer.write_message(&ground_truth(i, 0), "gt").unwrap();
        writer.write_message(&sensor_view(i), "sv").unwrap();
    }
    writer.close();

    let mut reader = McapTraceReader::new();
    reader.try_open(&path).unwrap();
    let mut per_topic: BTreeMap<String, Vec<MessageKind>> = BTreeMap::new();
    while let Some(result) = reader.read_message().unwrap() {
        per_topic
            .entry(result.channel_name)
            .or_default()
            .push(result.message_type);
    }
    assert_eq!(per_topic["gt"], vec![MessageKind::GroundTruth; 3]);
    assert_eq!(per_topic["sv"], vec![MessageKind::SensorView; 3]);
}

#[test]
fn metadata_is_readable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("meta.mcap");

    let mut writer = McapTraceWriter::new();
    writer.try_open(&path).unwrap();
    let mut metadata = McapTraceWriter::prepare_required_file_metadata();
    metadata
        .metadata
        .insert("description".to_string(), "unit test".to_string());
    writer.add_file_metadata(&metadata).unwrap();
    writer
        .add_channel("gt", MessageKind::GroundTruth, BTreeMap::new())
        .unwrap();
    writer.write_message(&ground_truth(1, 0), "gt").unwrap();
    writer.close();

    let mut reader = McapTraceReader::new();
    reader.try_open(&path).unwrap();
    let record = reader.file_metadata_named(TRACE_METADATA_NAME).unwrap();
    assert_eq!(record.metadata["description"], "unit test");
    assert_eq!(record.metadata["min_osi_version"], "3.7.0");
}

#[test]
fn channel_metadata_gets_version_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("channel.mcap");

    let mut writer = open_writer(&path);
    writer
        .add_channel(
            "gt",
            MessageKind::GroundTruth,
            BTreeMap::from([(CHANNEL_OSI_VERSION_KEY.to_string(), "3.6.0".to_string())]),
        )
        .unwrap();
    writer.write_message(&ground_truth(1, 0), "gt").unwrap();
    writer.close();

    let bytes = std::fs::read(&path).unwrap();
    let message = mcap::MessageStream::new(&bytes)
        .unwrap()
        .next()
        .unwrap()
        .unwrap();
    assert_eq!(message.channel.metadata[CHANNEL_OSI_VERSION_KEY], "3.6.0");
    assert!(message
        .channel
        .metadata
        .contains_key(CHANNEL_PROTOBUF_VERSION_KEY));
    let schema = message.channel.schema.as_ref().unwrap();
    assert_eq!(schema.name, "osi3.GroundTruth");
    assert_eq!(schema.encoding, "protobuf");
    assert_eq!(message.log_time, 1_000_000_000);
    assert_eq!(message.publish_time, 1_000_000_000);
}

#[test]
fn log_time_is_message_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("time.mcap");

    let mut writer = open_writer(&path);
    writer
        .add_channel("gt", MessageKind::GroundTruth, BTreeMap::new())
        .unwrap();
    writer.write_message(&ground_truth(42, 123_456), "gt").unwrap();
    writer.close();

    let bytes = std::fs::read(&path).unwrap();
    let message = mcap::MessageStream::new(&bytes)
        .unwrap()
        .next()
        .unwrap()
        .unwrap();
    assert_eq!(message.log_time, 42_000_123_456);
}

/// Writes one OSI message and one message with a foreign schema.
fn write_mixed(path: &Path) {
    let mut writer = open_writer(path);
    writer
        .add_channel("gt", MessageKind::GroundTruth, BTreeMap::new())
        .unwrap();
    writer.write_message(&ground_truth(1, 0), "gt").unwrap();

    let raw = writer.mcap_writer_mut().unwrap();
    let schema = raw.add_schema("foo.Bar", "jsonschema", b"{}").unwrap();
    let channel = raw
        .add_channel(schema, "foreign", "json", &BTreeMap::new())
        .unwrap();
    raw.write_to_known_channel(
        &mcap::records::MessageHeader {
            channel_id: channel,
            sequence: 0,
            log_time: 2_000_000_000,
            publish_time: 2_000_000_000,
        },
        b"{}",
    )
    .unwrap();
    writer.close();
}

#[test]
fn non_osi_messages_fail_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixed.mcap");
    write_mixed(&path);

    let mut reader = McapTraceReader::new();
    reader.try_open(&path).unwrap();
    assert!(reader.read_message().unwrap().is_some());
    assert!(matches!(
        reader.read_message().unwrap_err(),
        TraceFileError::UnsupportedMessage { topic, .. } if topic == "foreign"
    ));
}

#[test]
fn non_osi_messages_can_be_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixed.mcap");
    write_mixed(&path);

    let mut reader = McapTraceReader::new();
    reader.set_skip_non_osi_messages(true);
    reader.try_open(&path).unwrap();
    let result = reader.read_message().unwrap().unwrap();
    assert_eq!(result.channel_name, "gt");
    assert!(reader.read_message().unwrap().is_none());
    assert!(!reader.has_next());
}

#[test]
fn reader_filters_topics_and_time() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("filter.mcap");

    let mut writer = open_writer(&path);
    writer
        .add_channel("gt", MessageKind::GroundTruth, BTreeMap::new())
        .unwrap();
    writer
        .add_channel("sv", MessageKind::SensorView, BTreeMap::new())
        .unwrap();
    for i in 0..10 {
        writer.write_message(&ground_truth(i, 0), "gt").unwrap();
        writer.write_message(&sensor_view(i), "sv").unwrap();
    }
    writer.close();

    let mut reader = McapTraceReader::new();
    let config = McapReaderConfig {
        topics: Some(vec!["sv".to_string()]),
        start_time_ns: Some(2_000_000_000),
        end_time_ns: Some(5_000_000_000),
        ..Default::default()
    };
    reader.try_open_with_config(&path, config).unwrap();
    let mut times = Vec::new();
    while let Some(result) = reader.read_message().unwrap() {
        assert_eq!(result.channel_name, "sv");
        times.push(result.message.timestamp_nanos());
    }
    assert_eq!(times, vec![2_000_000_000, 3_000_000_000, 4_000_000_000]);
}

#[test]
fn compression_options_all_read_back() {
    let dir = tempfile::tempdir().unwrap();
    for compression in [McapCompression::None, McapCompression::Lz4, McapCompression::Zstd] {
        let path = dir.path().join(format!("{compression}.mcap"));
        let config = McapWriterConfig {
            chunk_size: 1024,
            compression,
            ..Default::default()
        };
        let mut writer = McapTraceWriter::with_config(config);
        writer.try_open(&path).unwrap();
        writer
            .add_file_metadata(&McapTraceWriter::prepare_required_file_metadata())
            .unwrap();
        writer
            .add_channel("gt", MessageKind::GroundTruth, BTreeMap::new())
            .unwrap();
        for i in 0..50 {
            writer.write_message(&ground_truth(i, 0), "gt").unwrap();
        }
        writer.close();

        let mut reader = McapTraceReader::new();
        reader.try_open(&path).unwrap();
        let mut count = 0;
        while reader.read_message().unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 50, "{compression}");
    }
}

#[test]
fn open_checks_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut reader = McapTraceReader::new();
    assert!(matches!(
        reader.try_open(dir.path().join("missing.mcap")).unwrap_err(),
        TraceFileError::NotFound(_)
    ));
    assert!(matches!(
        reader.try_open(dir.path().join("trace.osi")).unwrap_err(),
        TraceFileError::WrongExtension { .. }
    ));
}

#[test]
fn garbage_file_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("junk.mcap");
    std::fs::write(&path, b"definitely not an mcap file").unwrap();
    let mut reader = McapTraceReader::new();
    assert!(!reader.open(&path));
    assert!(!reader.is_open());
    assert!(!reader.has_next());
}

#[test]
fn try_close_finishes_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("closed.mcap");

    let mut writer = open_writer(&path);
    writer
        .add_channel("ground_truth", MessageKind::GroundTruth, BTreeMap::new())
        .unwrap();
    writer.write_message(&ground_truth(1, 0), "ground_truth").unwrap();
    writer.try_close().unwrap();
    assert!(!writer.is_open());
    writer.try_close().unwrap();

    let mut reader = McapTraceReader::new();
    reader.try_open(&path).unwrap();
    assert!(reader.read_message().unwrap().is_some());
}
