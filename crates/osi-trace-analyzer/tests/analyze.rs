use std::path::{Path, PathBuf};

use osi_trace_analyzer::config::{DEFAULT_ASSUMED_FRAME_RATE_HZ, MIN_CHUNK_SIZE};
use osi_trace_analyzer::{
    analyze, analyze_with_sample_size, recommend_mcap_options, AnalyzeError,
};
use osi_trace_file::{encode_frame, BinaryTraceWriter, McapCompression};
use osi_trace_message::{osi3, TraceMessage, INTERFACE_VERSION};

/// A ground truth frame at `index / rate_hz` seconds padded to roughly `padding` bytes.
fn frame(index: u64, rate_hz: u64, padding: usize) -> TraceMessage {
    let nanos_total = index * 1_000_000_000 / rate_hz;
    osi3::GroundTruth {
        version: Some(INTERFACE_VERSION),
        timestamp: Some(osi3::Timestamp::new(
            (nanos_total / 1_000_000_000) as i64,
            (nanos_total % 1_000_000_000) as u32,
        )),
        map_reference: Some("x".repeat(padding)),
        ..Default::default()
    }
    .into()
}

fn write_trace(dir: &Path, name: &str, messages: impl IntoIterator<Item = TraceMessage>) -> PathBuf {
    let path = dir.join(name);
    let mut writer = BinaryTraceWriter::new();
    writer.try_open(&path).unwrap();
    for message in messages {
        writer.write_message(&message).unwrap();
    }
    writer.close();
    path
}

#[test]
fn full_scan_measures_frame_rate() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_trace(dir.path(), "run_gt_.osi", (0..50).map(|i| frame(i, 10, 200)));

    let stats = analyze_with_sample_size(&path, 0).unwrap();
    assert_eq!(stats.message_count, 50);
    assert!(!stats.is_sampled);
    assert_eq!(stats.timestamp_sample_count, 50);
    assert_eq!(stats.timestamps_extracted, 50);
    assert!(!stats.frame_rate_assumed);
    assert!((stats.frame_rate_hz - 10.0).abs() < 1e-9);
    assert!((stats.duration_seconds - 4.9).abs() < 1e-9);
    assert_eq!(stats.first_timestamp_ns, 0);
    assert!(stats.is_valid());

    let file_size = std::fs::metadata(&path).unwrap().len();
    assert_eq!(stats.file_size_bytes, file_size);
    assert_eq!(stats.total_message_bytes, file_size - 4 * 50);
    assert!(stats.min_message_size <= stats.max_message_size);
    assert!((stats.bytes_per_second - stats.total_message_bytes as f64 / 4.9).abs() < 1e-6);
}

#[test]
fn sampling_selects_a_subset() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_trace(dir.path(), "run_gt_.osi", (0..1000).map(|i| frame(i, 100, 10)));

    let stats = analyze_with_sample_size(&path, 10).unwrap();
    assert!(stats.is_sampled);
    assert_eq!(stats.timestamp_sample_count, 10);
    assert_eq!(stats.timestamps_extracted, 10);
    assert_eq!(stats.message_count, 1000);
    // First and last frames are always sampled, so the rate is exact.
    assert!((stats.frame_rate_hz - 100.0).abs() < 1e-6);

    assert_eq!(stats, analyze_with_sample_size(&path, 10).unwrap());
}

#[test]
fn trace_starting_at_zero_samples_exact_rate() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_trace(dir.path(), "zero_gt_.osi", (0..1000).map(|i| frame(i, 10, 10)));

    let stats = analyze_with_sample_size(&path, 10).unwrap();
    assert!(stats.is_sampled);
    assert_eq!(stats.timestamps_extracted, 10);
    assert_eq!(stats.first_timestamp_ns, 0);
    assert!(!stats.frame_rate_assumed);
    assert!((stats.frame_rate_hz - 10.0).abs() < 1e-6);
    assert!((stats.duration_seconds - 99.9).abs() < 1e-6);
}

#[test]
fn default_sample_size_covers_small_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_trace(dir.path(), "small_gt_.osi", (0..20).map(|i| frame(i, 20, 10)));
    let stats = analyze(&path).unwrap();
    assert!(!stats.is_sampled);
    assert!((stats.frame_rate_hz - 20.0).abs() < 1e-9);
}

#[test]
fn missing_timestamps_assume_default_rate() {
    let dir = tempfile::tempdir().unwrap();
    let messages = (0..12).map(|_| {
        TraceMessage::from(osi3::GroundTruth {
            map_reference: Some("no time".to_string()),
            ..Default::default()
        })
    });
    let path = write_trace(dir.path(), "untimed_gt_.osi", messages);

    let stats = analyze(&path).unwrap();
    assert_eq!(stats.timestamps_extracted, 0);
    assert!(stats.frame_rate_assumed);
    assert_eq!(stats.frame_rate_hz, DEFAULT_ASSUMED_FRAME_RATE_HZ);
    assert_eq!(stats.duration_seconds, 0.0);
    assert!((stats.bytes_per_second - stats.avg_message_size * DEFAULT_ASSUMED_FRAME_RATE_HZ).abs() < 1e-9);
}

#[test]
fn single_message_assumes_default_rate() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_trace(dir.path(), "one_gt_.osi", [frame(0, 10, 10)]);
    let stats = analyze(&path).unwrap();
    assert_eq!(stats.message_count, 1);
    assert_eq!(stats.min_message_size, stats.max_message_size);
    assert!(stats.frame_rate_assumed);
    assert!(!stats.is_valid());
}

#[test]
fn decreasing_timestamps_assume_default_rate() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_trace(
        dir.path(),
        "back_gt_.osi",
        (0..15).rev().map(|i| frame(i, 10, 10)),
    );
    let stats = analyze(&path).unwrap();
    assert!(stats.frame_rate_assumed);
}

#[test]
fn small_messages_recommend_no_compression() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_trace(dir.path(), "tiny_gt_.osi", (0..30).map(|i| frame(i, 10, 10)));
    let options = recommend_mcap_options(&analyze(&path).unwrap());
    assert_eq!(options.compression, McapCompression::None);
    assert_eq!(options.chunk_size, MIN_CHUNK_SIZE);
}

#[test]
fn large_messages_recommend_zstd() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_trace(dir.path(), "big_gt_.osi", (0..30).map(|i| frame(i, 10, 4096)));
    let options = recommend_mcap_options(&analyze(&path).unwrap());
    assert_eq!(options.compression, McapCompression::Zstd);
}

#[test]
fn rejects_bad_paths() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        analyze(dir.path().join("missing.osi")).unwrap_err(),
        AnalyzeError::NotFound(_)
    ));
    let txth = dir.path().join("trace.txth");
    std::fs::write(&txth, "x").unwrap();
    assert!(matches!(
        analyze(&txth).unwrap_err(),
        AnalyzeError::WrongExtension(_)
    ));
}

#[test]
fn empty_file_has_no_messages() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.osi");
    std::fs::write(&path, b"").unwrap();
    assert!(matches!(
        analyze(&path).unwrap_err(),
        AnalyzeError::NoMessages(_)
    ));
}

#[test]
fn corrupt_prefixes_abort() {
    let dir = tempfile::tempdir().unwrap();

    let oversize = dir.path().join("oversize.osi");
    std::fs::write(&oversize, u32::MAX.to_le_bytes()).unwrap();
    assert!(matches!(
        analyze(&oversize).unwrap_err(),
        AnalyzeError::OversizeMessage { index: 0, .. }
    ));

    let zero = dir.path().join("zero.osi");
    std::fs::write(&zero, [0u8; 4]).unwrap();
    assert!(matches!(
        analyze(&zero).unwrap_err(),
        AnalyzeError::EmptyMessage { index: 0 }
    ));

    let short_prefix = dir.path().join("short.osi");
    std::fs::write(&short_prefix, [1u8, 0]).unwrap();
    assert!(matches!(
        analyze(&short_prefix).unwrap_err(),
        AnalyzeError::Truncated { what: "size prefix", .. }
    ));
}

#[test]
fn truncated_payload_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let mut wire = bytes::BytesMut::new();
    encode_frame(b"hello", &mut wire).unwrap();
    encode_frame(b"world", &mut wire).unwrap();
    wire.truncate(wire.len() - 2);
    let path = dir.path().join("cut.osi");
    std::fs::write(&path, &wire).unwrap();
    assert!(matches!(
        analyze(&path).unwrap_err(),
        AnalyzeError::Truncated { what: "payload", index: 1 }
    ));
}

#[test]
fn opaque_payloads_are_measured() {
    let dir = tempfile::tempdir().unwrap();
    let mut wire = bytes::BytesMut::new();
    for payload in [&b"ab"[..], b"abcd", b"abcdef"] {
        encode_frame(payload, &mut wire).unwrap();
    }
    let path = dir.path().join("opaque.osi");
    std::fs::write(&path, &wire).unwrap();

    let stats = analyze(&path).unwrap();
    assert_eq!(stats.message_count, 3);
    assert_eq!(stats.min_message_size, 2);
    assert_eq!(stats.max_message_size, 6);
    assert_eq!(stats.avg_message_size, 4.0);
    assert!(stats.frame_rate_assumed);
}
