use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::config::{
    ANALYSIS_SAMPLE_SIZE, DEFAULT_ASSUMED_FRAME_RATE_HZ, MAX_EXPECTED_FRAME_RATE_HZ,
    MAX_MESSAGE_SIZE, MIN_EXPECTED_FRAME_RATE_HZ,
};
use crate::error::{AnalyzeError, Result};
use crate::statistics::OsiFileStatistics;
use crate::wire::extract_timestamp_nanos;

const READ_BUFFER_SIZE: usize = 256 * 1024;

/// Analyze a binary trace file, sampling the default number of timestamps.
pub fn analyze(path: impl AsRef<Path>) -> Result<OsiFileStatistics> {
    analyze_with_sample_size(path, ANALYSIS_SAMPLE_SIZE)
}

/// Analyze a binary trace file.
///
/// `sample_size` bounds how many payloads are read for timestamps; 0 reads
/// every payload.
pub fn analyze_with_sample_size(
    path: impl AsRef<Path>,
    sample_size: usize,
) -> Result<OsiFileStatistics> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(AnalyzeError::NotFound(path.to_path_buf()));
    }
    if path.extension().and_then(|ext| ext.to_str()) != Some("osi") {
        return Err(AnalyzeError::WrongExtension(path.to_path_buf()));
    }

    let mut scanner = Scanner::open(path)?;
    let mut stats = OsiFileStatistics {
        file_path: path.to_path_buf(),
        file_size_bytes: scanner.file_size,
        ..Default::default()
    };

    // Pass 1: sizes only.
    let mut min_size = usize::MAX;
    let mut index = 0usize;
    while let Some(size) = scanner.next_size(index)? {
        scanner.skip(size, index)?;
        min_size = min_size.min(size);
        stats.max_message_size = stats.max_message_size.max(size);
        stats.total_message_bytes += size as u64;
        index += 1;
    }
    let total = index;
    if total == 0 {
        return Err(AnalyzeError::NoMessages(path.to_path_buf()));
    }
    stats.message_count = total;
    stats.total_message_count_estimate = total;
    stats.min_message_size = min_size;
    stats.avg_message_size = stats.total_message_bytes as f64 / total as f64;

    // Pass 2: timestamps of the sampled messages.
    let samples = sample_indices(total, sample_size);
    stats.is_sampled = samples.len() < total;
    stats.timestamp_sample_count = samples.len();

    scanner.rewind()?;
    let mut first = None;
    let mut last = None;
    let mut cursor = 0;
    for index in 0..total {
        let Some(size) = scanner.next_size(index)? else {
            break;
        };
        if samples.get(cursor) != Some(&index) {
            scanner.skip(size, index)?;
            continue;
        }
        cursor += 1;
        let payload = scanner.read_payload(size, index)?;
        match extract_timestamp_nanos(&payload) {
            Some(timestamp) => {
                if first.is_none() {
                    first = Some(timestamp);
                }
                last = Some(timestamp);
                stats.timestamps_extracted += 1;
            }
            None => tracing::debug!(index, size, "no timestamp found in sampled message"),
        }
    }

    derive_timing(&mut stats, first, last);
    tracing::debug!(
        path = %path.display(),
        messages = stats.message_count,
        sampled = stats.timestamp_sample_count,
        frame_rate_hz = stats.frame_rate_hz,
        "analyzed binary trace file"
    );
    Ok(stats)
}

/// Indices of `sample_size` messages spread evenly over `total`.
///
/// Index `i` of `k` maps to `round(i * (total - 1) / (k - 1))`. A sample
/// size of 0 or at least `total` selects every message; otherwise at least
/// two messages (first and last) are selected.
pub fn sample_indices(total: usize, sample_size: usize) -> Vec<usize> {
    if sample_size == 0 || sample_size >= total {
        return (0..total).collect();
    }
    let k = sample_size.max(2).min(total);
    let span = (total - 1) as f64;
    let denom = (k - 1) as f64;
    (0..k)
        .map(|i| (i as f64 * span / denom).round() as usize)
        .collect()
}

fn derive_timing(stats: &mut OsiFileStatistics, first: Option<u64>, last: Option<u64>) {
    if let (Some(first), Some(last)) = (first, last) {
        if stats.timestamps_extracted >= 2 && last > first && stats.message_count > 1 {
            stats.first_timestamp_ns = first;
            stats.last_timestamp_ns = last;
            stats.duration_seconds = (last - first) as f64 / 1e9;
            stats.avg_frame_interval_seconds =
                stats.duration_seconds / (stats.message_count - 1) as f64;
            stats.frame_rate_hz = 1.0 / stats.avg_frame_interval_seconds;
            stats.bytes_per_second = stats.total_message_bytes as f64 / stats.duration_seconds;
        }
    }

    if !(stats.frame_rate_hz.is_finite() && stats.frame_rate_hz > 0.0) {
        tracing::warn!(
            default_hz = DEFAULT_ASSUMED_FRAME_RATE_HZ,
            "could not determine frame rate from timestamps (checked fields 2 and 10); using default"
        );
        stats.frame_rate_hz = DEFAULT_ASSUMED_FRAME_RATE_HZ;
        stats.frame_rate_assumed = true;
        stats.avg_frame_interval_seconds = 1.0 / stats.frame_rate_hz;
        stats.bytes_per_second = stats.avg_message_size * stats.frame_rate_hz;
    }

    if stats.frame_rate_hz < MIN_EXPECTED_FRAME_RATE_HZ {
        tracing::warn!(
            frame_rate_hz = stats.frame_rate_hz,
            "detected frame rate is unusually low; timestamps may be incorrect"
        );
    }
    if stats.frame_rate_hz > MAX_EXPECTED_FRAME_RATE_HZ {
        tracing::warn!(
            frame_rate_hz = stats.frame_rate_hz,
            "detected frame rate is unusually high; timestamps may be incorrect"
        );
    }
}

/// Sequential reader over the length-prefixed records of a file.
struct Scanner {
    reader: BufReader<File>,
    path: PathBuf,
    file_size: u64,
    position: u64,
}

impl Scanner {
    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| io_error(path, e))?;
        let file_size = file.metadata().map_err(|e| io_error(path, e))?.len();
        Ok(Self {
            reader: BufReader::with_capacity(READ_BUFFER_SIZE, file),
            path: path.to_path_buf(),
            file_size,
            position: 0,
        })
    }

    fn rewind(&mut self) -> Result<()> {
        self.reader
            .seek(SeekFrom::Start(0))
            .map_err(|e| io_error(&self.path, e))?;
        self.position = 0;
        Ok(())
    }

    /// Next length prefix, or `None` at a clean end of file.
    fn next_size(&mut self, index: usize) -> Result<Option<usize>> {
        let mut prefix = [0u8; 4];
        let mut filled = 0;
        while filled < prefix.len() {
            match self.reader.read(&mut prefix[filled..]) {
                Ok(0) if filled == 0 => return Ok(None),
                Ok(0) => {
                    return Err(AnalyzeError::Truncated {
                        what: "size prefix",
                        index,
                    })
                }
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(io_error(&self.path, err)),
            }
        }
        self.position += prefix.len() as u64;

        let size = u32::from_le_bytes(prefix) as usize;
        if size == 0 {
            return Err(AnalyzeError::EmptyMessage { index });
        }
        if size > MAX_MESSAGE_SIZE {
            tracing::error!(size, index, "unusually large message size; file may be corrupted");
            return Err(AnalyzeError::OversizeMessage { size, index });
        }
        Ok(Some(size))
    }

    fn skip(&mut self, size: usize, index: usize) -> Result<()> {
        let end = self.position + size as u64;
        if end > self.file_size {
            return Err(AnalyzeError::Truncated {
                what: "payload",
                index,
            });
        }
        self.reader
            .seek_relative(size as i64)
            .map_err(|e| io_error(&self.path, e))?;
        self.position = end;
        Ok(())
    }

    fn read_payload(&mut self, size: usize, index: usize) -> Result<Vec<u8>> {
        let mut payload = vec![0u8; size];
        self.reader.read_exact(&mut payload).map_err(|err| {
            if err.kind() == ErrorKind::UnexpectedEof {
                AnalyzeError::Truncated {
                    what: "payload",
                    index,
                }
            } else {
                io_error(&self.path, err)
            }
        })?;
        self.position += size as u64;
        Ok(payload)
    }
}

fn io_error(path: &Path, source: io::Error) -> AnalyzeError {
    AnalyzeError::Io {
        path: path.to_path_buf(),
        source,
    }
}
