use std::fmt;
use std::path::Path;

use osi_trace_message::MessageKind;

use crate::error::{Result, TraceFileError};

/// On-disk trace format, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceFormat {
    /// Length-prefixed binary records (`.osi`).
    Binary,
    /// Protobuf text format records (`.txth`).
    Text,
    /// MCAP container (`.mcap`).
    Mcap,
}

impl TraceFormat {
    pub fn extension(self) -> &'static str {
        match self {
            TraceFormat::Binary => "osi",
            TraceFormat::Text => "txth",
            TraceFormat::Mcap => "mcap",
        }
    }

    /// Extensions are matched exactly; `.OSI` is not `.osi`.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "osi" => Some(TraceFormat::Binary),
            "txth" => Some(TraceFormat::Text),
            "mcap" => Some(TraceFormat::Mcap),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Like [`TraceFormat::from_path`], reporting the offending extension.
    pub fn detect(path: &Path) -> Result<Self> {
        Self::from_path(path).ok_or_else(|| {
            TraceFileError::UnsupportedFormat(
                path.extension()
                    .map(|ext| ext.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            )
        })
    }

    /// Fail unless `path` carries this format's extension.
    pub fn require(self, path: &Path) -> Result<()> {
        if Self::from_path(path) == Some(self) {
            return Ok(());
        }
        Err(TraceFileError::WrongExtension {
            path: path.to_path_buf(),
            expected: self.extension(),
        })
    }
}

impl fmt::Display for TraceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Decide which message kind a single-channel file carries.
///
/// An explicit kind always wins. When it disagrees with the kind the file
/// name suggests, a warning is logged. Without an explicit kind the file
/// name infix decides.
pub fn resolve_message_kind(path: &Path, explicit: Option<MessageKind>) -> Result<MessageKind> {
    let inferred = MessageKind::from_file_name(path);
    match (explicit, inferred) {
        (Some(explicit), Some(inferred)) if explicit != inferred => {
            tracing::warn!(
                path = %path.display(),
                explicit = %explicit,
                inferred = %inferred,
                "message type from file name differs from the requested type; using the requested type"
            );
            Ok(explicit)
        }
        (Some(explicit), _) => Ok(explicit),
        (None, Some(inferred)) => Ok(inferred),
        (None, None) => Err(TraceFileError::UnknownMessageKind(path.to_path_buf())),
    }
}
