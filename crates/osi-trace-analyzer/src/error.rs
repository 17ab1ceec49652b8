use std::path::PathBuf;

/// Errors that abort an analysis.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    /// The file does not exist.
    #[error("file does not exist: {0}")]
    NotFound(PathBuf),

    /// Only binary `.osi` files can be analyzed.
    #[error("file must have a .osi extension: {0}")]
    WrongExtension(PathBuf),

    /// A length prefix is zero.
    #[error("invalid zero message size at message {index}")]
    EmptyMessage { index: usize },

    /// A length prefix exceeds the sanity ceiling; the file is likely corrupt.
    #[error("unusually large message size ({size} bytes) at message {index}; file may be corrupted")]
    OversizeMessage { size: usize, index: usize },

    /// The file ended inside a length prefix or payload.
    #[error("file truncated while reading {what} of message {index}")]
    Truncated { what: &'static str, index: usize },

    /// The file holds no messages.
    #[error("no messages could be read from {0}")]
    NoMessages(PathBuf),

    /// An I/O error occurred while scanning.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, AnalyzeError>;
