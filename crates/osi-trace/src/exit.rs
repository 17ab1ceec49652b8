use std::io;

use osi_trace_analyzer::AnalyzeError;
use osi_trace_file::TraceFileError;
use osi_trace_message::MessageError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

/// A failed command: the message printed on stderr and the process exit code.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::UnexpectedEof | io::ErrorKind::InvalidData => DATA_INVALID,
        _ => FAILURE,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn message_error(context: &str, err: MessageError) -> CliError {
    match err {
        MessageError::UnknownKind(_) => CliError::new(USAGE, format!("{context}: {err}")),
        MessageError::MissingDescriptor(_) => CliError::new(INTERNAL, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn trace_file_error(context: &str, err: TraceFileError) -> CliError {
    match err {
        TraceFileError::Io(source) => io_error(context, source),
        TraceFileError::Message(err) => message_error(context, err),
        TraceFileError::UnsupportedFormat(_)
        | TraceFileError::WrongExtension { .. }
        | TraceFileError::UnknownMessageKind(_)
        | TraceFileError::EmptyTopic => CliError::new(USAGE, format!("{context}: {err}")),
        TraceFileError::NotFound(_) => CliError::new(FAILURE, format!("{context}: {err}")),
        TraceFileError::InvalidMessageSize { .. }
        | TraceFileError::Truncated(_)
        | TraceFileError::Mcap(_)
        | TraceFileError::UnsupportedMessage { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn analyze_error(context: &str, err: AnalyzeError) -> CliError {
    match err {
        AnalyzeError::Io { source, .. } => io_error(context, source),
        AnalyzeError::WrongExtension(_) => CliError::new(USAGE, format!("{context}: {err}")),
        AnalyzeError::NotFound(_) => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}
