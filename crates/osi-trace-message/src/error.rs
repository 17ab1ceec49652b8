/// Errors raised while decoding, printing, or parsing OSI messages.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// The binary payload is not a valid encoding of the expected message.
    #[error("failed to decode {type_name}: {source}")]
    Decode {
        type_name: &'static str,
        #[source]
        source: prost::DecodeError,
    },

    /// The text payload is not valid protobuf text format for the expected message.
    #[error("failed to parse {type_name} from text format: {message}")]
    TextParse {
        type_name: &'static str,
        message: String,
    },

    /// The embedded schema does not describe the requested message.
    #[error("schema descriptor has no message named {0}")]
    MissingDescriptor(&'static str),

    /// A name did not match any registered message kind.
    #[error("unknown message type: {0}")]
    UnknownKind(String),
}

pub type Result<T> = std::result::Result<T, MessageError>;
