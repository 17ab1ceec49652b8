//! OSI top-level message types and the message type registry.
//!
//! Every trace file carries exactly one of ten top-level OSI messages
//! (e.g. `osi3.GroundTruth`). This crate provides:
//! - The generated message types in [`osi3`]
//! - [`MessageKind`], a closed registry mapping each kind to its fully-qualified
//!   type name, CLI name, and file name infix
//! - [`TraceMessage`], a tagged union over the ten concrete messages
//! - The embedded schema descriptor used for text format and MCAP schemas

pub mod error;
pub mod kind;
pub mod message;
pub mod schema;

/// Generated OSI message types.
#[allow(clippy::all, missing_docs)]
pub mod osi3 {
    include!(concat!(env!("OUT_DIR"), "/osi3.rs"));
}

pub use error::{MessageError, Result};
pub use kind::{KindEntry, MessageKind};
pub use message::{timestamp_to_nanos, TraceMessage, NANOS_PER_SECOND};
pub use schema::{
    descriptor_pool, file_descriptor_set, interface_version_string, message_descriptor,
    schema_descriptor_set, INTERFACE_VERSION, PROTOBUF_VERSION,
};
