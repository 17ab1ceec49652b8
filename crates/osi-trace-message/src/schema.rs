use std::sync::LazyLock;

use prost::encoding::{encode_key, encode_varint, WireType};
use prost_reflect::{DescriptorPool, FileDescriptor, MessageDescriptor};

use crate::error::{MessageError, Result};
use crate::kind::MessageKind;
use crate::osi3::InterfaceVersion;

/// Serialized `FileDescriptorSet` covering every OSI schema file.
static FILE_DESCRIPTOR_SET: &[u8] =
    include_bytes!(concat!(env!("OUT_DIR"), "/osi3_descriptor.bin"));

static DESCRIPTOR_POOL: LazyLock<DescriptorPool> = LazyLock::new(|| {
    DescriptorPool::decode(FILE_DESCRIPTOR_SET)
        .expect("descriptor set produced by build.rs must decode")
});

/// OSI interface version of the bundled schema.
pub const INTERFACE_VERSION: InterfaceVersion = InterfaceVersion {
    version_major: Some(3),
    version_minor: Some(7),
    version_patch: Some(0),
};

/// Protobuf language version the bundled schema is written against.
pub const PROTOBUF_VERSION: &str = "3.0.0";

/// Serialized descriptor set covering every bundled schema file.
pub fn file_descriptor_set() -> &'static [u8] {
    FILE_DESCRIPTOR_SET
}

pub fn descriptor_pool() -> &'static DescriptorPool {
    &DESCRIPTOR_POOL
}

/// Reflection descriptor for one message kind.
pub fn message_descriptor(kind: MessageKind) -> Result<MessageDescriptor> {
    descriptor_pool()
        .get_message_by_name(kind.type_name())
        .ok_or(MessageError::MissingDescriptor(kind.type_name()))
}

/// `FileDescriptorSet` holding only the files `kind` needs: its own file and
/// the transitive imports, dependencies first.
///
/// Each file is written with its extension options intact, so
/// `current_interface_version` survives.
pub fn schema_descriptor_set(kind: MessageKind) -> Result<Vec<u8>> {
    let root = message_descriptor(kind)?.parent_file();
    let mut files = Vec::new();
    collect_imports(root, &mut files);

    let mut buf = Vec::new();
    for file in &files {
        let encoded = file.encode_to_vec();
        encode_key(1, WireType::LengthDelimited, &mut buf);
        encode_varint(encoded.len() as u64, &mut buf);
        buf.extend_from_slice(&encoded);
    }
    Ok(buf)
}

fn collect_imports(file: FileDescriptor, out: &mut Vec<FileDescriptor>) {
    if out.iter().any(|seen| seen.name() == file.name()) {
        return;
    }
    for dependency in file.dependencies() {
        collect_imports(dependency, out);
    }
    out.push(file);
}

/// `INTERFACE_VERSION` as `major.minor.patch`.
pub fn interface_version_string() -> String {
    format!(
        "{}.{}.{}",
        INTERFACE_VERSION.version_major(),
        INTERFACE_VERSION.version_minor(),
        INTERFACE_VERSION.version_patch()
    )
}
