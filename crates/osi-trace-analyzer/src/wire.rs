//! Minimal protobuf wire-format walker.
//!
//! Recovers the top-level `Timestamp` of an OSI message without a schema.

use osi_trace_message::{MessageKind, NANOS_PER_SECOND};

/// Longest valid varint encoding of a 64-bit value.
const MAX_VARINT_LEN: usize = 10;

const WIRE_VARINT: u64 = 0;
const WIRE_FIXED64: u64 = 1;
const WIRE_LENGTH_DELIMITED: u64 = 2;
const WIRE_FIXED32: u64 = 5;

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn read_varint(&mut self) -> Option<u64> {
        let mut value = 0u64;
        for i in 0..MAX_VARINT_LEN {
            let byte = *self.data.get(self.pos)?;
            self.pos += 1;
            value |= u64::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                return Some(value);
            }
        }
        None
    }

    /// Returns `(field_number, wire_type)`.
    fn read_tag(&mut self) -> Option<(u64, u64)> {
        let tag = self.read_varint()?;
        Some((tag >> 3, tag & 0x7))
    }

    fn skip(&mut self, len: usize) -> Option<()> {
        let end = self.pos.checked_add(len)?;
        if end > self.data.len() {
            return None;
        }
        self.pos = end;
        Some(())
    }

    fn read_length_delimited(&mut self) -> Option<&'a [u8]> {
        let len = usize::try_from(self.read_varint()?).ok()?;
        let start = self.pos;
        self.skip(len)?;
        Some(&self.data[start..self.pos])
    }

    /// Skip one field value. Group wire types are not supported.
    fn skip_field(&mut self, wire_type: u64) -> Option<()> {
        match wire_type {
            WIRE_VARINT => self.read_varint().map(|_| ()),
            WIRE_FIXED64 => self.skip(8),
            WIRE_LENGTH_DELIMITED => self.read_length_delimited().map(|_| ()),
            WIRE_FIXED32 => self.skip(4),
            _ => None,
        }
    }
}

/// Extract the top-level timestamp of an encoded OSI message in nanoseconds.
///
/// Every field the registry lists as a top-level timestamp (2, and 10 for
/// `HostVehicleData`) is tried as `Timestamp { int64 seconds = 1; uint32 nanos = 2; }`.
/// A candidate that does not parse as a valid timestamp is skipped and the
/// scan continues. Returns `None` on truncation, an unsupported wire type, or
/// when no candidate is valid.
///
/// The walker cannot tell a `Timestamp` from another message with the same
/// layout: a `SensorViewConfiguration`, whose field 2 is an `Identifier`,
/// yields the identifier value as seconds.
pub fn extract_timestamp_nanos(payload: &[u8]) -> Option<u64> {
    let mut cursor = Cursor::new(payload);
    while !cursor.is_empty() {
        let (field, wire_type) = cursor.read_tag()?;
        let is_candidate =
            wire_type == WIRE_LENGTH_DELIMITED && MessageKind::is_timestamp_field(field);
        if is_candidate {
            let nested = cursor.read_length_delimited()?;
            if let Some(nanos) = parse_timestamp(nested) {
                return Some(nanos);
            }
            continue;
        }
        cursor.skip_field(wire_type)?;
    }
    None
}

fn parse_timestamp(data: &[u8]) -> Option<u64> {
    let mut cursor = Cursor::new(data);
    let mut seconds: Option<i64> = None;
    let mut nanos: Option<u64> = None;

    while !cursor.is_empty() {
        let (field, wire_type) = cursor.read_tag()?;
        match (field, wire_type) {
            (1, WIRE_VARINT) => seconds = Some(cursor.read_varint()? as i64),
            (2, WIRE_VARINT) => nanos = Some(cursor.read_varint()?),
            _ => cursor.skip_field(wire_type)?,
        }
    }

    if seconds.is_none() && nanos.is_none() {
        return None;
    }
    let seconds = u64::try_from(seconds.unwrap_or(0)).ok()?;
    let nanos = nanos.unwrap_or(0);
    if nanos >= NANOS_PER_SECOND {
        return None;
    }
    seconds.checked_mul(NANOS_PER_SECOND)?.checked_add(nanos)
}
