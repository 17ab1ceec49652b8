use bytes::{Buf, BufMut, Bytes, BytesMut};
use osi_trace_message::TraceMessage;

use crate::config::{LENGTH_PREFIX_SIZE, MAX_MESSAGE_SIZE};
use crate::error::{Result, TraceFileError};

/// Encode one `.osi` record.
///
/// Wire format:
/// ```text
/// ┌────────────────┬──────────────────────────┐
/// │ Length (4B LE) │ Protobuf payload         │
/// │                │ (Length bytes)           │
/// └────────────────┴──────────────────────────┘
/// ```
/// Empty payloads and payloads above `MAX_MESSAGE_SIZE` are rejected.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    check_size(payload.len())?;
    dst.reserve(LENGTH_PREFIX_SIZE + payload.len());
    dst.put_u32_le(payload.len() as u32);
    dst.put_slice(payload);
    Ok(())
}

/// Encode a message as one `.osi` record without an intermediate buffer.
pub fn encode_message_frame(message: &TraceMessage, dst: &mut BytesMut) -> Result<()> {
    let len = message.encoded_len();
    check_size(len)?;
    dst.reserve(LENGTH_PREFIX_SIZE + len);
    dst.put_u32_le(len as u32);
    message
        .encode(dst)
        .map_err(|err| TraceFileError::Io(std::io::Error::other(err)))
}

/// Decode one record from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete record yet.
/// The length prefix is validated as soon as it is available.
/// On success, consumes the record bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_size: usize) -> Result<Option<Bytes>> {
    if src.len() < LENGTH_PREFIX_SIZE {
        return Ok(None);
    }

    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    prefix.copy_from_slice(&src[..LENGTH_PREFIX_SIZE]);
    let size = u32::from_le_bytes(prefix) as usize;

    if size == 0 || size > max_size {
        return Err(TraceFileError::InvalidMessageSize {
            size,
            max: max_size,
        });
    }

    if src.len() < LENGTH_PREFIX_SIZE + size {
        return Ok(None);
    }

    src.advance(LENGTH_PREFIX_SIZE);
    Ok(Some(src.split_to(size).freeze()))
}

/// Bytes still needed before the record at the front of `src` is complete.
pub(crate) fn missing_bytes(src: &BytesMut) -> usize {
    if src.len() < LENGTH_PREFIX_SIZE {
        return LENGTH_PREFIX_SIZE - src.len();
    }
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    prefix.copy_from_slice(&src[..LENGTH_PREFIX_SIZE]);
    (LENGTH_PREFIX_SIZE + u32::from_le_bytes(prefix) as usize).saturating_sub(src.len())
}

fn check_size(size: usize) -> Result<()> {
    if size == 0 || size > MAX_MESSAGE_SIZE {
        return Err(TraceFileError::InvalidMessageSize {
            size,
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use osi_trace_message::osi3;

    use super::*;

    #[test]
    fn encode_writes_little_endian_prefix() {
        let mut buf = BytesMut::new();
        encode_frame(b"abc", &mut buf).unwrap();
        assert_eq!(&buf[..], &[3, 0, 0, 0, b'a', b'b', b'c']);
    }

    #[test]
    fn decode_consumes_one_record() {
        let mut buf = BytesMut::new();
        encode_frame(b"first", &mut buf).unwrap();
        encode_frame(b"second", &mut buf).unwrap();

        let first = decode_frame(&mut buf, MAX_MESSAGE_SIZE).unwrap().unwrap();
        assert_eq!(first.as_ref(), b"first");
        let second = decode_frame(&mut buf, MAX_MESSAGE_SIZE).unwrap().unwrap();
        assert_eq!(second.as_ref(), b"second");
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_incomplete_prefix() {
        let mut buf = BytesMut::from(&[0x05, 0x00][..]);
        assert!(decode_frame(&mut buf, MAX_MESSAGE_SIZE).unwrap().is_none());
        assert_eq!(missing_bytes(&buf), 2);
    }

    #[test]
    fn decode_incomplete_payload() {
        let mut buf = BytesMut::new();
        encode_frame(b"hello", &mut buf).unwrap();
        buf.truncate(LENGTH_PREFIX_SIZE + 2);

        assert!(decode_frame(&mut buf, MAX_MESSAGE_SIZE).unwrap().is_none());
        assert_eq!(missing_bytes(&buf), 3);
    }

    #[test]
    fn decode_rejects_zero_length() {
        let mut buf = BytesMut::from(&[0u8, 0, 0, 0][..]);
        let result = decode_frame(&mut buf, MAX_MESSAGE_SIZE);
        assert!(matches!(
            result,
            Err(TraceFileError::InvalidMessageSize { size: 0, .. })
        ));
    }

    #[test]
    fn decode_rejects_oversize_before_payload_arrives() {
        let mut buf = BytesMut::new();
        buf.put_u32_le(u32::MAX);
        let result = decode_frame(&mut buf, MAX_MESSAGE_SIZE);
        assert!(matches!(
            result,
            Err(TraceFileError::InvalidMessageSize { .. })
        ));
    }

    #[test]
    fn encode_rejects_empty_payload() {
        let mut buf = BytesMut::new();
        assert!(encode_frame(b"", &mut buf).is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn message_frame_matches_payload_frame() {
        let message = TraceMessage::from(osi3::GroundTruth {
            timestamp: Some(osi3::Timestamp::new(1, 2)),
            ..Default::default()
        });

        let mut direct = BytesMut::new();
        encode_message_frame(&message, &mut direct).unwrap();
        let mut indirect = BytesMut::new();
        encode_frame(&message.encode_to_vec(), &mut indirect).unwrap();
        assert_eq!(direct, indirect);
    }

    #[test]
    fn default_message_cannot_be_framed() {
        let message = TraceMessage::from(osi3::TrafficUpdate::default());
        let mut buf = BytesMut::new();
        assert!(matches!(
            encode_message_frame(&message, &mut buf),
            Err(TraceFileError::InvalidMessageSize { size: 0, .. })
        ));
    }
}
