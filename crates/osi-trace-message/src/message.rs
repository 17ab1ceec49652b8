use prost::bytes::BufMut;
use prost::Message;
use prost_reflect::text_format::FormatOptions;
use prost_reflect::DynamicMessage;

use crate::error::{MessageError, Result};
use crate::kind::MessageKind;
use crate::osi3;
use crate::schema::message_descriptor;

pub const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// One decoded top-level OSI message.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceMessage {
    GroundTruth(osi3::GroundTruth),
    SensorData(osi3::SensorData),
    SensorView(osi3::SensorView),
    SensorViewConfiguration(osi3::SensorViewConfiguration),
    HostVehicleData(osi3::HostVehicleData),
    TrafficCommand(osi3::TrafficCommand),
    TrafficCommandUpdate(osi3::TrafficCommandUpdate),
    TrafficUpdate(osi3::TrafficUpdate),
    MotionRequest(osi3::MotionRequest),
    StreamingUpdate(osi3::StreamingUpdate),
}

/// Apply `$body` to the inner message of any variant.
macro_rules! with_inner {
    ($value:expr, $inner:ident => $body:expr) => {
        match $value {
            TraceMessage::GroundTruth($inner) => $body,
            TraceMessage::SensorData($inner) => $body,
            TraceMessage::SensorView($inner) => $body,
            TraceMessage::SensorViewConfiguration($inner) => $body,
            TraceMessage::HostVehicleData($inner) => $body,
            TraceMessage::TrafficCommand($inner) => $body,
            TraceMessage::TrafficCommandUpdate($inner) => $body,
            TraceMessage::TrafficUpdate($inner) => $body,
            TraceMessage::MotionRequest($inner) => $body,
            TraceMessage::StreamingUpdate($inner) => $body,
        }
    };
}

impl TraceMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            TraceMessage::GroundTruth(_) => MessageKind::GroundTruth,
            TraceMessage::SensorData(_) => MessageKind::SensorData,
            TraceMessage::SensorView(_) => MessageKind::SensorView,
            TraceMessage::SensorViewConfiguration(_) => MessageKind::SensorViewConfiguration,
            TraceMessage::HostVehicleData(_) => MessageKind::HostVehicleData,
            TraceMessage::TrafficCommand(_) => MessageKind::TrafficCommand,
            TraceMessage::TrafficCommandUpdate(_) => MessageKind::TrafficCommandUpdate,
            TraceMessage::TrafficUpdate(_) => MessageKind::TrafficUpdate,
            TraceMessage::MotionRequest(_) => MessageKind::MotionRequest,
            TraceMessage::StreamingUpdate(_) => MessageKind::StreamingUpdate,
        }
    }

    /// The top-level timestamp, if the message kind has one and it is set.
    pub fn timestamp(&self) -> Option<&osi3::Timestamp> {
        match self {
            TraceMessage::GroundTruth(m) => m.timestamp.as_ref(),
            TraceMessage::SensorData(m) => m.timestamp.as_ref(),
            TraceMessage::SensorView(m) => m.timestamp.as_ref(),
            TraceMessage::SensorViewConfiguration(_) => None,
            TraceMessage::HostVehicleData(m) => m.timestamp.as_ref(),
            TraceMessage::TrafficCommand(m) => m.timestamp.as_ref(),
            TraceMessage::TrafficCommandUpdate(m) => m.timestamp.as_ref(),
            TraceMessage::TrafficUpdate(m) => m.timestamp.as_ref(),
            TraceMessage::MotionRequest(m) => m.timestamp.as_ref(),
            TraceMessage::StreamingUpdate(m) => m.timestamp.as_ref(),
        }
    }

    /// Timestamp in nanoseconds; 0 when absent.
    pub fn timestamp_nanos(&self) -> u64 {
        self.timestamp().map(timestamp_to_nanos).unwrap_or(0)
    }

    pub fn encoded_len(&self) -> usize {
        with_inner!(self, m => m.encoded_len())
    }

    pub fn encode_to_vec(&self) -> Vec<u8> {
        with_inner!(self, m => m.encode_to_vec())
    }

    /// Append the binary encoding to `buf`.
    pub fn encode<B: BufMut>(&self, buf: &mut B) -> std::result::Result<(), prost::EncodeError> {
        with_inner!(self, m => m.encode(buf))
    }

    /// Decode a binary payload as the given kind.
    pub fn decode(kind: MessageKind, bytes: &[u8]) -> Result<Self> {
        let decoded = match kind {
            MessageKind::GroundTruth => osi3::GroundTruth::decode(bytes).map(Self::GroundTruth),
            MessageKind::SensorData => osi3::SensorData::decode(bytes).map(Self::SensorData),
            MessageKind::SensorView => osi3::SensorView::decode(bytes).map(Self::SensorView),
            MessageKind::SensorViewConfiguration => {
                osi3::SensorViewConfiguration::decode(bytes).map(Self::SensorViewConfiguration)
            }
            MessageKind::HostVehicleData => {
                osi3::HostVehicleData::decode(bytes).map(Self::HostVehicleData)
            }
            MessageKind::TrafficCommand => {
                osi3::TrafficCommand::decode(bytes).map(Self::TrafficCommand)
            }
            MessageKind::TrafficCommandUpdate => {
                osi3::TrafficCommandUpdate::decode(bytes).map(Self::TrafficCommandUpdate)
            }
            MessageKind::TrafficUpdate => {
                osi3::TrafficUpdate::decode(bytes).map(Self::TrafficUpdate)
            }
            MessageKind::MotionRequest => {
                osi3::MotionRequest::decode(bytes).map(Self::MotionRequest)
            }
            MessageKind::StreamingUpdate => {
                osi3::StreamingUpdate::decode(bytes).map(Self::StreamingUpdate)
            }
        };
        decoded.map_err(|source| MessageError::Decode {
            type_name: kind.type_name(),
            source,
        })
    }

    /// Reflective view of the message, backed by the embedded schema.
    pub fn to_dynamic(&self) -> Result<DynamicMessage> {
        let kind = self.kind();
        let descriptor = message_descriptor(kind)?;
        DynamicMessage::decode(descriptor, self.encode_to_vec().as_slice()).map_err(|source| {
            MessageError::Decode {
                type_name: kind.type_name(),
                source,
            }
        })
    }

    /// Multi-line protobuf text format, terminated by a newline.
    ///
    /// An all-default message prints as an empty string.
    pub fn to_text(&self) -> Result<String> {
        let options = FormatOptions::new().pretty(true);
        let mut text = self.to_dynamic()?.to_text_format_with_options(&options);
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        Ok(text)
    }

    /// Parse protobuf text format as the given kind.
    pub fn parse_text(kind: MessageKind, text: &str) -> Result<Self> {
        let descriptor = message_descriptor(kind)?;
        let dynamic = DynamicMessage::parse_text_format(descriptor, text).map_err(|err| {
            MessageError::TextParse {
                type_name: kind.type_name(),
                message: err.to_string(),
            }
        })?;
        Self::decode(kind, dynamic.encode_to_vec().as_slice())
    }
}

/// Seconds and nanoseconds folded into nanoseconds since the epoch.
///
/// Negative seconds clamp to 0; overflow saturates.
pub fn timestamp_to_nanos(timestamp: &osi3::Timestamp) -> u64 {
    let Ok(seconds) = u64::try_from(timestamp.seconds()) else {
        return 0;
    };
    seconds
        .saturating_mul(NANOS_PER_SECOND)
        .saturating_add(u64::from(timestamp.nanos()))
}

impl osi3::Timestamp {
    /// A timestamp with both fields present, so zero values are still encoded.
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Self {
            seconds: Some(seconds),
            nanos: Some(nanos),
        }
    }
}

impl osi3::Identifier {
    pub fn new(value: u64) -> Self {
        Self { value: Some(value) }
    }
}

macro_rules! impl_from_inner {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<osi3::$variant> for TraceMessage {
                fn from(message: osi3::$variant) -> Self {
                    TraceMessage::$variant(message)
                }
            }
        )*
    };
}

impl_from_inner!(
    GroundTruth,
    SensorData,
    SensorView,
    SensorViewConfiguration,
    HostVehicleData,
    TrafficCommand,
    TrafficCommandUpdate,
    TrafficUpdate,
    MotionRequest,
    StreamingUpdate,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::INTERFACE_VERSION;

    fn ground_truth(seconds: i64, nanos: u32) -> TraceMessage {
        osi3::GroundTruth {
            version: Some(INTERFACE_VERSION),
            timestamp: Some(osi3::Timestamp::new(seconds, nanos)),
            host_vehicle_id: Some(osi3::Identifier::new(7)),
            ..Default::default()
        }
        .into()
    }

    #[test]
    fn timestamp_folds_to_nanoseconds() {
        let message = ground_truth(42, 123_456);
        assert_eq!(message.timestamp_nanos(), 42_000_123_456);
    }

    #[test]
    fn missing_timestamp_is_zero() {
        let message = TraceMessage::from(osi3::SensorViewConfiguration {
            range: Some(120.0),
            ..Default::default()
        });
        assert!(message.timestamp().is_none());
        assert_eq!(message.timestamp_nanos(), 0);

        let message = TraceMessage::from(osi3::TrafficUpdate::default());
        assert_eq!(message.timestamp_nanos(), 0);
    }

    #[test]
    fn negative_seconds_clamp_to_zero() {
        assert_eq!(ground_truth(-5, 10).timestamp_nanos(), 0);
    }

    #[test]
    fn host_vehicle_data_timestamp_is_exposed() {
        let message = TraceMessage::from(osi3::HostVehicleData {
            timestamp: Some(osi3::Timestamp::new(3, 5)),
            ..Default::default()
        });
        assert_eq!(message.kind(), MessageKind::HostVehicleData);
        assert_eq!(message.timestamp_nanos(), 3_000_000_005);
    }

    #[test]
    fn binary_decode_restores_message() {
        let original = ground_truth(1, 500);
        let bytes = original.encode_to_vec();
        assert_eq!(bytes.len(), original.encoded_len());
        let decoded = TraceMessage::decode(MessageKind::GroundTruth, &bytes).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn ground_truth_uses_interface_field_numbers() {
        // traffic_sign = 6, traffic_light = 7, map_reference = 15
        let bytes = [
            0x32, 0x04, 0x0a, 0x02, 0x08, 0x04, //
            0x3a, 0x04, 0x0a, 0x02, 0x08, 0x09, //
            0x7a, 0x01, b'm',
        ];
        let decoded = TraceMessage::decode(MessageKind::GroundTruth, &bytes).unwrap();
        let TraceMessage::GroundTruth(gt) = decoded else {
            panic!("expected ground truth");
        };
        assert_eq!(gt.traffic_sign.len(), 1);
        assert_eq!(gt.traffic_sign[0].id, Some(osi3::Identifier::new(4)));
        assert_eq!(gt.traffic_light.len(), 1);
        assert_eq!(gt.traffic_light[0].id, Some(osi3::Identifier::new(9)));
        assert_eq!(gt.map_reference(), "m");
    }

    #[test]
    fn zero_timestamp_survives_encoding() {
        let original = ground_truth(0, 0);
        let bytes = original.encode_to_vec();
        let decoded = TraceMessage::decode(MessageKind::GroundTruth, &bytes).unwrap();
        assert_eq!(decoded.timestamp(), Some(&osi3::Timestamp::new(0, 0)));
        // version, timestamp { seconds: 0, nanos: 0 }, host_vehicle_id
        assert!(bytes.windows(6).any(|w| w == [0x12, 0x04, 0x08, 0x00, 0x10, 0x00]));
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = TraceMessage::decode(MessageKind::GroundTruth, &[0xff, 0xff, 0xff]).unwrap_err();
        assert!(matches!(
            err,
            MessageError::Decode {
                type_name: "osi3.GroundTruth",
                ..
            }
        ));
    }

    #[test]
    fn text_format_restores_message() {
        let original = ground_truth(12, 34);
        let text = original.to_text().unwrap();
        assert!(text.ends_with('\n'));
        assert!(text.lines().next().unwrap().starts_with("version"), "{text}");
        let parsed = TraceMessage::parse_text(MessageKind::GroundTruth, &text).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn text_parse_rejects_unknown_fields() {
        let err = TraceMessage::parse_text(MessageKind::SensorView, "no_such_field: 1\n").unwrap_err();
        assert!(matches!(err, MessageError::TextParse { .. }));
    }

    #[test]
    fn default_message_prints_empty() {
        let message = TraceMessage::from(osi3::StreamingUpdate::default());
        assert_eq!(message.to_text().unwrap(), "");
        assert_eq!(message.encoded_len(), 0);
    }
}
