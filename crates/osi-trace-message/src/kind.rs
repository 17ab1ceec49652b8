use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

use crate::error::MessageError;

/// The closed set of top-level OSI messages a trace file can carry.
///
/// A file that could not be classified is represented as `Option<MessageKind>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum MessageKind {
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
}

/// Static registry metadata for one message kind.
#[derive(Debug)]
pub struct KindEntry {
    pub kind: MessageKind,
    /// Fully-qualified protobuf name, e.g. `osi3.GroundTruth`.
    pub type_name: &'static str,
    /// Short name used on the command line, e.g. `GroundTruth`.
    pub name: &'static str,
    /// File name marker used to infer the kind from a path, e.g. `_gt_`.
    pub file_infix: &'static str,
    /// Field number of the top-level `Timestamp`, if the message has one.
    pub timestamp_field: Option<u32>,
}

/// Registry table in discriminant order. Lookups by infix scan in this order.
static ENTRIES: [KindEntry; 10] = [
    KindEntry {
        kind: MessageKind::GroundTruth,
        type_name: "osi3.GroundTruth",
        name: "GroundTruth",
        file_infix: "_gt_",
        timestamp_field: Some(2),
    },
    KindEntry {
        kind: MessageKind::SensorData,
        type_name: "osi3.SensorData",
        name: "SensorData",
        file_infix: "_sd_",
        timestamp_field: Some(2),
    },
    KindEntry {
        kind: MessageKind::SensorView,
        type_name: "osi3.SensorView",
        name: "SensorView",
        file_infix: "_sv_",
        timestamp_field: Some(2),
    },
    KindEntry {
        kind: MessageKind::SensorViewConfiguration,
        type_name: "osi3.SensorViewConfiguration",
        name: "SensorViewConfiguration",
        file_infix: "_svc_",
        timestamp_field: None,
    },
    KindEntry {
        kind: MessageKind::HostVehicleData,
        type_name: "osi3.HostVehicleData",
        name: "HostVehicleData",
        file_infix: "_hvd_",
        timestamp_field: Some(10),
    },
    KindEntry {
        kind: MessageKind::TrafficCommand,
        type_name: "osi3.TrafficCommand",
        name: "TrafficCommand",
        file_infix: "_tc_",
        timestamp_field: Some(2),
    },
    KindEntry {
        kind: MessageKind::TrafficCommandUpdate,
        type_name: "osi3.TrafficCommandUpdate",
        name: "TrafficCommandUpdate",
        file_infix: "_tcu_",
        timestamp_field: Some(2),
    },
    KindEntry {
        kind: MessageKind::TrafficUpdate,
        type_name: "osi3.TrafficUpdate",
        name: "TrafficUpdate",
        file_infix: "_tu_",
        timestamp_field: Some(2),
    },
    KindEntry {
        kind: MessageKind::MotionRequest,
        type_name: "osi3.MotionRequest",
        name: "MotionRequest",
        file_infix: "_mr_",
        timestamp_field: Some(2),
    },
    KindEntry {
        kind: MessageKind::StreamingUpdate,
        type_name: "osi3.StreamingUpdate",
        name: "StreamingUpdate",
        file_infix: "_su_",
        timestamp_field: Some(2),
    },
];

impl MessageKind {
    pub const ALL: [MessageKind; 10] = [
        MessageKind::GroundTruth,
        MessageKind::SensorData,
        MessageKind::SensorView,
        MessageKind::SensorViewConfiguration,
        MessageKind::HostVehicleData,
        MessageKind::TrafficCommand,
        MessageKind::TrafficCommandUpdate,
        MessageKind::TrafficUpdate,
        MessageKind::MotionRequest,
        MessageKind::StreamingUpdate,
    ];

    /// Full registry table.
    pub fn entries() -> &'static [KindEntry] {
        &ENTRIES
    }

    pub fn entry(self) -> &'static KindEntry {
        &ENTRIES[self as usize]
    }

    pub fn type_name(self) -> &'static str {
        self.entry().type_name
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }

    pub fn file_infix(self) -> &'static str {
        self.entry().file_infix
    }

    pub fn timestamp_field(self) -> Option<u32> {
        self.entry().timestamp_field
    }

    /// True if any kind carries its top-level `Timestamp` in `field`.
    pub fn is_timestamp_field(field: u64) -> bool {
        ENTRIES
            .iter()
            .filter_map(|entry| entry.timestamp_field)
            .any(|number| u64::from(number) == field)
    }

    /// Look up a kind by its fully-qualified protobuf name.
    pub fn from_type_name(type_name: &str) -> Option<Self> {
        ENTRIES
            .iter()
            .find(|entry| entry.type_name == type_name)
            .map(|entry| entry.kind)
    }

    /// Look up a kind by its short name.
    pub fn from_name(name: &str) -> Option<Self> {
        ENTRIES
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.kind)
    }

    /// Infer the kind from a file name infix.
    ///
    /// Only the final path component is examined. The first entry whose
    /// infix occurs in the name wins, so a name carrying several markers
    /// resolves in table order.
    pub fn from_file_name(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_string_lossy();
        ENTRIES
            .iter()
            .find(|entry| file_name.contains(entry.file_infix))
            .map(|entry| entry.kind)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MessageKind {
    type Err = MessageError;

    /// Accepts either the short name or the fully-qualified type name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
            .or_else(|| Self::from_type_name(s))
            .ok_or_else(|| MessageError::UnknownKind(s.to_string()))
    }
}
