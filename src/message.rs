//! HL7v2 message data model.
//!
//! Every field is optional: messages cross serialization boundaries in
//! various states of enrichment, and a half-populated message is a normal
//! value, not an error. An absent field and a present-but-empty string are
//! distinct values and stay distinct through the codec.

use std::collections::BTreeMap;

/// String-to-string dictionary with individually nullable values.
///
/// Keys are unique and always present; values may be absent. `BTreeMap`
/// keeps the encoded byte stream deterministic (key order on the wire is
/// not significant, so sorted order is as good as any).
pub type LabelMap = BTreeMap<String, Option<String>>;

/// An HL7v2 message as it moves through a processing pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hl7v2Message {
    /// Resource identifier of the message.
    pub name: Option<String>,
    /// HL7v2 message type code (e.g. `ADT`, `ORU`).
    pub message_type: Option<String>,
    /// Creation timestamp, caller-formatted; treated as an opaque string.
    pub create_time: Option<String>,
    /// Send timestamp, caller-formatted; treated as an opaque string.
    pub send_time: Option<String>,
    /// Raw message payload. May be large; the codec does not chunk it.
    pub data: Option<String>,
    /// Sending facility identifier.
    pub send_facility: Option<String>,
    /// User labels attached to the message.
    pub labels: Option<LabelMap>,
    /// Structured parse of the payload, when one has been produced.
    pub parsed_data: Option<ParsedData>,
    /// Schematized (e.g. JSON) rendering of the payload.
    pub schematized_data: Option<String>,
}

impl Hl7v2Message {
    /// A message with every field absent.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Structured parse of an HL7v2 payload: the ordered segments of the
/// message, when parsing has run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedData {
    pub segments: Option<Vec<Segment>>,
}

/// One parsed HL7v2 segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segment {
    /// Three-letter segment identifier (e.g. `MSH`, `PID`).
    pub segment_id: Option<String>,
    /// Set ID distinguishing repeated segments of the same type.
    pub set_id: Option<String>,
    /// Field path to field value, values individually nullable.
    pub fields: Option<LabelMap>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_all_absent() {
        let m = Hl7v2Message::new();
        assert_eq!(m, Hl7v2Message::default());
        assert!(m.name.is_none());
        assert!(m.labels.is_none());
        assert!(m.parsed_data.is_none());
    }

    #[test]
    fn test_absent_and_empty_are_distinct() {
        let absent = Hl7v2Message::new();
        let empty = Hl7v2Message {
            name: Some(String::new()),
            ..Hl7v2Message::new()
        };
        assert_ne!(absent, empty);
    }
}
