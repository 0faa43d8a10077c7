//! Streaming types for chat completions

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Events reconstructed from a chat completion stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    /// Server assigned the session this exchange belongs to
    #[serde(rename = "session_assigned")]
    SessionAssigned { session_id: String },

    /// Server assigned the id of the assistant message being generated
    #[serde(rename = "message_assigned")]
    MessageAssigned { message_id: String },

    /// Text delta
    #[serde(rename = "text_delta")]
    TextDelta { text: String },

    /// Server signalled the end of the answer
    #[serde(rename = "finished")]
    Finished,

    /// Fragment that did not parse as a JSON object (diagnostic only)
    #[serde(rename = "parse_skipped")]
    ParseSkipped { raw_fragment: String },
}

/// One frame of the completion stream
///
/// Every field is optional; absence means "not part of this update", not
/// "cleared". Fields with an unexpected JSON type count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireRecord {
    pub session_id: Option<String>,
    pub message_id: Option<String>,
    pub text: Option<String>,
    pub finish: bool,
}

impl WireRecord {
    /// Extract a record from a parsed JSON value
    ///
    /// Returns `None` unless the value is a JSON object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let string_field = |key: &str| {
            object
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        Some(Self {
            session_id: string_field("sessionId"),
            message_id: string_field("messageId"),
            text: string_field("text"),
            finish: object.get("finish").and_then(|v| v.as_bool()) == Some(true),
        })
    }

    /// Parse a candidate fragment
    pub fn parse(fragment: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(fragment).ok()?;
        Self::from_value(&value)
    }
}

/// Counters kept by the assembler for logging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblerStats {
    pub bytes_received: usize,
    pub lines_processed: usize,
    pub records_parsed: usize,
    pub fragments_skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_record() {
        let record =
            WireRecord::parse(r#"{"sessionId":"s1","messageId":"m1","text":"hi","finish":false}"#)
                .unwrap();
        assert_eq!(record.session_id.as_deref(), Some("s1"));
        assert_eq!(record.message_id.as_deref(), Some("m1"));
        assert_eq!(record.text.as_deref(), Some("hi"));
        assert!(!record.finish);
    }

    #[test]
    fn test_parse_rejects_non_objects() {
        assert!(WireRecord::parse("42").is_none());
        assert!(WireRecord::parse(r#"["text"]"#).is_none());
        assert!(WireRecord::parse("not json").is_none());
        assert!(WireRecord::parse("").is_none());
    }

    #[test]
    fn test_wrong_types_treated_as_absent() {
        let record = WireRecord::parse(r#"{"sessionId":7,"text":null,"finish":"true"}"#).unwrap();
        assert_eq!(record, WireRecord::default());
    }

    #[test]
    fn test_event_serializes_tagged() {
        let json = serde_json::to_string(&StreamEvent::TextDelta {
            text: "A".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"text_delta","text":"A"}"#);

        let json = serde_json::to_string(&StreamEvent::Finished).unwrap();
        assert_eq!(json, r#"{"type":"finished"}"#);
    }
}
