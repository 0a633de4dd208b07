use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    Sent,
    Delivered,
    Read,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// A message document stored under a conversation or group
///
/// `timestamp` is `None` while a server-assigned time is still pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    #[serde(deserialize_with = "crate::parsers::deserializers::deserialize_document_id")]
    pub id: String,
    #[serde(default)]
    pub text: String,
    pub sender_id: String,
    #[serde(default)]
    pub sender_name: String,
    #[serde(
        default,
        deserialize_with = "crate::parsers::deserializers::deserialize_optional_timestamp"
    )]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "crate::parsers::deserializers::deserialize_null_default")]
    pub status: MessageStatus,
    #[serde(
        default,
        deserialize_with = "crate::parsers::deserializers::deserialize_null_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub attachments: Vec<Attachment>,
}

/// Oldest first; pending messages (no timestamp yet) go last in arrival order
pub fn sort_messages(messages: &mut [MessageRecord]) {
    messages.sort_by(|a, b| match (a.timestamp, b.timestamp) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: &str, timestamp: Option<i64>) -> MessageRecord {
        MessageRecord {
            id: id.to_string(),
            text: format!("text {}", id),
            sender_id: "u1".to_string(),
            sender_name: "Ana".to_string(),
            timestamp: timestamp.and_then(DateTime::from_timestamp_millis),
            status: MessageStatus::Sent,
            attachments: Vec::new(),
        }
    }

    #[test]
    fn test_sort_messages_pending_last() {
        let mut messages = vec![
            message("pending", None),
            message("late", Some(3000)),
            message("early", Some(1000)),
        ];
        sort_messages(&mut messages);

        let ids: Vec<&str> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late", "pending"]);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&MessageStatus::Delivered).unwrap();
        assert_eq!(json, r#""delivered""#);
    }

    #[test]
    fn test_attachment_type_field() {
        let json = r#"{"type":"image","url":"https://cdn/x.png","name":"x.png","size":12,"mimeType":"image/png"}"#;
        let attachment: Attachment = serde_json::from_str(json).unwrap();
        assert_eq!(attachment.kind, "image");
        assert_eq!(attachment.mime_type.as_deref(), Some("image/png"));
    }
}
