use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stored 1:1 conversation document
///
/// `participants_key` is absent on older documents; the reconciler derives it on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    #[serde(deserialize_with = "crate::parsers::deserializers::deserialize_document_id")]
    pub id: String,
    #[serde(default, deserialize_with = "crate::parsers::deserializers::deserialize_null_default")]
    pub participants: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants_key: Option<String>,
    #[serde(
        default,
        deserialize_with = "crate::parsers::deserializers::deserialize_null_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub participant_names: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    #[serde(
        default,
        deserialize_with = "crate::parsers::deserializers::deserialize_optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_message_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_sender: Option<String>,
    #[serde(
        default,
        deserialize_with = "crate::parsers::deserializers::deserialize_unread_counts",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub unread_count: BTreeMap<String, u32>,
    #[serde(
        default,
        deserialize_with = "crate::parsers::deserializers::deserialize_lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl ConversationRecord {
    /// Bare record with the given participants and nothing else set
    pub fn new(id: impl Into<String>, first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            participants: vec![first.into(), second.into()],
            participants_key: None,
            participant_names: BTreeMap::new(),
            last_message: None,
            last_message_time: None,
            last_message_sender: None,
            unread_count: BTreeMap::new(),
            created_at: None,
        }
    }

    /// The two participant identifiers, if the record carries two non-empty ones
    pub fn pair(&self) -> Option<(&str, &str)> {
        match self.participants.as_slice() {
            [a, b] if !a.trim().is_empty() && !b.trim().is_empty() => Some((a, b)),
            _ => None,
        }
    }

    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p == user_id)
    }
}
