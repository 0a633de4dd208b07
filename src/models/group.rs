use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Multi-party thread document, identified by its own document ID
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    #[serde(deserialize_with = "crate::parsers::deserializers::deserialize_document_id")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "crate::parsers::deserializers::deserialize_null_default")]
    pub members: Vec<String>,
    #[serde(
        default,
        deserialize_with = "crate::parsers::deserializers::deserialize_null_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub member_names: BTreeMap<String, String>,
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
    #[serde(default)]
    pub created_by: String,
    #[serde(
        default,
        deserialize_with = "crate::parsers::deserializers::deserialize_lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl GroupRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, members: Vec<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            members,
            member_names: BTreeMap::new(),
            last_message: None,
            last_message_time: None,
            last_message_sender: None,
            unread_count: BTreeMap::new(),
            created_by: String::new(),
            created_at: None,
        }
    }

    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m == user_id)
    }
}
