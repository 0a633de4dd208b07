use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ConversationRecord, GroupRecord};

/// A 1:1 conversation that survived pair-key de-duplication
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectThread {
    /// Canonical pair key this thread was bucketed under
    pub key: String,
    /// The participant that is not the viewer
    pub peer_id: String,
    #[serde(flatten)]
    pub record: ConversationRecord,
}

impl DirectThread {
    pub fn new(key: String, record: ConversationRecord, viewer: &str) -> Self {
        let peer_id = record
            .participants
            .iter()
            .find(|p| p.as_str() != viewer)
            .or_else(|| record.participants.first())
            .cloned()
            .unwrap_or_default();
        Self { key, peer_id, record }
    }
}

/// One row of the reconciled chat list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChatThread {
    Direct(DirectThread),
    Group(GroupRecord),
}

impl ChatThread {
    pub fn id(&self) -> &str {
        match self {
            ChatThread::Direct(direct) => &direct.record.id,
            ChatThread::Group(group) => &group.id,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            ChatThread::Direct(_) => "direct",
            ChatThread::Group(_) => "group",
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, ChatThread::Group(_))
    }

    pub fn last_message_time(&self) -> Option<DateTime<Utc>> {
        match self {
            ChatThread::Direct(direct) => direct.record.last_message_time,
            ChatThread::Group(group) => group.last_message_time,
        }
    }

    pub fn last_message(&self) -> Option<&str> {
        match self {
            ChatThread::Direct(direct) => direct.record.last_message.as_deref(),
            ChatThread::Group(group) => group.last_message.as_deref(),
        }
    }

    pub fn last_message_sender(&self) -> Option<&str> {
        match self {
            ChatThread::Direct(direct) => direct.record.last_message_sender.as_deref(),
            ChatThread::Group(group) => group.last_message_sender.as_deref(),
        }
    }

    /// Peer display name (falling back to the peer ID) or the group name
    pub fn title(&self) -> String {
        match self {
            ChatThread::Direct(direct) => direct
                .record
                .participant_names
                .get(&direct.peer_id)
                .filter(|name| !name.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| direct.peer_id.clone()),
            ChatThread::Group(group) => group.name.clone(),
        }
    }

    pub fn unread_for(&self, viewer: &str) -> u32 {
        let counters = match self {
            ChatThread::Direct(direct) => &direct.record.unread_count,
            ChatThread::Group(group) => &group.unread_count,
        };
        counters.get(viewer).copied().unwrap_or(0)
    }

    /// The people `viewer` is talking to, with their display names when known
    ///
    /// The peer of a direct thread (the viewer itself in a self-chat), or every group member
    /// except the viewer.
    pub fn counterparts<'a>(&'a self, viewer: &str) -> Vec<(&'a str, Option<&'a str>)> {
        match self {
            ChatThread::Direct(direct) => {
                let name = direct.record.participant_names.get(&direct.peer_id);
                vec![(direct.peer_id.as_str(), name.map(String::as_str))]
            }
            ChatThread::Group(group) => group
                .members
                .iter()
                .filter(|member| member.as_str() != viewer)
                .map(|member| (member.as_str(), group.member_names.get(member).map(String::as_str)))
                .collect(),
        }
    }
}
