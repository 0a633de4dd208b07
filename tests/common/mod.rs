//! Shared test utilities for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::Path;

use haccp_chat::models::{ConversationRecord, GroupRecord};
use haccp_chat::utils::encode_thread_id;
use serde_json::{Value, json};
use tempfile::TempDir;

/// Builder for test snapshot directories
pub struct ChatDirBuilder {
    temp_dir: TempDir,
}

impl ChatDirBuilder {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self { temp_dir }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write conversations.jsonl with raw content
    pub fn with_conversations_raw(self, content: &str) -> Self {
        fs::write(self.temp_dir.path().join("conversations.jsonl"), content)
            .expect("Failed to write conversations.jsonl");
        self
    }

    pub fn with_conversations(self, docs: &[ConversationDocBuilder]) -> Self {
        let content = join_lines(docs.iter().map(ConversationDocBuilder::to_json));
        self.with_conversations_raw(&content)
    }

    /// Write groups.jsonl with raw content
    pub fn with_groups_raw(self, content: &str) -> Self {
        fs::write(self.temp_dir.path().join("groups.jsonl"), content)
            .expect("Failed to write groups.jsonl");
        self
    }

    pub fn with_groups(self, docs: &[GroupDocBuilder]) -> Self {
        let content = join_lines(docs.iter().map(GroupDocBuilder::to_json));
        self.with_groups_raw(&content)
    }

    /// Write the message log of one thread
    pub fn with_messages(self, thread_id: &str, messages: &[MessageDocBuilder]) -> Self {
        let dir = self.temp_dir.path().join("messages");
        fs::create_dir_all(&dir).expect("Failed to create messages dir");
        let content = join_lines(messages.iter().map(MessageDocBuilder::to_json));
        fs::write(dir.join(encode_thread_id(thread_id)), content)
            .expect("Failed to write message log");
        self
    }

    pub fn build(self) -> TempDir {
        self.temp_dir
    }
}

impl Default for ChatDirBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn join_lines(lines: impl Iterator<Item = String>) -> String {
    let mut content = lines.collect::<Vec<_>>().join("\n");
    content.push('\n');
    content
}

/// Builder for conversations.jsonl documents
pub struct ConversationDocBuilder {
    doc: Value,
}

impl ConversationDocBuilder {
    pub fn new(id: &str, first: &str, second: &str) -> Self {
        Self { doc: json!({ "id": id, "participants": [first, second] }) }
    }

    /// Epoch milliseconds
    pub fn last_message_time(mut self, millis: i64) -> Self {
        self.doc["lastMessageTime"] = json!(millis);
        self
    }

    pub fn null_last_message_time(mut self) -> Self {
        self.doc["lastMessageTime"] = Value::Null;
        self
    }

    pub fn participants_key(mut self, key: &str) -> Self {
        self.doc["participantsKey"] = json!(key);
        self
    }

    pub fn participants(mut self, ids: &[&str]) -> Self {
        self.doc["participants"] = json!(ids);
        self
    }

    pub fn without_participants(mut self) -> Self {
        if let Some(doc) = self.doc.as_object_mut() {
            doc.remove("participants");
        }
        self
    }

    pub fn name(mut self, participant: &str, name: &str) -> Self {
        self.doc["participantNames"][participant] = json!(name);
        self
    }

    pub fn preview(mut self, text: &str, sender: &str) -> Self {
        self.doc["lastMessage"] = json!(text);
        self.doc["lastMessageSender"] = json!(sender);
        self
    }

    pub fn unread(mut self, participant: &str, count: u32) -> Self {
        self.doc["unreadCount"][participant] = json!(count);
        self
    }

    pub fn to_json(&self) -> String {
        self.doc.to_string()
    }

    pub fn to_record(&self) -> ConversationRecord {
        serde_json::from_value(self.doc.clone()).expect("Invalid conversation document")
    }
}

/// Builder for groups.jsonl documents
pub struct GroupDocBuilder {
    doc: Value,
}

impl GroupDocBuilder {
    pub fn new(id: &str, name: &str, members: &[&str]) -> Self {
        let created_by = members.first().copied().unwrap_or_default();
        Self { doc: json!({ "id": id, "name": name, "members": members, "createdBy": created_by }) }
    }

    pub fn last_message_time(mut self, millis: i64) -> Self {
        self.doc["lastMessageTime"] = json!(millis);
        self
    }

    pub fn unread(mut self, member: &str, count: u32) -> Self {
        self.doc["unreadCount"][member] = json!(count);
        self
    }

    pub fn to_json(&self) -> String {
        self.doc.to_string()
    }

    pub fn to_record(&self) -> GroupRecord {
        serde_json::from_value(self.doc.clone()).expect("Invalid group document")
    }
}

/// Builder for message log documents
pub struct MessageDocBuilder {
    doc: Value,
}

impl MessageDocBuilder {
    pub fn new(id: &str, sender: &str, text: &str) -> Self {
        Self { doc: json!({ "id": id, "senderId": sender, "text": text }) }
    }

    pub fn timestamp(mut self, millis: i64) -> Self {
        self.doc["timestamp"] = json!(millis);
        self
    }

    pub fn sender_name(mut self, name: &str) -> Self {
        self.doc["senderName"] = json!(name);
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.doc["status"] = json!(status);
        self
    }

    pub fn to_json(&self) -> String {
        self.doc.to_string()
    }
}
