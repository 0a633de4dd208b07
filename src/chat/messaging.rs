use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::models::{MessageRecord, MessageStatus, Participant};
use crate::sync::DocumentStore;

/// Bump every counter except the sender's, adding entries for participants without one
fn bump_unread(counters: &mut BTreeMap<String, u32>, participants: &[String], sender: &str) {
    for participant in participants.iter().filter(|p| p.as_str() != sender) {
        let counter = counters.entry(participant.clone()).or_insert(0);
        *counter = counter.saturating_add(1);
    }
}

/// Post a message to a direct or group thread
///
/// Appends a `sent` message, then updates the thread's preview fields (`lastMessage`,
/// `lastMessageTime`, `lastMessageSender`) and increments the unread counter of every other
/// participant. The preview update is what moves the thread up the reconciled list.
///
/// # Errors
///
/// Returns an error if the text is blank, the thread does not exist, the sender is not part of
/// the thread, or the store fails.
pub fn send_message<S: DocumentStore + ?Sized>(
    store: &S,
    thread_id: &str,
    sender: &Participant,
    text: &str,
    now: DateTime<Utc>,
) -> Result<MessageRecord> {
    let text = text.trim();
    if text.is_empty() {
        bail!("Message text cannot be empty");
    }

    let message = MessageRecord {
        id: Uuid::new_v4().to_string(),
        text: text.to_string(),
        sender_id: sender.id.clone(),
        sender_name: sender.display_name().to_string(),
        timestamp: Some(now),
        status: MessageStatus::Sent,
        attachments: Vec::new(),
    };

    if let Some(mut conversation) = store.conversation(thread_id)? {
        if !conversation.has_participant(&sender.id) {
            bail!("{} is not a participant of conversation {}", sender.id, thread_id);
        }
        store.add_message(thread_id, message.clone())?;
        conversation.last_message = Some(message.text.clone());
        conversation.last_message_time = Some(now);
        conversation.last_message_sender = Some(sender.id.clone());
        bump_unread(&mut conversation.unread_count, &conversation.participants, &sender.id);
        store
            .update_conversation(conversation)
            .with_context(|| format!("Failed to update conversation {}", thread_id))?;
    } else if let Some(mut group) = store.group(thread_id)? {
        if !group.has_member(&sender.id) {
            bail!("{} is not a member of group {}", sender.id, thread_id);
        }
        store.add_message(thread_id, message.clone())?;
        group.last_message = Some(message.text.clone());
        group.last_message_time = Some(now);
        group.last_message_sender = Some(sender.id.clone());
        bump_unread(&mut group.unread_count, &group.members, &sender.id);
        store
            .update_group(group)
            .with_context(|| format!("Failed to update group {}", thread_id))?;
    } else {
        bail!("Unknown thread: {}", thread_id);
    }

    debug!(thread = thread_id, message = %message.id, "message sent");
    Ok(message)
}

/// Reset `viewer`'s unread counter on a thread, returning how many were unread
///
/// # Errors
///
/// Returns an error if the thread does not exist or the store fails.
pub fn mark_read<S: DocumentStore + ?Sized>(
    store: &S,
    thread_id: &str,
    viewer: &str,
) -> Result<u32> {
    if let Some(mut conversation) = store.conversation(thread_id)? {
        let previous = conversation.unread_count.insert(viewer.to_string(), 0).unwrap_or(0);
        if previous > 0 {
            store.update_conversation(conversation)?;
        }
        Ok(previous)
    } else if let Some(mut group) = store.group(thread_id)? {
        let previous = group.unread_count.insert(viewer.to_string(), 0).unwrap_or(0);
        if previous > 0 {
            store.update_group(group)?;
        }
        Ok(previous)
    } else {
        bail!("Unknown thread: {}", thread_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConversationRecord, GroupRecord};
    use crate::sync::MemoryStore;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(seconds, 0).unwrap()
    }

    #[test]
    fn test_send_updates_direct_preview_and_unread() {
        let store = MemoryStore::new();
        store.insert_conversation(ConversationRecord::new("c1", "u1", "u2"));

        let message = send_message(&store, "c1", &Participant::named("u1", "Ana"), " hi ", at(10))
            .unwrap();
        assert_eq!(message.text, "hi");
        assert_eq!(message.sender_name, "Ana");
        assert_eq!(message.status, MessageStatus::Sent);

        let record = store.conversation("c1").unwrap().unwrap();
        assert_eq!(record.last_message.as_deref(), Some("hi"));
        assert_eq!(record.last_message_time, Some(at(10)));
        assert_eq!(record.last_message_sender.as_deref(), Some("u1"));
        assert_eq!(record.unread_count.get("u2"), Some(&1));
        assert_eq!(record.unread_count.get("u1"), None);
        assert_eq!(store.messages("c1").unwrap().len(), 1);
    }

    #[test]
    fn test_send_to_group_bumps_all_other_members() {
        let store = MemoryStore::new();
        let members = vec!["u1".to_string(), "u2".to_string(), "u3".to_string()];
        store.insert_group(GroupRecord::new("g1", "Line", members));

        let sender = Participant::new("u2");
        send_message(&store, "g1", &sender, "one", at(1)).unwrap();
        send_message(&store, "g1", &sender, "two", at(2)).unwrap();

        let group = store.group("g1").unwrap().unwrap();
        assert_eq!(group.unread_count.get("u1"), Some(&2));
        assert_eq!(group.unread_count.get("u3"), Some(&2));
        assert_eq!(group.unread_count.get("u2"), None);
        assert_eq!(group.last_message.as_deref(), Some("two"));
    }

    #[test]
    fn test_send_rejects_bad_input() {
        let store = MemoryStore::new();
        store.insert_conversation(ConversationRecord::new("c1", "u1", "u2"));
        let outsider = Participant::new("u9");

        assert!(send_message(&store, "c1", &Participant::new("u1"), "   ", at(1)).is_err());
        assert!(send_message(&store, "c1", &outsider, "hi", at(1)).is_err());
        assert!(send_message(&store, "nope", &Participant::new("u1"), "hi", at(1)).is_err());
        assert!(store.messages("c1").unwrap().is_empty());
    }

    #[test]
    fn test_mark_read_resets_counter() {
        let store = MemoryStore::new();
        store.insert_conversation(ConversationRecord::new("c1", "u1", "u2"));
        send_message(&store, "c1", &Participant::new("u1"), "a", at(1)).unwrap();
        send_message(&store, "c1", &Participant::new("u1"), "b", at(2)).unwrap();

        assert_eq!(mark_read(&store, "c1", "u2").unwrap(), 2);
        assert_eq!(mark_read(&store, "c1", "u2").unwrap(), 0);
        let record = store.conversation("c1").unwrap().unwrap();
        assert_eq!(record.unread_count.get("u2"), Some(&0));
        assert!(mark_read(&store, "missing", "u2").is_err());
    }
}
