//! Thread list reconciliation.
//!
//! Turns one conversation snapshot and one group snapshot into the chat list: at most one
//! direct thread per participant pair, groups passed through, everything ordered by recency.

use std::collections::HashMap;

use tracing::debug;

use super::pair_key::canonical_key;
use crate::models::{ChatThread, ConversationRecord, DirectThread, GroupRecord};

/// Output of one reconciliation pass plus what it discarded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub threads: Vec<ChatThread>,
    /// Conversation records that lost to a more recent record with the same pair key
    pub duplicates_dropped: usize,
    /// Conversation records without two participant IDs
    pub malformed_dropped: usize,
}

/// Build the chat list for `viewer`
///
/// Pure and total: same inputs give the same list, malformed records are left out, and
/// nothing here can fail. See [`reconcile_with_report`] for the drop counters.
///
/// # Ordering
///
/// Newest `lastMessageTime` first; threads without activity go last. Equal timestamps keep
/// their relative order: direct threads in order of first appearance of their pair key, then
/// groups in snapshot order.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use haccp_chat::models::ConversationRecord;
/// use haccp_chat::reconcile;
///
/// let mut older = ConversationRecord::new("doc1", "U1", "U2");
/// older.last_message_time = DateTime::from_timestamp_millis(100);
/// let mut newer = ConversationRecord::new("doc2", "U2", "U1");
/// newer.last_message_time = DateTime::from_timestamp_millis(200);
///
/// let threads = reconcile(&[older, newer], &[], "U1");
/// assert_eq!(threads.len(), 1);
/// assert_eq!(threads[0].id(), "doc2");
/// ```
pub fn reconcile(
    conversations: &[ConversationRecord],
    groups: &[GroupRecord],
    viewer: &str,
) -> Vec<ChatThread> {
    reconcile_with_report(conversations, groups, viewer).threads
}

/// [`reconcile`], also reporting how many conversation records were dropped and why
pub fn reconcile_with_report(
    conversations: &[ConversationRecord],
    groups: &[GroupRecord],
    viewer: &str,
) -> Reconciliation {
    let mut direct: Vec<DirectThread> = Vec::with_capacity(conversations.len());
    let mut slot_by_key: HashMap<String, usize> = HashMap::with_capacity(conversations.len());
    let mut duplicates_dropped = 0;
    let mut malformed_dropped = 0;

    for record in conversations {
        let Some(key) = canonical_key(record) else {
            debug!(id = %record.id, "dropping conversation without two participants");
            malformed_dropped += 1;
            continue;
        };

        match slot_by_key.get(&key).copied() {
            Some(slot) => {
                duplicates_dropped += 1;
                let current = &direct[slot].record;
                // None < Some(_), and `>=` lets the later record win a tie
                if record.last_message_time >= current.last_message_time {
                    debug!(key = %key, kept = %record.id, dropped = %current.id, "duplicate pair");
                    direct[slot] = DirectThread::new(key, record.clone(), viewer);
                } else {
                    debug!(key = %key, kept = %current.id, dropped = %record.id, "duplicate pair");
                }
            }
            None => {
                slot_by_key.insert(key.clone(), direct.len());
                direct.push(DirectThread::new(key, record.clone(), viewer));
            }
        }
    }

    let mut threads: Vec<ChatThread> = direct
        .into_iter()
        .map(ChatThread::Direct)
        .chain(groups.iter().cloned().map(ChatThread::Group))
        .collect();

    // Stable sort, newest first; Some(_) > None puts inactive threads last
    threads.sort_by(|a, b| b.last_message_time().cmp(&a.last_message_time()));

    Reconciliation { threads, duplicates_dropped, malformed_dropped }
}
