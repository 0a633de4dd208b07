//! Interfaces to the document backend: live snapshot delivery and document writes.

use anyhow::Result;

use crate::models::{ConversationRecord, GroupRecord, MessageRecord};

/// Receives a complete, authoritative snapshot of the matching documents
pub type SnapshotCallback<T> = Box<dyn FnMut(Vec<T>)>;

/// Live-sync delivery: each watch reports the full matching set immediately and again after
/// every change, addition or removal. Snapshots replace, they never describe a diff.
pub trait LiveSync {
    /// Watch every conversation whose `participants` contain `participant`
    fn watch_conversations(
        &self,
        participant: &str,
        on_snapshot: SnapshotCallback<ConversationRecord>,
    ) -> Subscription;

    /// Watch every group whose `members` contain `member`
    fn watch_groups(
        &self,
        member: &str,
        on_snapshot: SnapshotCallback<GroupRecord>,
    ) -> Subscription;
}

/// Document reads and writes used by chat actions
pub trait DocumentStore {
    /// First conversation whose canonical pair key equals `key`
    fn find_conversation_by_key(&self, key: &str) -> Result<Option<ConversationRecord>>;

    fn conversation(&self, id: &str) -> Result<Option<ConversationRecord>>;

    fn group(&self, id: &str) -> Result<Option<GroupRecord>>;

    /// Fails if a document with the same ID already exists
    fn create_conversation(&self, record: ConversationRecord) -> Result<()>;

    /// Replaces the stored conversation with the same ID
    fn update_conversation(&self, record: ConversationRecord) -> Result<()>;

    /// Replaces the stored group with the same ID
    fn update_group(&self, record: GroupRecord) -> Result<()>;

    fn add_message(&self, thread_id: &str, message: MessageRecord) -> Result<()>;

    /// Messages of a thread in insertion order
    fn messages(&self, thread_id: &str) -> Result<Vec<MessageRecord>>;
}

/// Handle for an active watch; unsubscribes on [`Subscription::unsubscribe`] or drop
///
/// After unsubscribing, the watch's callback is never invoked again.
#[must_use = "dropping a Subscription cancels the watch"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self { cancel: Some(Box::new(cancel)) }
    }

    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("active", &self.is_active()).finish()
    }
}
