//! In-process document store with live snapshot delivery.
//!
//! Single-threaded (`Rc`/`RefCell`): every write re-delivers the full filtered snapshot to each
//! active watcher before returning. A watcher callback may write to the store again; the
//! resulting change is delivered after the current round instead of re-entering callbacks.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use anyhow::{Result, bail};
use tracing::debug;

use super::live::{DocumentStore, LiveSync, SnapshotCallback, Subscription};
use crate::models::{ConversationRecord, GroupRecord, MessageRecord};
use crate::reconciler::canonical_key;

struct Watcher<T> {
    id: u64,
    filter: String,
    active: Rc<Cell<bool>>,
    callback: Rc<RefCell<SnapshotCallback<T>>>,
}

struct Delivery<T> {
    active: Rc<Cell<bool>>,
    callback: Rc<RefCell<SnapshotCallback<T>>>,
    snapshot: Vec<T>,
}

impl<T> Delivery<T> {
    fn run(self) {
        if self.active.get() {
            let mut callback = self.callback.borrow_mut();
            (*callback)(self.snapshot);
        }
    }
}

#[derive(Default)]
struct StoreInner {
    conversations: Vec<ConversationRecord>,
    groups: Vec<GroupRecord>,
    messages: HashMap<String, Vec<MessageRecord>>,
    conversation_watchers: Vec<Watcher<ConversationRecord>>,
    group_watchers: Vec<Watcher<GroupRecord>>,
    next_watcher_id: u64,
    conversations_dirty: bool,
    groups_dirty: bool,
    delivering: bool,
}

impl StoreInner {
    fn conversation_snapshot(&self, participant: &str) -> Vec<ConversationRecord> {
        self.conversations.iter().filter(|c| c.has_participant(participant)).cloned().collect()
    }

    fn group_snapshot(&self, member: &str) -> Vec<GroupRecord> {
        self.groups.iter().filter(|g| g.has_member(member)).cloned().collect()
    }

    fn has_document(&self, id: &str) -> bool {
        self.conversations.iter().any(|c| c.id == id) || self.groups.iter().any(|g| g.id == id)
    }

    fn next_id(&mut self) -> u64 {
        self.next_watcher_id += 1;
        self.next_watcher_id
    }
}

/// Shared handle to an in-memory document set; clones see the same documents
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<StoreInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshots(
        conversations: Vec<ConversationRecord>,
        groups: Vec<GroupRecord>,
    ) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.borrow_mut();
            inner.conversations = conversations;
            inner.groups = groups;
        }
        store
    }

    /// Insert a conversation without any uniqueness check
    ///
    /// This is how a concurrent writer can leave two documents for one participant pair.
    pub fn insert_conversation(&self, record: ConversationRecord) {
        self.inner.borrow_mut().conversations.push(record);
        self.changed(true, false);
    }

    pub fn insert_group(&self, record: GroupRecord) {
        self.inner.borrow_mut().groups.push(record);
        self.changed(false, true);
    }

    pub fn insert_messages(&self, thread_id: &str, messages: Vec<MessageRecord>) {
        self.inner.borrow_mut().messages.entry(thread_id.to_string()).or_default().extend(messages);
    }

    /// Remove a conversation or group document; returns whether anything was removed
    pub fn remove(&self, id: &str) -> bool {
        let (conversations, groups) = {
            let mut inner = self.inner.borrow_mut();
            let conversations_before = inner.conversations.len();
            let groups_before = inner.groups.len();
            inner.conversations.retain(|c| c.id != id);
            inner.groups.retain(|g| g.id != id);
            (inner.conversations.len() != conversations_before, inner.groups.len() != groups_before)
        };
        if conversations || groups {
            self.changed(conversations, groups);
        }
        conversations || groups
    }

    pub fn conversations(&self) -> Vec<ConversationRecord> {
        self.inner.borrow().conversations.clone()
    }

    pub fn groups(&self) -> Vec<GroupRecord> {
        self.inner.borrow().groups.clone()
    }

    /// Number of live watches across both collections
    pub fn watcher_count(&self) -> usize {
        let inner = self.inner.borrow();
        inner.conversation_watchers.iter().filter(|w| w.active.get()).count()
            + inner.group_watchers.iter().filter(|w| w.active.get()).count()
    }

    /// Run a new watcher's first delivery, then flush any write it made
    fn deliver_initial<T>(&self, delivery: Delivery<T>) {
        let nested = std::mem::replace(&mut self.inner.borrow_mut().delivering, true);
        delivery.run();
        if !nested {
            self.inner.borrow_mut().delivering = false;
            self.changed(false, false);
        }
    }

    /// Mark collections as changed and deliver fresh snapshots until nothing is pending
    fn changed(&self, conversations: bool, groups: bool) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.conversations_dirty |= conversations;
            inner.groups_dirty |= groups;
            if inner.delivering {
                // The outer delivery loop picks this change up
                return;
            }
            inner.delivering = true;
        }

        loop {
            let (conversation_deliveries, group_deliveries) = {
                let mut inner = self.inner.borrow_mut();
                if !inner.conversations_dirty && !inner.groups_dirty {
                    inner.delivering = false;
                    break;
                }
                let conversations = std::mem::take(&mut inner.conversations_dirty);
                let groups = std::mem::take(&mut inner.groups_dirty);
                inner.conversation_watchers.retain(|w| w.active.get());
                inner.group_watchers.retain(|w| w.active.get());

                let conversation_deliveries: Vec<_> = if conversations {
                    inner
                        .conversation_watchers
                        .iter()
                        .map(|w| Delivery {
                            active: w.active.clone(),
                            callback: w.callback.clone(),
                            snapshot: inner.conversation_snapshot(&w.filter),
                        })
                        .collect()
                } else {
                    Vec::new()
                };
                let group_deliveries: Vec<_> = if groups {
                    inner
                        .group_watchers
                        .iter()
                        .map(|w| Delivery {
                            active: w.active.clone(),
                            callback: w.callback.clone(),
                            snapshot: inner.group_snapshot(&w.filter),
                        })
                        .collect()
                } else {
                    Vec::new()
                };
                (conversation_deliveries, group_deliveries)
            };

            conversation_deliveries.into_iter().for_each(Delivery::run);
            group_deliveries.into_iter().for_each(Delivery::run);
        }
    }
}

fn cancel_watch(
    inner: &Weak<RefCell<StoreInner>>,
    active: &Cell<bool>,
    id: u64,
    collection: &'static str,
) {
    active.set(false);
    // If the store is busy the inactive watcher is pruned on the next delivery round
    if let Some(inner) = inner.upgrade()
        && let Ok(mut inner) = inner.try_borrow_mut()
    {
        inner.conversation_watchers.retain(|w| w.id != id);
        inner.group_watchers.retain(|w| w.id != id);
    }
    debug!(watch = id, collection, "unsubscribed");
}

impl LiveSync for MemoryStore {
    fn watch_conversations(
        &self,
        participant: &str,
        on_snapshot: SnapshotCallback<ConversationRecord>,
    ) -> Subscription {
        let active = Rc::new(Cell::new(true));
        let callback = Rc::new(RefCell::new(on_snapshot));
        let (id, initial) = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id();
            inner.conversation_watchers.push(Watcher {
                id,
                filter: participant.to_string(),
                active: active.clone(),
                callback: callback.clone(),
            });
            (id, inner.conversation_snapshot(participant))
        };
        debug!(watch = id, participant, "watching conversations");

        self.deliver_initial(Delivery { active: active.clone(), callback, snapshot: initial });

        let inner = Rc::downgrade(&self.inner);
        Subscription::new(move || cancel_watch(&inner, &active, id, "conversations"))
    }

    fn watch_groups(
        &self,
        member: &str,
        on_snapshot: SnapshotCallback<GroupRecord>,
    ) -> Subscription {
        let active = Rc::new(Cell::new(true));
        let callback = Rc::new(RefCell::new(on_snapshot));
        let (id, initial) = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id();
            inner.group_watchers.push(Watcher {
                id,
                filter: member.to_string(),
                active: active.clone(),
                callback: callback.clone(),
            });
            (id, inner.group_snapshot(member))
        };
        debug!(watch = id, member, "watching groups");

        self.deliver_initial(Delivery { active: active.clone(), callback, snapshot: initial });

        let inner = Rc::downgrade(&self.inner);
        Subscription::new(move || cancel_watch(&inner, &active, id, "groups"))
    }
}

impl DocumentStore for MemoryStore {
    fn find_conversation_by_key(&self, key: &str) -> Result<Option<ConversationRecord>> {
        let inner = self.inner.borrow();
        Ok(inner
            .conversations
            .iter()
            .find(|c| canonical_key(c).as_deref() == Some(key))
            .cloned())
    }

    fn conversation(&self, id: &str) -> Result<Option<ConversationRecord>> {
        Ok(self.inner.borrow().conversations.iter().find(|c| c.id == id).cloned())
    }

    fn group(&self, id: &str) -> Result<Option<GroupRecord>> {
        Ok(self.inner.borrow().groups.iter().find(|g| g.id == id).cloned())
    }

    fn create_conversation(&self, record: ConversationRecord) -> Result<()> {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.has_document(&record.id) {
                bail!("Document already exists: {}", record.id);
            }
            inner.conversations.push(record);
        }
        self.changed(true, false);
        Ok(())
    }

    fn update_conversation(&self, record: ConversationRecord) -> Result<()> {
        {
            let mut inner = self.inner.borrow_mut();
            let Some(slot) = inner.conversations.iter_mut().find(|c| c.id == record.id) else {
                bail!("Unknown conversation: {}", record.id);
            };
            *slot = record;
        }
        self.changed(true, false);
        Ok(())
    }

    fn update_group(&self, record: GroupRecord) -> Result<()> {
        {
            let mut inner = self.inner.borrow_mut();
            let Some(slot) = inner.groups.iter_mut().find(|g| g.id == record.id) else {
                bail!("Unknown group: {}", record.id);
            };
            *slot = record;
        }
        self.changed(false, true);
        Ok(())
    }

    fn add_message(&self, thread_id: &str, message: MessageRecord) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if !inner.has_document(thread_id) {
            bail!("Unknown thread: {}", thread_id);
        }
        inner.messages.entry(thread_id.to_string()).or_default().push(message);
        Ok(())
    }

    fn messages(&self, thread_id: &str) -> Result<Vec<MessageRecord>> {
        Ok(self.inner.borrow().messages.get(thread_id).cloned().unwrap_or_default())
    }
}
