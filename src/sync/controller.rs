//! Chat list controller: two single-slot snapshot caches recombined on every delivery.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::debug;

use super::live::{LiveSync, Subscription};
use crate::models::{ChatThread, ConversationRecord, GroupRecord};
use crate::reconciler::reconcile;

/// Called with the fresh thread list after every refresh
pub type ThreadListener = Box<dyn FnMut(&[ChatThread])>;

struct ChatListState {
    viewer: String,
    conversations: Option<Vec<ConversationRecord>>,
    groups: Option<Vec<GroupRecord>>,
    threads: Vec<ChatThread>,
    refreshes: usize,
    listener: Option<ThreadListener>,
}

impl ChatListState {
    /// Re-run reconciliation over whatever each slot currently holds
    ///
    /// A stream that has not delivered yet counts as empty.
    fn refresh(&mut self) {
        self.threads = reconcile(
            self.conversations.as_deref().unwrap_or_default(),
            self.groups.as_deref().unwrap_or_default(),
            &self.viewer,
        );
        self.refreshes += 1;
        debug!(viewer = %self.viewer, threads = self.threads.len(), "chat list refreshed");

        if let Some(listener) = self.listener.as_mut() {
            listener(&self.threads);
        }
    }
}

/// Keeps the chat list of one viewer in sync with a live source
///
/// Each stream's callback overwrites its own slot wholesale and re-runs reconciliation
/// synchronously. The streams may deliver in any order; the list is always the merge of the
/// latest snapshot from each. Dropping the controller unsubscribes both streams.
pub struct ChatListController {
    state: Rc<RefCell<ChatListState>>,
    subscriptions: Vec<Subscription>,
}

impl ChatListController {
    pub fn attach<S: LiveSync + ?Sized>(source: &S, viewer: &str) -> Self {
        Self::build(source, viewer, None)
    }

    /// Like [`ChatListController::attach`], also notifying `listener` after each refresh
    pub fn with_listener<S: LiveSync + ?Sized>(
        source: &S,
        viewer: &str,
        listener: impl FnMut(&[ChatThread]) + 'static,
    ) -> Self {
        Self::build(source, viewer, Some(Box::new(listener)))
    }

    fn build<S: LiveSync + ?Sized>(
        source: &S,
        viewer: &str,
        listener: Option<ThreadListener>,
    ) -> Self {
        let state = Rc::new(RefCell::new(ChatListState {
            viewer: viewer.to_string(),
            conversations: None,
            groups: None,
            threads: Vec::new(),
            refreshes: 0,
            listener,
        }));

        let weak: Weak<RefCell<ChatListState>> = Rc::downgrade(&state);
        let conversations = source.watch_conversations(
            viewer,
            Box::new(move |snapshot| {
                if let Some(state) = weak.upgrade() {
                    let mut state = state.borrow_mut();
                    state.conversations = Some(snapshot);
                    state.refresh();
                }
            }),
        );

        let weak = Rc::downgrade(&state);
        let groups = source.watch_groups(
            viewer,
            Box::new(move |snapshot| {
                if let Some(state) = weak.upgrade() {
                    let mut state = state.borrow_mut();
                    state.groups = Some(snapshot);
                    state.refresh();
                }
            }),
        );

        Self { state, subscriptions: vec![conversations, groups] }
    }

    /// Current reconciled thread list
    pub fn threads(&self) -> Vec<ChatThread> {
        self.state.borrow().threads.clone()
    }

    /// Number of reconciliation passes run so far
    pub fn refresh_count(&self) -> usize {
        self.state.borrow().refreshes
    }

    pub fn is_attached(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Unsubscribe both streams; the last thread list stays readable
    pub fn detach(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
    }
}

impl std::fmt::Debug for ChatListController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ChatListController")
            .field("viewer", &state.viewer)
            .field("threads", &state.threads.len())
            .field("refreshes", &state.refreshes)
            .field("attached", &self.is_attached())
            .finish()
    }
}
