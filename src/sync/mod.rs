//! Live-sync plumbing around the reconciler
//!
//! # Error Handling Strategy
//!
//! - **Delivery**: Watch callbacks cannot fail. Each delivery is a complete snapshot that
//!   replaces the previous one, so a missed delivery is repaired by the next.
//! - **Writes**: [`DocumentStore`] operations return `anyhow::Result`; writing to an unknown
//!   document or creating an existing ID is an error.
//! - **Loading**: Missing or corrupted snapshot files load as empty collections with a warning.

pub mod controller;
pub mod live;
pub mod loader;
pub mod memory;

pub use controller::{ChatListController, ThreadListener};
pub use live::{DocumentStore, LiveSync, SnapshotCallback, Subscription};
pub use loader::{
    CONVERSATIONS_FILE, DataDirSnapshot, GROUPS_FILE, MESSAGES_DIR, MessageLog,
    discover_message_logs, load_data_dir, load_thread_messages, open_store,
};
pub use memory::MemoryStore;
