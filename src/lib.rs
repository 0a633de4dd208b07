//! HACCP Chat - reconcile live chat snapshots into one thread list
//!
//! The compliance suite's chat screen watches two document collections (1:1 conversations and
//! groups) and shows them as a single list. This library provides:
//!
//! - Typed chat documents with defaulting applied once at deserialization
//! - The reconciler: at most one thread per participant pair, newest activity first
//! - Live-sync interfaces, an in-process store and the controller that recombines snapshots
//! - Chat actions: starting a direct chat, posting messages, marking threads read
//! - A local snapshot directory format and a CLI over it
//!
//! # Example
//!
//! ```
//! use chrono::DateTime;
//! use haccp_chat::models::{ConversationRecord, GroupRecord};
//! use haccp_chat::reconcile;
//!
//! let mut stale = ConversationRecord::new("doc1", "U1", "U2");
//! stale.last_message_time = DateTime::from_timestamp_millis(100);
//! let mut fresh = ConversationRecord::new("doc2", "U2", "U1");
//! fresh.last_message_time = DateTime::from_timestamp_millis(200);
//! let group = GroupRecord::new("g1", "Line 2", vec!["U1".into(), "U3".into()]);
//!
//! let threads = reconcile(&[stale, fresh], &[group], "U1");
//! let ids: Vec<&str> = threads.iter().map(|t| t.id()).collect();
//! assert_eq!(ids, ["doc2", "g1"]);
//! ```

pub mod chat;
pub mod cli;
pub mod filters;
pub mod models;
pub mod parsers;
pub mod reconciler;
pub mod sync;
pub mod utils;

// Re-export commonly used types
pub use chat::{StartChat, mark_read, send_message, start_direct_chat};
pub use models::{ChatThread, ConversationRecord, GroupRecord, MessageRecord, Participant};
pub use reconciler::{Reconciliation, derive_pair_key, reconcile, reconcile_with_report};
pub use sync::{ChatListController, DocumentStore, LiveSync, MemoryStore, Subscription};
