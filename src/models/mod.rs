//! Data models for chat documents and the reconciled thread list.
//!
//! This module defines the data structures used throughout the crate:
//!
//! - [`ConversationRecord`] - 1:1 conversation documents
//! - [`GroupRecord`] - multi-party group documents
//! - [`MessageRecord`] - messages stored under either kind of thread
//! - [`ChatThread`] - one row of the reconciled chat list
//! - [`Participant`] - a user acting on chats
//!
//! Documents use serde with custom deserializers (timestamps, document IDs, null defaults)
//! from the `parsers::deserializers` module, so every optional field is resolved once at
//! the boundary.

pub mod conversation;
pub mod group;
pub mod message;
pub mod participant;
pub mod thread;

pub use conversation::ConversationRecord;
pub use group::GroupRecord;
pub use message::{Attachment, MessageRecord, MessageStatus, sort_messages};
pub use participant::Participant;
pub use thread::{ChatThread, DirectThread};
