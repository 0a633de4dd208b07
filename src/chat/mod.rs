//! Chat actions that write through a [`DocumentStore`](crate::sync::DocumentStore)
//!
//! Actions validate their input and fail with `anyhow` errors; they never touch the
//! reconciled list directly. Watchers of the store see the effect on their next snapshot.

pub mod messaging;
pub mod start;

pub use messaging::{mark_read, send_message};
pub use start::{StartChat, start_direct_chat};
