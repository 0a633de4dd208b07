//! Loading a local data directory into snapshots and a [`MemoryStore`].
//!
//! The directory stands in for the document backend:
//!
//! ```text
//! <data-dir>/
//!   conversations.jsonl
//!   groups.jsonl
//!   messages/<encoded thread id>.jsonl
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tracing::{info, warn};
use walkdir::WalkDir;

use super::memory::MemoryStore;
use crate::models::{ConversationRecord, GroupRecord, MessageRecord, sort_messages};
use crate::parsers::parse_snapshot_file;
use crate::utils::{decode_thread_file_name, message_log_path};

pub const CONVERSATIONS_FILE: &str = "conversations.jsonl";
pub const GROUPS_FILE: &str = "groups.jsonl";
pub const MESSAGES_DIR: &str = "messages";

/// Maximum number of message logs scanned (prevent resource exhaustion)
const MAX_MESSAGE_LOGS: usize = 10_000;

/// Raw conversation and group snapshots of one data directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataDirSnapshot {
    pub conversations: Vec<ConversationRecord>,
    pub groups: Vec<GroupRecord>,
}

impl DataDirSnapshot {
    /// The conversations and groups `viewer` takes part in
    ///
    /// This is what the live queries deliver for that user; reconciliation expects input already
    /// narrowed this way.
    pub fn visible_to(&self, viewer: &str) -> DataDirSnapshot {
        DataDirSnapshot {
            conversations: self
                .conversations
                .iter()
                .filter(|c| c.has_participant(viewer))
                .cloned()
                .collect(),
            groups: self.groups.iter().filter(|g| g.has_member(viewer)).cloned().collect(),
        }
    }
}

/// A message log found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageLog {
    pub thread_id: String,
    pub path: PathBuf,
}

/// Read both snapshot files of a data directory
///
/// A missing directory or snapshot file yields an empty snapshot. A file that fails to parse
/// is logged and treated as empty, so one corrupted collection does not hide the other.
///
/// # Errors
///
/// Returns an error if `data_dir` exists but is not a directory.
pub fn load_data_dir(data_dir: &Path) -> Result<DataDirSnapshot> {
    if data_dir.exists() && !data_dir.is_dir() {
        bail!("Data directory is not a directory: {}", data_dir.display());
    }

    let conversations = load_collection(&data_dir.join(CONVERSATIONS_FILE));
    let groups = load_collection(&data_dir.join(GROUPS_FILE));
    info!(
        conversations = conversations.len(),
        groups = groups.len(),
        dir = %data_dir.display(),
        "loaded data directory"
    );

    Ok(DataDirSnapshot { conversations, groups })
}

fn load_collection<T: serde::de::DeserializeOwned>(path: &Path) -> Vec<T> {
    if !path.exists() {
        warn!("{} not found at {}", file_label(path), path.display());
        return Vec::new();
    }
    match parse_snapshot_file(path) {
        Ok(documents) => documents,
        Err(e) => {
            warn!("Failed to load {}: {:#}", path.display(), e);
            Vec::new()
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default()
}

/// Messages of one thread, oldest first with pending messages last
///
/// A thread without a message log has no messages.
pub fn load_thread_messages(data_dir: &Path, thread_id: &str) -> Result<Vec<MessageRecord>> {
    let path = message_log_path(data_dir, thread_id);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut messages: Vec<MessageRecord> = parse_snapshot_file(&path)?;
    sort_messages(&mut messages);
    Ok(messages)
}

/// Every message log under `<data_dir>/messages`, sorted by thread ID
///
/// Files whose names do not decode to a thread ID and symlinks are skipped.
///
/// # Errors
///
/// Returns an error if more than 10,000 message logs are found.
pub fn discover_message_logs(data_dir: &Path) -> Result<Vec<MessageLog>> {
    let messages_dir = data_dir.join(MESSAGES_DIR);
    if !messages_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut logs = Vec::new();
    for entry in WalkDir::new(&messages_dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", messages_dir.display(), e);
                continue;
            }
        };
        // WalkDir does not follow links by default, so a link reports as a symlink here
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(thread_id) = decode_thread_file_name(&entry.file_name().to_string_lossy()) else {
            continue;
        };
        if logs.len() >= MAX_MESSAGE_LOGS {
            bail!(
                "Resource limit exceeded: more than {} message logs in {}",
                MAX_MESSAGE_LOGS,
                messages_dir.display()
            );
        }
        logs.push(MessageLog { thread_id, path: entry.into_path() });
    }

    logs.sort_by(|a, b| a.thread_id.cmp(&b.thread_id));
    Ok(logs)
}

/// Load a data directory, including every message log, into a [`MemoryStore`]
pub fn open_store(data_dir: &Path) -> Result<MemoryStore> {
    let snapshot = load_data_dir(data_dir)?;
    let store = MemoryStore::from_snapshots(snapshot.conversations, snapshot.groups);

    for log in discover_message_logs(data_dir)? {
        match parse_snapshot_file::<MessageRecord>(&log.path) {
            Ok(messages) => store.insert_messages(&log.thread_id, messages),
            Err(e) => warn!("Failed to load messages of {}: {:#}", log.thread_id, e),
        }
    }

    Ok(store)
}
