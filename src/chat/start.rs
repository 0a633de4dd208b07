use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{ConversationRecord, Participant};
use crate::reconciler::derive_pair_key;
use crate::sync::DocumentStore;

/// Outcome of [`start_direct_chat`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartChat {
    /// A conversation for the pair already existed
    Existing(ConversationRecord),
    /// A new conversation was written
    Created(ConversationRecord),
}

impl StartChat {
    pub fn record(&self) -> &ConversationRecord {
        match self {
            StartChat::Existing(record) | StartChat::Created(record) => record,
        }
    }

    pub fn into_record(self) -> ConversationRecord {
        match self {
            StartChat::Existing(record) | StartChat::Created(record) => record,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, StartChat::Created(_))
    }
}

/// Open the direct conversation between `viewer` and `peer`, creating it if none exists
///
/// Looks up the canonical pair key first so repeated calls reuse one document. The lookup and
/// the write are not atomic: two callers racing on the same pair can both create a document,
/// which reconciliation later collapses into one thread.
///
/// # Errors
///
/// Returns an error if either identifier is empty, if `peer` is the viewer, or if the store
/// fails.
pub fn start_direct_chat<S: DocumentStore + ?Sized>(
    store: &S,
    viewer: &Participant,
    peer: &Participant,
    now: DateTime<Utc>,
) -> Result<StartChat> {
    if viewer.id.trim().is_empty() {
        bail!("Viewer ID cannot be empty");
    }
    if peer.id.trim().is_empty() {
        bail!("Peer ID cannot be empty");
    }
    if viewer.id == peer.id {
        bail!("Cannot start a direct chat with yourself");
    }

    let key = derive_pair_key(&viewer.id, &peer.id);
    if let Some(existing) = store
        .find_conversation_by_key(&key)
        .with_context(|| format!("Failed to look up conversation {}", key))?
    {
        debug!(key = %key, id = %existing.id, "reusing existing conversation");
        return Ok(StartChat::Existing(existing));
    }

    let record = ConversationRecord {
        id: Uuid::new_v4().to_string(),
        participants: vec![viewer.id.clone(), peer.id.clone()],
        participants_key: Some(key.clone()),
        participant_names: BTreeMap::from([
            (viewer.id.clone(), viewer.display_name().to_string()),
            (peer.id.clone(), peer.display_name().to_string()),
        ]),
        last_message: None,
        last_message_time: None,
        last_message_sender: None,
        unread_count: BTreeMap::from([(viewer.id.clone(), 0), (peer.id.clone(), 0)]),
        created_at: Some(now),
    };

    store
        .create_conversation(record.clone())
        .with_context(|| format!("Failed to create conversation {}", key))?;
    info!(key = %key, id = %record.id, "created conversation");

    Ok(StartChat::Created(record))
}
