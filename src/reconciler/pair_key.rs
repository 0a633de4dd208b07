use crate::models::ConversationRecord;

/// Joins the two sorted participant IDs of a canonical pair key
pub const PAIR_KEY_SEPARATOR: char = '_';

/// Canonical key for a participant pair: both IDs sorted lexicographically and joined
///
/// Symmetric in its arguments, so `derive_pair_key(a, b) == derive_pair_key(b, a)`.
///
/// # Examples
///
/// ```
/// use haccp_chat::derive_pair_key;
///
/// assert_eq!(derive_pair_key("u2", "u1"), "u1_u2");
/// assert_eq!(derive_pair_key("u1", "u2"), derive_pair_key("u2", "u1"));
/// ```
pub fn derive_pair_key(first: &str, second: &str) -> String {
    let (low, high) = if first <= second { (first, second) } else { (second, first) };
    let mut key = String::with_capacity(low.len() + high.len() + 1);
    key.push_str(low);
    key.push(PAIR_KEY_SEPARATOR);
    key.push_str(high);
    key
}

/// Key a conversation is de-duplicated under, or `None` for a malformed record
///
/// A stored non-empty `participantsKey` wins; older records without one get the key derived
/// from their participants. Records without two participant IDs are malformed.
pub fn canonical_key(record: &ConversationRecord) -> Option<String> {
    let (first, second) = record.pair()?;

    match record.participants_key.as_deref() {
        Some(stored) if !stored.trim().is_empty() => Some(stored.to_string()),
        _ => Some(derive_pair_key(first, second)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_pair_key_sorted() {
        assert_eq!(derive_pair_key("bob", "alice"), "alice_bob");
        assert_eq!(derive_pair_key("alice", "bob"), "alice_bob");
    }

    #[test]
    fn test_derive_pair_key_symmetric() {
        let ids = ["u1", "U1", "u10", "u2", "", "zeta", "äbc"];
        for a in ids {
            for b in ids {
                assert_eq!(derive_pair_key(a, b), derive_pair_key(b, a), "{} / {}", a, b);
            }
        }
    }

    #[test]
    fn test_derive_pair_key_same_id() {
        assert_eq!(derive_pair_key("u1", "u1"), "u1_u1");
    }

    #[test]
    fn test_canonical_key_prefers_stored_key() {
        let mut record = ConversationRecord::new("c1", "u2", "u1");
        record.participants_key = Some("legacy-key".to_string());
        assert_eq!(canonical_key(&record).as_deref(), Some("legacy-key"));
    }

    #[test]
    fn test_canonical_key_derived_when_absent_or_blank() {
        let mut record = ConversationRecord::new("c1", "u2", "u1");
        assert_eq!(canonical_key(&record).as_deref(), Some("u1_u2"));

        record.participants_key = Some(String::new());
        assert_eq!(canonical_key(&record).as_deref(), Some("u1_u2"));
    }

    #[test]
    fn test_canonical_key_malformed_records() {
        let mut record = ConversationRecord::new("c1", "u1", "u2");

        record.participants = Vec::new();
        assert!(canonical_key(&record).is_none());

        record.participants = vec!["u1".to_string()];
        assert!(canonical_key(&record).is_none());

        record.participants = vec!["u1".to_string(), " ".to_string()];
        assert!(canonical_key(&record).is_none());

        // A stored key does not rescue a record without participants
        record.participants = Vec::new();
        record.participants_key = Some("u1_u2".to_string());
        assert!(canonical_key(&record).is_none());
    }
}
