/// Security-focused integration tests
///
/// These tests verify the boundaries of the snapshot directory: symlinks, path traversal
/// through thread IDs, file size limits and hostile document content
mod common;

use std::fs;

use common::{ChatDirBuilder, MessageDocBuilder};
use haccp_chat::reconcile;
use haccp_chat::sync::{discover_message_logs, load_data_dir, load_thread_messages};
use haccp_chat::utils::message_log_path;

#[test]
#[cfg(unix)] // Symlinks work differently on Windows
fn test_security_symlinked_snapshot_rejected() {
    use std::os::unix::fs::symlink;

    let dir = ChatDirBuilder::new().build();
    let outside = tempfile::TempDir::new().unwrap();
    let target = outside.path().join("conversations.jsonl");
    fs::write(&target, "{\"id\":\"c1\",\"participants\":[\"u1\",\"u2\"]}\n").unwrap();
    symlink(&target, dir.path().join("conversations.jsonl")).unwrap();

    let snapshot = load_data_dir(dir.path()).unwrap();
    assert!(snapshot.conversations.is_empty(), "symlinked snapshot must not be read");
}

#[test]
#[cfg(unix)]
fn test_security_symlinked_message_log_skipped() {
    use std::os::unix::fs::symlink;

    let dir = ChatDirBuilder::new()
        .with_messages("c1", &[MessageDocBuilder::new("m1", "u1", "hi").timestamp(1)])
        .build();
    let outside = tempfile::TempDir::new().unwrap();
    let target = outside.path().join("secret.jsonl");
    fs::write(&target, "{\"id\":\"m9\",\"senderId\":\"x\",\"text\":\"secret\"}\n").unwrap();
    symlink(&target, dir.path().join("messages").join("c2.jsonl")).unwrap();

    let logs = discover_message_logs(dir.path()).unwrap();
    let ids: Vec<&str> = logs.iter().map(|l| l.thread_id.as_str()).collect();
    assert_eq!(ids, vec!["c1"]);

    let err = load_thread_messages(dir.path(), "c2").unwrap_err();
    assert!(err.to_string().contains("symlink"));
}

#[test]
fn test_security_thread_id_cannot_escape_messages_dir() {
    let dir = ChatDirBuilder::new().build();
    fs::write(dir.path().join("conversations.jsonl"), "not a message log\n").unwrap();

    for hostile in ["../conversations", "../../etc/passwd", "..", "/etc/passwd", "a\\..\\b"] {
        let path = message_log_path(dir.path(), hostile);
        assert_eq!(path.parent(), Some(dir.path().join("messages").as_path()), "{}", hostile);
        assert!(load_thread_messages(dir.path(), hostile).unwrap().is_empty());
    }
}

#[test]
fn test_security_file_size_limit() {
    let dir = ChatDirBuilder::new().build();
    let line = "{\"id\":\"c1\",\"participants\":[\"u1\",\"u2\"]}\n";
    let oversized = line.repeat(11 * 1024 * 1024 / line.len() + 1);
    fs::write(dir.path().join("conversations.jsonl"), oversized).unwrap();

    // Rejected before reading; the loader degrades to an empty collection
    let snapshot = load_data_dir(dir.path()).unwrap();
    assert!(snapshot.conversations.is_empty());
}

#[test]
fn test_security_deeply_nested_extra_field() {
    let depth = 100;
    let nested = format!("{}1{}", "[".repeat(depth), "]".repeat(depth));
    let content = format!(
        "{{\"id\":\"c1\",\"participants\":[\"u1\",\"u2\"],\"extra\":{}}}\n\
         {{\"id\":\"c2\",\"participants\":[\"u1\",\"u3\"]}}\n",
        nested
    );
    let dir = ChatDirBuilder::new().with_conversations_raw(&content).build();

    let snapshot = load_data_dir(dir.path()).unwrap();
    assert_eq!(snapshot.conversations.len(), 2);
}

#[test]
fn test_security_recursion_limit_line_skipped() {
    // The line fails to parse instead of overflowing the stack
    let depth = 10_000;
    let nested = format!("{}{}", "[".repeat(depth), "]".repeat(depth));
    let content = format!(
        "{{\"id\":\"c0\",\"participants\":{}}}\n\
         {{\"id\":\"c1\",\"participants\":[\"u1\",\"u3\"]}}\n\
         {{\"id\":\"c2\",\"participants\":[\"u1\",\"u4\"]}}\n",
        nested
    );
    let dir = ChatDirBuilder::new().with_conversations_raw(&content).build();

    let snapshot = load_data_dir(dir.path()).unwrap();
    let ids: Vec<&str> = snapshot.conversations.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2"]);
}

#[test]
fn test_security_null_bytes_and_separator_in_ids() {
    // IDs containing the key separator can collide; reconciliation still yields one thread
    // per key and never panics
    let content = "{\"id\":\"c1\",\"participants\":[\"a_b\",\"c\"]}\n\
                   {\"id\":\"c2\",\"participants\":[\"a\",\"b_c\"]}\n\
                   {\"id\":\"c3\",\"participants\":[\"u\\u0000\",\"v\"]}\n";
    let dir = ChatDirBuilder::new().with_conversations_raw(content).build();

    let snapshot = load_data_dir(dir.path()).unwrap();
    let threads = reconcile(&snapshot.conversations, &snapshot.groups, "c");
    assert_eq!(threads.len(), 2);
}

#[test]
fn test_security_out_of_range_unread_counter_clamped() {
    // A bad counter must not hide the conversation it belongs to
    let content = "{\"id\":\"c1\",\"participants\":[\"u1\",\"u2\"],\"unreadCount\":{\"u1\":99999999999}}\n\
                   {\"id\":\"c2\",\"participants\":[\"u1\",\"u3\"],\"unreadCount\":{\"u1\":-1}}\n\
                   {\"id\":\"c3\",\"participants\":[\"u1\",\"u4\"],\"unreadCount\":{\"u1\":7}}\n\
                   {\"id\":\"c4\",\"participants\":[\"u1\",\"u5\"],\"createdAt\":\"last week\"}\n\
                   {\"id\":\"c5\",\"participants\":[\"u1\",\"u6\"]}\n";
    let dir = ChatDirBuilder::new().with_conversations_raw(content).build();

    let snapshot = load_data_dir(dir.path()).unwrap();
    let ids: Vec<&str> = snapshot.conversations.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2", "c3", "c4", "c5"]);

    let unread = |i: usize| snapshot.conversations[i].unread_count.get("u1").copied();
    assert_eq!(unread(0), Some(u32::MAX));
    assert_eq!(unread(1), Some(0));
    assert_eq!(unread(2), Some(7));
    assert_eq!(snapshot.conversations[3].created_at, None);

    let threads = reconcile(&snapshot.conversations, &snapshot.groups, "u1");
    assert_eq!(threads.len(), 5);
}
