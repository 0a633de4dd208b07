use std::borrow::Cow;
use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

// Maximum file size for snapshot files: 10MB
const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

const MESSAGE_LOG_EXTENSION: &str = "jsonl";

// Characters that cannot appear verbatim in a message log file name
const ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'*')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'|')
    .add(b'/')
    .add(b'\\')
    .add(b':')
    .add(b'.');

/// Encodes a thread ID into the file name of its message log
///
/// Dots are encoded too, so IDs such as `..` can never escape the messages directory.
///
/// # Examples
///
/// ```
/// use haccp_chat::utils::encode_thread_id;
///
/// assert_eq!(encode_thread_id("conv-1"), "conv-1.jsonl");
/// assert_eq!(encode_thread_id("a/b"), "a%2Fb.jsonl");
/// ```
pub fn encode_thread_id(thread_id: &str) -> String {
    format!("{}.{}", utf8_percent_encode(thread_id, ENCODE_SET), MESSAGE_LOG_EXTENSION)
}

/// Decodes a message log file name back to its thread ID
///
/// Returns `None` for names that are not message logs.
pub fn decode_thread_file_name(file_name: &str) -> Option<String> {
    let stem = file_name.strip_suffix(MESSAGE_LOG_EXTENSION)?.strip_suffix('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(percent_decode_str(stem).decode_utf8_lossy().into_owned())
}

/// Validates that a file's size is within acceptable limits (10MB)
///
/// Takes an open file handle to avoid TOCTOU (time-of-check-time-of-use)
/// race conditions where the file could be modified between the size check
/// and subsequent file operations.
///
/// # Errors
///
/// Returns an error if:
/// - The file metadata cannot be read
/// - The file is larger than 10MB
pub fn validate_file_size(file: &File, path: &Path) -> Result<()> {
    let metadata = file
        .metadata()
        .with_context(|| format!("Failed to read file metadata: {}", path.display()))?;

    let file_size = metadata.len();
    if file_size > MAX_FILE_SIZE_BYTES {
        bail!(
            "File too large: {} ({} bytes, max {} bytes)",
            path.display(),
            file_size,
            MAX_FILE_SIZE_BYTES
        );
    }

    Ok(())
}

/// Opens a snapshot file for reading, refusing symlinks and oversized files
///
/// # Errors
///
/// Returns an error if the path is missing, is a symlink or not a regular file,
/// or exceeds the size limit.
pub fn safe_open_file(path: &Path) -> Result<File> {
    let link_metadata = std::fs::symlink_metadata(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    if link_metadata.file_type().is_symlink() {
        bail!("Refusing to follow symlink: {}", path.display());
    }
    if !link_metadata.is_file() {
        bail!("Not a regular file: {}", path.display());
    }

    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    validate_file_size(&file, path)?;
    Ok(file)
}

/// Formats a path with ~ substitution for the home directory
pub fn format_path_with_tilde(path: &Path) -> String {
    format_path_with_tilde_internal(path, None)
}

/// Internal helper for path formatting with optional home override (for testing)
pub(crate) fn format_path_with_tilde_internal(path: &Path, home_override: Option<&str>) -> String {
    let home_from_env = env::var("HOME").ok();
    let home = home_override.or(home_from_env.as_deref());

    let path_str = path.to_string_lossy();
    if let Some(home) = home
        && !home.is_empty()
        && path_str.starts_with(home)
    {
        return path_str.replacen(home, "~", 1);
    }

    match path_str {
        Cow::Borrowed(s) => s.to_string(),
        Cow::Owned(s) => s,
    }
}

/// Path of the message log for `thread_id` under `data_dir`
pub fn message_log_path(data_dir: &Path, thread_id: &str) -> PathBuf {
    data_dir.join("messages").join(encode_thread_id(thread_id))
}
