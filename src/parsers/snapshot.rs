use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::utils::safe_open_file;

const MAX_CONSECUTIVE_ERRORS: usize = 100;

/// Parse a snapshot JSONL file (one document per line)
/// Gracefully handles malformed lines by logging and skipping them
/// Returns an error if more than 50% of lines fail to parse or >100 consecutive errors
pub fn parse_snapshot_file<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    // Safely open file with TOCTOU protection and validation
    let file = safe_open_file(path)?;
    let source = path.display().to_string();
    parse_snapshot_reader(BufReader::new(file), &source)
}

/// Parse snapshot documents from any buffered reader; `source` only labels log lines and errors
pub fn parse_snapshot_reader<T: DeserializeOwned, R: BufRead>(
    reader: R,
    source: &str,
) -> Result<Vec<T>> {
    let mut documents = Vec::new();
    let mut skipped_count = 0;
    let mut total_lines = 0;
    let mut consecutive_errors = 0;

    for (line_num, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line from {}", source))?;

        if line.trim().is_empty() {
            continue;
        }

        total_lines += 1;

        match serde_json::from_str::<T>(&line) {
            Ok(document) => {
                documents.push(document);
                consecutive_errors = 0;
            }
            Err(e) => {
                warn!("Skipping line {} in {}: {}", line_num + 1, source, e);
                skipped_count += 1;
                consecutive_errors += 1;

                if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                    bail!(
                        "Too many consecutive parse errors ({}) in {} - snapshot may be corrupted",
                        consecutive_errors,
                        source
                    );
                }
            }
        }
    }

    if total_lines > 0 {
        let failure_rate = (skipped_count as f64) / (total_lines as f64);
        if failure_rate > 0.5 {
            bail!(
                "Too many parse failures in {}: {} of {} lines failed ({:.1}%)",
                source,
                skipped_count,
                total_lines,
                failure_rate * 100.0
            );
        }
    }

    if skipped_count > 0 {
        info!("Parsed {}: {} documents ({} skipped)", source, documents.len(), skipped_count);
    }

    Ok(documents)
}

/// Append one document as a JSON line, creating the file if needed
pub fn append_document<T: Serialize>(path: &Path, document: &T) -> Result<()> {
    let line = serde_json::to_string(document).context("Failed to serialize document")?;

    let mut file = OpenOptions::new()
        .read(true)
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {} for appending", path.display()))?;

    // Keep the new document on its own line even if the file lacks a trailing newline
    let needs_newline = !ends_with_newline(&mut file)
        .with_context(|| format!("Failed to read the end of {}", path.display()))?;
    if needs_newline {
        writeln!(file).with_context(|| format!("Failed to write to {}", path.display()))?;
    }
    writeln!(file, "{}", line).with_context(|| format!("Failed to write to {}", path.display()))?;
    Ok(())
}

/// Whether the last byte is a newline; an empty file counts as terminated
///
/// Only the final byte is read. Appends always land at the end regardless of the cursor.
fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
