//! JSONL parsers for conversation, group and message snapshots
//!
//! # Error Handling Strategy
//!
//! This module follows a **graceful degradation** approach:
//!
//! - **Individual line failures**: Malformed JSON lines, or lines that do not match the document
//!   shape, are logged through `tracing` and skipped so one bad document cannot hide the rest of
//!   the snapshot.
//!
//! - **Catastrophic failure detection**: If >50% of lines fail to parse, or if >100 consecutive
//!   errors occur, the parser returns an error instead of a partial snapshot.
//!
//! - **Defaulting at the boundary**: Optional document fields (`null` or absent) are resolved
//!   here by the custom deserializers, so downstream code works on a closed shape.

pub mod deserializers;
pub mod snapshot;

pub use snapshot::{append_document, parse_snapshot_file, parse_snapshot_reader};
