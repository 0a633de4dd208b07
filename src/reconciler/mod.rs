//! Reconciliation of live conversation and group snapshots into one chat list
//!
//! # Error Handling Strategy
//!
//! Reconciliation is total and never returns an error:
//!
//! - **Malformed records**: Conversation documents without two participant IDs cannot be keyed,
//!   so they are dropped and counted. Nobody can act on them, so they are only logged at debug.
//!
//! - **Duplicate pairs**: Two documents for the same participant pair (a race between two
//!   "start chat" actions) are not an error. The most recently active one is kept and the rest
//!   are counted in [`Reconciliation::duplicates_dropped`].
//!
//! - **Upstream failures**: Delivery and parse failures belong to the `sync` and `parsers`
//!   modules; by the time records reach this module they are well-typed.

pub mod merge;
pub mod pair_key;

pub use merge::{Reconciliation, reconcile, reconcile_with_report};
pub use pair_key::{PAIR_KEY_SEPARATOR, canonical_key, derive_pair_key};
