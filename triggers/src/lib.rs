//! Scripted-reply triggers.
//!
//! A trigger map associates normalized phrases with one or more pre-authored
//! replies, sourced from an external spreadsheet. [`TriggerStore`] caches the
//! map and refreshes it from a [`TriggerSource`] no more often than a
//! configured lifetime; a failed refresh keeps serving the previous map
//! rather than silently answering every message from the paid completion
//! chain.

mod map;
mod source;
mod store;

pub use map::build_trigger_map;
pub use source::{SHEETS_API_BASE_URL, SheetRow, SheetValuesSource, SourceError, TriggerSource};
pub use store::{TriggerStore, TriggerStoreError};
