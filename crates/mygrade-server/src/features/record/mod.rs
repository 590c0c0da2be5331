//! Saved record view
//!
//! - **breakdown**: the weighted breakdown table of a snapshot
//! - **viewer**: save, expire and clear the per-browser snapshot

pub mod breakdown;
pub mod routes;
pub mod viewer;

pub use breakdown::{RecordView, RECORD_CELEBRATION_MS};
pub use routes::{record_routes, LOOKUP_PATH};
