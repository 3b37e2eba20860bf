//! JSON feed files: loading with fallback locations and atomic export.
//!
//! # Responsibility
//! - Read the published feed from the first reachable location.
//! - Write the feed and its metadata document for static hosting.
//!
//! # Invariants
//! - Exported feeds are written atomically (temp file + rename).

pub mod export;
pub mod load;
