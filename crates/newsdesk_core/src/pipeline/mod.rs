//! Aggregation pipeline over collected items.
//!
//! # Responsibility
//! - Canonicalize URLs and drop duplicate and near-duplicate stories.
//! - Assign categories and keyword tags; drop excluded or blocked items.
//! - Merge fresh items into the existing feed with a size cap.
//!
//! # Invariants
//! - First occurrence wins in every deduplication step.
//! - Pipeline output is sorted newest first.

pub mod canonical;
pub mod classify;
pub mod dedupe;
pub mod filter;
pub mod run;
