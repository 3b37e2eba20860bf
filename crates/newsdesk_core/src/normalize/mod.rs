//! Field normalization for heterogeneous news feeds.
//!
//! # Responsibility
//! - Map loosely-typed JSON records onto the canonical `NewsItem`.
//! - Parse the many date spellings that appear across feed versions.
//! - Provide text helpers shared by ingestion and rendering.
//!
//! # Invariants
//! - Normalization never fails on a single malformed record; it skips
//!   non-object entries and degrades missing fields to empty values.

pub mod date;
pub mod fields;
pub mod text;
