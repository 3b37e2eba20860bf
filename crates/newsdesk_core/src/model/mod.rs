//! Canonical display model for news records.
//!
//! # Responsibility
//! - Define the single typed shape every feed version is normalized into.
//! - Own identity derivation and feed ordering rules.
//!
//! # Invariants
//! - Every item carries a stable `ItemId`.
//! - Feed order is newest first; items without a date sort last.

pub mod item;
