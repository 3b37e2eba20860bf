//! Full-text search over the news archive.

pub mod fts;
