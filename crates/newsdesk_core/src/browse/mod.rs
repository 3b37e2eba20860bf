//! Navigation primitives for list and article views.
//!
//! # Responsibility
//! - Slice sorted feeds into pages and describe pager controls.
//! - Pick "related articles" for an article page.
//! - Decode query-string navigation state.

pub mod page;
pub mod query;
pub mod related;
