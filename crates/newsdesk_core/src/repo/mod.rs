//! Archive repositories.
//!
//! # Invariants
//! - SQL stays behind repository traits; services see `NewsItem` only.
//! - Repository APIs return semantic errors alongside DB transport errors.

pub mod news_repo;
