//! Use-case services.
//!
//! # Responsibility
//! - `Portal` answers reader navigation from an in-memory feed.
//! - `ArchiveService` orchestrates archive repository calls.

pub mod archive_service;
pub mod portal_service;
