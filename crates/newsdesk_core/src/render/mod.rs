//! Server-side HTML views for the news portal.
//!
//! # Responsibility
//! - Render card lists, pagers, article pages and not-found placeholders.
//! - Escape every feed-provided text field; sanitize feed-provided HTML.
//!
//! # Invariants
//! - Rendering is infallible: missing fields render as placeholders.
//! - Untrusted markup only reaches output through `sanitize_html`.
//! - Feed URLs only reach `href`/`src` after `checked_url` accepts their scheme.

pub mod article;
pub mod html;
pub mod links;
pub mod list;
pub mod sanitize;
