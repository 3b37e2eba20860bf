//! "Related articles" selection.
//!
//! # Invariants
//! - The current article is never suggested.
//! - No index is suggested twice.
//! - Selection is deterministic for a given feed.

use crate::model::item::NewsItem;
use std::cmp::Reverse;
use std::collections::HashSet;

pub const DEFAULT_RELATED_LIMIT: usize = 3;

/// Picks up to `limit` indices related to `items[index]`.
///
/// Chronological neighbours come first (previous, then next); remaining
/// slots go to the items sharing the most tags, then the same category,
/// then the newest.
pub fn select_related(items: &[NewsItem], index: usize, limit: usize) -> Vec<usize> {
    let Some(current) = items.get(index) else {
        return Vec::new();
    };
    if limit == 0 {
        return Vec::new();
    }

    let mut selected = Vec::with_capacity(limit.min(items.len()));
    if index > 0 {
        selected.push(index - 1);
    }
    if index + 1 < items.len() && selected.len() < limit {
        selected.push(index + 1);
    }
    if selected.len() >= limit {
        return selected;
    }

    let current_tags: HashSet<String> = current.tags.iter().map(|t| t.to_lowercase()).collect();
    let mut candidates: Vec<(usize, &NewsItem)> = items
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != index && !selected.contains(idx))
        .collect();

    candidates.sort_by_key(|(idx, item)| {
        let shared = item
            .tags
            .iter()
            .filter(|tag| current_tags.contains(&tag.to_lowercase()))
            .count();
        let same_category = current.category.is_some() && item.category == current.category;
        (
            Reverse(shared),
            Reverse(same_category),
            Reverse(item.sort_key()),
            *idx,
        )
    });

    selected.extend(
        candidates
            .into_iter()
            .map(|(idx, _)| idx)
            .take(limit - selected.len()),
    );
    selected
}
