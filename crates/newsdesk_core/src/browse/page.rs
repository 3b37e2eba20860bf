//! Pagination over newest-first feeds.
//!
//! # Invariants
//! - `pages >= 1` even for an empty feed.
//! - The returned page number is always within `[1, pages]`.

use serde::Serialize;

pub const DEFAULT_PER_PAGE: usize = 24;
pub const DEFAULT_PAGER_SPAN: usize = 3;

/// One page of a paginated list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Clamped 1-based page number.
    pub page: usize,
    pub pages: usize,
    /// Total number of items across all pages.
    pub total: usize,
    pub per_page: usize,
    /// Index of `items[0]` in the full list.
    pub offset: usize,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.pages
    }
}

/// Number of pages needed for `total` items.
pub fn page_count(total: usize, per_page: usize) -> usize {
    let per_page = effective_per_page(per_page);
    total.div_ceil(per_page).max(1)
}

/// Falls back to [`DEFAULT_PER_PAGE`] for zero.
pub fn effective_per_page(per_page: usize) -> usize {
    if per_page == 0 {
        DEFAULT_PER_PAGE
    } else {
        per_page
    }
}

/// Returns page `page` of `items`, clamping out-of-range requests.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = effective_per_page(per_page);
    let total = items.len();
    let pages = page_count(total, per_page);
    let page = page.clamp(1, pages);
    let offset = (page - 1) * per_page;
    let end = offset.saturating_add(per_page).min(total);
    let items = if offset < total {
        items[offset..end].to_vec()
    } else {
        Vec::new()
    };

    Page {
        page,
        pages,
        total,
        per_page,
        offset,
        items,
    }
}

/// One control in a rendered pager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PagerEntry {
    Prev { target: usize, disabled: bool },
    Number { page: usize, current: bool },
    Gap,
    Next { target: usize, disabled: bool },
}

/// Builds pager controls around `page`.
///
/// Empty for single-page lists. The numeric window covers `span` pages on
/// each side; the first and last page are always reachable, with a gap
/// marker when the window does not touch them.
pub fn pager(page: usize, pages: usize, span: usize) -> Vec<PagerEntry> {
    if pages <= 1 {
        return Vec::new();
    }
    let page = page.clamp(1, pages);
    let start = page.saturating_sub(span).max(1);
    let end = page.saturating_add(span).min(pages);

    let mut entries = vec![PagerEntry::Prev {
        target: page.saturating_sub(1).max(1),
        disabled: page <= 1,
    }];

    if start > 1 {
        entries.push(number(1, page));
        if start > 2 {
            entries.push(PagerEntry::Gap);
        }
    }
    entries.extend((start..=end).map(|p| number(p, page)));
    if end < pages {
        if pages - end > 1 {
            entries.push(PagerEntry::Gap);
        }
        entries.push(number(pages, page));
    }

    entries.push(PagerEntry::Next {
        target: page.saturating_add(1).min(pages),
        disabled: page >= pages,
    });
    entries
}

fn number(page: usize, current: usize) -> PagerEntry {
    PagerEntry::Number {
        page,
        current: page == current,
    }
}

#[cfg(test)]
mod tests {
    use super::{page_count, paginate, pager, PagerEntry};

    #[test]
    fn empty_list_has_one_page() {
        let page = paginate::<u32>(&[], 5, 10);
        assert_eq!(page.page, 1);
        assert_eq!(page.pages, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn zero_per_page_uses_default() {
        assert_eq!(page_count(48, 0), 2);
    }

    #[test]
    fn window_in_the_middle_has_gaps_on_both_sides() {
        let entries = pager(10, 20, 2);
        let numbers: Vec<Option<usize>> = entries
            .iter()
            .map(|entry| match entry {
                PagerEntry::Number { page, .. } => Some(*page),
                _ => None,
            })
            .collect();
        assert_eq!(
            numbers,
            vec![None, Some(1), None, Some(8), Some(9), Some(10), Some(11), Some(12), None, Some(20), None]
        );
    }

    #[test]
    fn adjacent_edges_do_not_produce_gap() {
        let entries = pager(4, 7, 2);
        assert!(!entries.contains(&PagerEntry::Gap));
        assert_eq!(entries.len(), 9);
    }

    #[test]
    fn unbounded_span_and_page_size_saturate() {
        let entries = pager(usize::MAX, 5, usize::MAX);
        assert!(!entries.contains(&PagerEntry::Gap));
        assert_eq!(entries.len(), 7);
        assert_eq!(
            entries.last(),
            Some(&PagerEntry::Next {
                target: 5,
                disabled: true
            })
        );

        let page = paginate(&[1, 2, 3], 2, usize::MAX);
        assert_eq!(page.page, 1);
        assert_eq!(page.items, vec![1, 2, 3]);
    }
}
