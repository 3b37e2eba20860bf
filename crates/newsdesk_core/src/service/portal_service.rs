//! Portal use-cases over an in-memory feed.
//!
//! # Responsibility
//! - Serve list, article and filter views from the newest-first feed.
//! - Dispatch a raw query string to the right rendered page.
//!
//! # Invariants
//! - `items` is sorted newest first once the portal is built; indices in
//!   `?i=` links refer to that order.

use crate::browse::page::{effective_per_page, paginate, pager, Page, PagerEntry};
use crate::browse::query::{parse_query, resolve_article, ArticleLookup, NotFoundReason, Resolved};
use crate::browse::related::select_related;
use crate::config::SiteConfig;
use crate::feed::load::{load_feed, LoadResult};
use crate::ingest::fetch::FeedFetcher;
use crate::model::item::{sort_newest_first, NewsItem};
use crate::normalize::fields::normalize_feed;
use crate::render::article::{render_article_page, render_not_found};
use crate::render::links::Links;
use crate::render::list::render_list_page;
use log::{info, warn};
use serde_json::Value;
use std::collections::HashMap;

/// Category picker value that disables the category filter.
pub const ALL_CATEGORIES: &str = "Все";

/// In-memory narrowing of the loaded feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortalFilter {
    /// Case-insensitive substring over title, summary, source and tags.
    pub text: String,
    /// Exact tag, case-insensitive.
    pub tag: Option<String>,
    /// Exact category; blank or [`ALL_CATEGORIES`] matches everything.
    pub category: Option<String>,
}

/// Outcome of an article lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum ArticleView<'a> {
    Found {
        index: usize,
        item: &'a NewsItem,
        related: Vec<&'a NewsItem>,
        /// List page behind the back link.
        from: usize,
    },
    NotFound(NotFoundReason),
}

pub struct Portal {
    items: Vec<NewsItem>,
    site: SiteConfig,
}

impl Portal {
    pub fn new(mut items: Vec<NewsItem>, site: SiteConfig) -> Self {
        sort_newest_first(&mut items);
        Self { items, site }
    }

    /// Builds a portal from a raw feed document of any supported shape.
    pub fn from_value(raw: &Value, site: SiteConfig) -> Self {
        Self::new(normalize_feed(raw), site)
    }

    /// Loads the feed from `site.feed_locations`, first reachable wins.
    pub fn load<F: FeedFetcher + ?Sized>(site: SiteConfig, fetcher: &F) -> LoadResult<Self> {
        let items = load_feed(&site.feed_locations, fetcher)?;
        info!(
            "event=portal_load module=service status=ok items={}",
            items.len()
        );
        Ok(Self::new(items, site))
    }

    pub fn items(&self) -> &[NewsItem] {
        &self.items
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    pub fn list_view(&self, page: usize) -> Page<NewsItem> {
        paginate(&self.items, page, self.site.per_page)
    }

    pub fn pager_for(&self, page: &Page<NewsItem>) -> Vec<PagerEntry> {
        pager(page.page, page.pages, self.site.pager_span)
    }

    /// Resolves an article and its related items.
    ///
    /// Without `from`, the back link points at the page holding the item.
    pub fn article_view(&self, lookup: &ArticleLookup, from: Option<usize>) -> ArticleView<'_> {
        match resolve_article(&self.items, lookup) {
            Resolved::Found(index) => {
                let related = select_related(&self.items, index, self.site.related_limit)
                    .into_iter()
                    .map(|other| &self.items[other])
                    .collect();
                let per_page = effective_per_page(self.site.per_page);
                ArticleView::Found {
                    index,
                    item: &self.items[index],
                    related,
                    from: from.unwrap_or(index / per_page + 1),
                }
            }
            Resolved::NotFound(reason) => ArticleView::NotFound(reason),
        }
    }

    /// Items matching every part of `filter`, newest first.
    pub fn filter(&self, filter: &PortalFilter) -> Vec<&NewsItem> {
        let needle = filter.text.trim().to_lowercase();
        let tag = filter
            .tag
            .as_deref()
            .map(|tag| tag.trim().to_lowercase())
            .filter(|tag| !tag.is_empty());
        let category = filter
            .category
            .as_deref()
            .map(str::trim)
            .filter(|category| !category.is_empty() && *category != ALL_CATEGORIES);
        self.items
            .iter()
            .filter(|item| {
                category.map_or(true, |category| item.category.as_deref() == Some(category))
            })
            .filter(|item| {
                tag.as_ref().map_or(true, |tag| {
                    item.tags.iter().any(|own| own.to_lowercase() == *tag)
                })
            })
            .filter(|item| needle.is_empty() || matches_text(item, &needle))
            .collect()
    }

    /// Most used tags by frequency, then name.
    pub fn top_tags(&self, limit: usize) -> Vec<(String, usize)> {
        let mut counts: HashMap<String, (String, usize)> = HashMap::new();
        for tag in self.items.iter().flat_map(|item| item.tags.iter()) {
            let entry = counts
                .entry(tag.to_lowercase())
                .or_insert_with(|| (tag.clone(), 0));
            entry.1 += 1;
        }
        let mut ranked: Vec<(String, usize)> = counts.into_values().collect();
        ranked.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(&right.0)));
        ranked.truncate(limit);
        ranked
    }

    pub fn render_list(&self, page: usize, links: &Links) -> String {
        let page = self.list_view(page);
        let entries = self.pager_for(&page);
        render_list_page(&page, &entries, &self.site, links)
    }

    pub fn render_article(
        &self,
        lookup: &ArticleLookup,
        from: Option<usize>,
        links: &Links,
    ) -> String {
        match self.article_view(lookup, from) {
            ArticleView::Found {
                item,
                related,
                from,
                ..
            } => render_article_page(item, &related, &self.site, links, Some(from)),
            ArticleView::NotFound(reason) => {
                warn!("event=article_view module=service status=error error_code={reason}");
                render_not_found(reason, &self.site, links)
            }
        }
    }

    /// Renders the page a browser would show for `query`: an article when
    /// article parameters are present, the list page otherwise.
    pub fn render_query(&self, query: &str) -> String {
        let nav = parse_query(query);
        let links = Links::query();
        if nav.is_article() {
            self.render_article(&nav.article, nav.from, &links)
        } else {
            self.render_list(nav.page, &links)
        }
    }
}

fn matches_text(item: &NewsItem, needle: &str) -> bool {
    [item.title.as_str(), item.summary.as_str(), item.source_label()]
        .into_iter()
        .chain(item.tags.iter().map(String::as_str))
        .any(|field| field.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::{ArticleView, Portal};
    use crate::browse::query::{ArticleLookup, NotFoundReason};
    use crate::config::SiteConfig;
    use crate::model::item::NewsItem;
    use chrono::{TimeZone, Utc};

    fn item(n: u32, tags: &[&str]) -> NewsItem {
        let at = Utc
            .with_ymd_and_hms(2024, 3, 1, 0, 0, 0)
            .single()
            .map(|dt| dt + chrono::Duration::hours(i64::from(n)));
        let mut item = NewsItem::new(format!("Новость {n}"), format!("https://a.test/{n}"), at);
        item.add_tags(tags);
        item
    }

    fn portal(count: u32) -> Portal {
        let site = SiteConfig {
            per_page: 2,
            ..SiteConfig::default()
        };
        Portal::new((0..count).map(|n| item(n, &["экономика"])).collect(), site)
    }

    #[test]
    fn items_are_sorted_newest_first() {
        let portal = portal(3);
        assert_eq!(portal.items()[0].title, "Новость 2");
    }

    #[test]
    fn article_view_defaults_back_link_to_holding_page() {
        let portal = portal(5);
        match portal.article_view(&ArticleLookup::ByIndex(3), None) {
            ArticleView::Found { from, item, .. } => {
                assert_eq!(from, 2);
                assert_eq!(item.title, "Новость 1");
            }
            other => panic!("unexpected view {other:?}"),
        }
        assert_eq!(
            portal.article_view(&ArticleLookup::ByIndex(9), None),
            ArticleView::NotFound(NotFoundReason::IndexOutOfRange)
        );
    }

    #[test]
    fn top_tags_rank_by_frequency_then_name() {
        let items = vec![item(1, &["б", "а"]), item(2, &["б"]), item(3, &["в", "А"])];
        let portal = Portal::new(items, SiteConfig::default());
        assert_eq!(
            portal.top_tags(2),
            vec![("А".to_string(), 2), ("б".to_string(), 2)]
        );
    }
}
