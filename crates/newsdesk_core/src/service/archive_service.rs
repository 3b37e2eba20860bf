//! Archive use-case service.
//!
//! # Responsibility
//! - Store pipeline output in the SQLite archive.
//! - Page archived items with the same `Page` semantics as the portal.
//!
//! # Invariants
//! - The service never bypasses repository validation.

use crate::browse::page::{page_count, Page};
use crate::model::item::{ItemId, NewsItem};
use crate::repo::news_repo::{
    normalize_news_limit, NewsListQuery, NewsRepository, RepoResult, TagCount,
};

/// Archive filter for [`ArchiveService::page`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveFilter {
    pub tag: Option<String>,
    pub category: Option<String>,
}

pub struct ArchiveService<R: NewsRepository> {
    repo: R,
}

impl<R: NewsRepository> ArchiveService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Upserts a batch; returns the number of stored items.
    pub fn ingest(&mut self, items: &[NewsItem]) -> RepoResult<usize> {
        if items.is_empty() {
            return Ok(0);
        }
        self.repo.upsert_items(items)
    }

    pub fn get(&self, id: &ItemId) -> RepoResult<Option<NewsItem>> {
        self.repo.get_item(id)
    }

    /// Returns one archive page; out-of-range pages clamp to the last one.
    pub fn page(
        &self,
        filter: &ArchiveFilter,
        page: usize,
        per_page: u32,
    ) -> RepoResult<Page<NewsItem>> {
        let limit = normalize_news_limit(Some(per_page));
        let mut query = NewsListQuery {
            tag: filter.tag.clone(),
            category: filter.category.clone(),
            limit: Some(limit),
            offset: 0,
        };

        let total = usize::try_from(self.repo.count_items(&query)?).unwrap_or(usize::MAX);
        let per_page = limit as usize;
        let pages = page_count(total, per_page);
        let page = page.clamp(1, pages);
        let offset = (page - 1) * per_page;
        query.offset = u32::try_from(offset).unwrap_or(u32::MAX);

        let items = if offset < total {
            self.repo.list_items(&query)?
        } else {
            Vec::new()
        };

        Ok(Page {
            page,
            pages,
            total,
            per_page,
            offset,
            items,
        })
    }

    pub fn tags(&self) -> RepoResult<Vec<TagCount>> {
        self.repo.list_tags()
    }
}
