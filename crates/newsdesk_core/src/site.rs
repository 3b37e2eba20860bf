//! Prebuilt static site: every list page and article as its own file.

use crate::browse::page::page_count;
use crate::browse::query::ArticleLookup;
use crate::feed::export::{write_atomic, ExportResult};
use crate::render::links::{file_slug, Links};
use crate::service::portal_service::Portal;
use log::{info, warn};
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

/// Files written by [`build_site`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SiteReport {
    pub list_pages: usize,
    pub article_pages: usize,
}

/// Writes `index.html`, `page/N.html` for pages after the first and
/// `article/<id>.html` for every item under `out_dir`.
pub fn build_site(portal: &Portal, out_dir: impl AsRef<Path>) -> ExportResult<SiteReport> {
    let out_dir = out_dir.as_ref();
    let started_at = Instant::now();
    info!(
        "event=site_build module=site status=start out_dir={}",
        out_dir.display()
    );

    let root_links = Links::static_at_depth(0);
    let nested_links = Links::static_at_depth(1);
    let mut report = SiteReport::default();

    let pages = page_count(portal.items().len(), portal.site().per_page);
    for page in 1..=pages {
        let (path, links) = if page == 1 {
            (out_dir.join("index.html"), &root_links)
        } else {
            (out_dir.join("page").join(format!("{page}.html")), &nested_links)
        };
        write_atomic(&path, portal.render_list(page, links).as_bytes())?;
        report.list_pages += 1;
    }

    let mut written = HashSet::new();
    for (index, item) in portal.items().iter().enumerate() {
        let slug = file_slug(item.id.as_str());
        if !written.insert(slug.clone()) {
            // The first item with a slug owns its file.
            warn!(
                "event=site_build module=site status=error error_code=slug_collision id={}",
                item.id
            );
            continue;
        }
        let path = out_dir.join("article").join(format!("{slug}.html"));
        let html = portal.render_article(&ArticleLookup::ByIndex(index), None, &nested_links);
        write_atomic(&path, html.as_bytes())?;
        report.article_pages += 1;
    }

    info!(
        "event=site_build module=site status=ok list_pages={} article_pages={} duration_ms={}",
        report.list_pages,
        report.article_pages,
        started_at.elapsed().as_millis()
    );
    Ok(report)
}
