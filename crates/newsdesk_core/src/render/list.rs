//! Card list pages with pager controls.

use crate::browse::page::{Page, PagerEntry};
use crate::config::SiteConfig;
use crate::model::item::NewsItem;
use crate::normalize::text::summarize_one_sentence;
use crate::render::html::{document, escape_html, format_datetime};
use crate::render::links::Links;
use crate::render::sanitize::{checked_url, UrlKind};

const DEFAULT_CATEGORY_LABEL: &str = "Новости";
const UNTITLED: &str = "Без заголовка";
const MAX_CARD_TAGS: usize = 3;

/// Renders one news card.
///
/// `from` is the list page embedded into the article link for the back button.
pub fn render_card(
    item: &NewsItem,
    site: &SiteConfig,
    links: &Links,
    from: Option<usize>,
) -> String {
    let href = escape_html(&links.article(item, from));
    let title = if item.title.trim().is_empty() {
        UNTITLED
    } else {
        item.title.as_str()
    };

    let media = match item.image.as_deref().and_then(|src| checked_url(src, UrlKind::Media)) {
        Some(src) => format!(
            "<figure class=\"card__media\"><img class=\"card__img\" src=\"{}\" alt=\"\" loading=\"lazy\"></figure>",
            escape_html(&src)
        ),
        None => "<figure class=\"card__media card__media--empty\" aria-hidden=\"true\"></figure>".to_string(),
    };

    let category = item.category.as_deref().unwrap_or(DEFAULT_CATEGORY_LABEL);
    let mut badges = format!("<span class=\"badge\">{}</span>", escape_html(category));
    for tag in item.tags.iter().take(MAX_CARD_TAGS) {
        badges.push_str(&format!("<span class=\"badge badge--tag\">{}</span>", escape_html(tag)));
    }

    let mut meta = Vec::new();
    let source = item.source_label();
    if !source.is_empty() {
        meta.push(format!("<span class=\"card__source\">{}</span>", escape_html(source)));
    }
    let date = format_datetime(item.published_at, site.utc_offset_minutes);
    if !date.is_empty() {
        meta.push(format!("<time>{date}</time>"));
    }

    let summary = summarize_one_sentence(&item.summary);
    let summary_html = if summary.is_empty() {
        String::new()
    } else {
        format!("<p class=\"card__summary\">{}</p>", escape_html(&summary))
    };

    format!(
        "<article class=\"card\"><a class=\"card__wrap\" href=\"{href}\">{media}\
         <div class=\"card__body\"><div class=\"card__badges\">{badges}</div>\
         <h3 class=\"card__title\">{}</h3>\
         <div class=\"card__meta\">{}</div>{summary_html}</div></a></article>",
        escape_html(title),
        meta.join("<span class=\"card__dot\">·</span>")
    )
}

/// Renders pager controls; empty string for single-page lists.
pub fn render_pager(entries: &[PagerEntry], links: &Links) -> String {
    if entries.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = entries
        .iter()
        .map(|entry| match *entry {
            PagerEntry::Prev { target, disabled } => nav_link(links, target, "«", disabled),
            PagerEntry::Next { target, disabled } => nav_link(links, target, "»", disabled),
            PagerEntry::Number { page, current: true } => {
                format!("<span class=\"pager__btn is-active\">{page}</span>")
            }
            PagerEntry::Number { page, current: false } => format!(
                "<a class=\"pager__btn\" href=\"{}\">{page}</a>",
                escape_html(&links.list_page(page))
            ),
            PagerEntry::Gap => "<span class=\"pager__gap\">…</span>".to_string(),
        })
        .collect();
    format!("<nav class=\"pager\">{}</nav>", parts.join(""))
}

fn nav_link(links: &Links, target: usize, label: &str, disabled: bool) -> String {
    if disabled {
        format!("<span class=\"pager__btn is-disabled\">{label}</span>")
    } else {
        format!(
            "<a class=\"pager__btn\" href=\"{}\">{label}</a>",
            escape_html(&links.list_page(target))
        )
    }
}

/// Renders a full list page document.
pub fn render_list_page(
    page: &Page<NewsItem>,
    pager: &[PagerEntry],
    site: &SiteConfig,
    links: &Links,
) -> String {
    let cards = if page.items.is_empty() {
        "<p class=\"news-empty\">Новостей пока нет.</p>".to_string()
    } else {
        page.items
            .iter()
            .map(|item| render_card(item, site, links, Some(page.page)))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let body = format!(
        "<header class=\"site-header\"><a href=\"{}\">{}</a></header>\n\
         <main>\n<div id=\"news-list\" class=\"news-list\">\n{cards}\n</div>\n{}\n\
         <p id=\"news-total\" class=\"news-total\">{} · {}/{}</p>\n</main>",
        escape_html(&links.home()),
        escape_html(&site.title),
        render_pager(pager, links),
        page.total,
        page.page,
        page.pages
    );
    let title = if page.page > 1 {
        format!("{} — страница {}", site.title, page.page)
    } else {
        site.title.clone()
    };
    document(&title, &body)
}
