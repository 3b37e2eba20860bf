//! Article detail page, related cards and the not-found placeholder.

use crate::browse::query::NotFoundReason;
use crate::config::SiteConfig;
use crate::model::item::NewsItem;
use crate::render::html::{document, escape_html, format_date, format_datetime, render_body};
use crate::render::links::Links;
use crate::render::sanitize::{checked_url, UrlKind};

const UNTITLED: &str = "Без заголовка";

fn display_title(item: &NewsItem) -> &str {
    if item.title.trim().is_empty() {
        UNTITLED
    } else {
        item.title.as_str()
    }
}

/// Renders one related-article card.
pub fn render_related_card(
    item: &NewsItem,
    site: &SiteConfig,
    links: &Links,
    from: Option<usize>,
) -> String {
    let thumb = item
        .image
        .as_deref()
        .and_then(|src| checked_url(src, UrlKind::Media))
        .map(|src| format!("<img src=\"{}\" alt=\"\" loading=\"lazy\">", escape_html(&src)))
        .unwrap_or_default();
    let date = format_date(item.published_at, site.utc_offset_minutes);
    let date_html = if date.is_empty() {
        String::new()
    } else {
        format!("<p class=\"related-card__meta\">{date}</p>")
    };
    format!(
        "<a class=\"related-card\" href=\"{}\"><div class=\"related-card__thumb\">{thumb}</div>\
         <div><p class=\"related-card__title\">{}</p>{date_html}</div></a>",
        escape_html(&links.article(item, from)),
        escape_html(display_title(item))
    )
}

/// Renders the full article page.
///
/// `from` selects the list page behind the back link.
pub fn render_article_page(
    item: &NewsItem,
    related: &[&NewsItem],
    site: &SiteConfig,
    links: &Links,
    from: Option<usize>,
) -> String {
    let title = display_title(item);
    let back_href = escape_html(&links.list_page(from.unwrap_or(1)));

    let breadcrumbs = if item.tags.is_empty() {
        String::new()
    } else {
        format!(" · <span>{}</span>", escape_html(&item.tags.join(", ")))
    };

    let mut meta = Vec::new();
    let source = item.source_label();
    if !source.is_empty() {
        meta.push(format!("<span class=\"article-meta-item\">{}</span>", escape_html(source)));
    }
    let date = format_datetime(item.published_at, site.utc_offset_minutes);
    if !date.is_empty() {
        meta.push(format!("<time class=\"article-meta-item\">{date}</time>"));
    }

    let cover = item
        .image
        .as_deref()
        .and_then(|src| checked_url(src, UrlKind::Media))
        .map(|src| {
            format!(
                "<div class=\"article-image-wrap\"><img class=\"article-image\" src=\"{}\" alt=\"\" loading=\"eager\"></div>",
                escape_html(&src)
            )
        })
        .unwrap_or_default();

    let source_button = checked_url(&item.link, UrlKind::External)
        .map(|href| {
            format!(
                "<a class=\"primary-btn\" href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">Читать в источнике</a>",
                escape_html(&href)
            )
        })
        .unwrap_or_default();

    let related_html = if related.is_empty() {
        String::new()
    } else {
        let cards: Vec<String> = related
            .iter()
            .map(|other| render_related_card(other, site, links, from))
            .collect();
        format!(
            "<section id=\"related\" class=\"related\"><h2>Другие материалы</h2>{}</section>",
            cards.join("")
        )
    };

    let body = format!(
        "<article id=\"article\" class=\"article\">\n\
         <header class=\"article-header\"><p class=\"article-breadcrumbs\"><a href=\"{back_href}\">Новости</a>{breadcrumbs}</p>\
         <h1 class=\"article-title\">{}</h1><div class=\"article-meta\">{}</div></header>\n\
         {cover}\n<section class=\"article-body\">\n{}\n</section>\n\
         <footer class=\"article-footer\">{source_button}<a class=\"secondary-btn\" href=\"{back_href}\">Назад к ленте</a></footer>\n\
         </article>\n{related_html}",
        escape_html(title),
        meta.join("<span>•</span>"),
        render_body(item.body())
    );
    document(&format!("{title} — {}", site.title), &body)
}

/// Renders the placeholder shown when an article cannot be resolved.
pub fn render_not_found(reason: NotFoundReason, site: &SiteConfig, links: &Links) -> String {
    let body = format!(
        "<div id=\"nf\" class=\"empty-state\"><h1>Статья не найдена</h1><p>{}</p>\
         <p><a href=\"{}\">Вернуться к ленте</a></p></div>",
        escape_html(reason.message()),
        escape_html(&links.home())
    );
    document(&format!("Статья не найдена — {}", site.title), &body)
}

#[cfg(test)]
mod tests {
    use super::{render_article_page, render_not_found};
    use crate::browse::query::NotFoundReason;
    use crate::config::SiteConfig;
    use crate::model::item::NewsItem;
    use crate::render::links::Links;

    #[test]
    fn article_body_falls_back_to_summary_and_sanitizes() {
        let mut item = NewsItem::new("Title", "https://src.test/a", None);
        item.summary = "<p>Lead<script>x()</script></p>".to_string();
        let html = render_article_page(&item, &[], &SiteConfig::default(), &Links::query(), Some(2));
        assert!(html.contains("<p>Lead</p>"));
        assert!(!html.contains("script"));
        assert!(html.contains("href=\"index.html?page=2\""));
        assert!(html.contains("Читать в источнике"));
        assert!(!html.contains("id=\"related\""));
    }

    #[test]
    fn related_cards_are_rendered() {
        let item = NewsItem::new("Main", "", None);
        let other = NewsItem::new("Other", "", None);
        let html = render_article_page(&item, &[&other], &SiteConfig::default(), &Links::query(), None);
        assert!(html.contains("related-card__title\">Other<"));
        assert!(!html.contains("Читать в источнике"));
    }

    #[test]
    fn non_http_source_links_and_images_are_not_rendered() {
        let mut item = NewsItem::new("t", "javascript:alert(document.cookie)", None);
        item.image = Some("javascript:alert(1)".to_string());
        let mut other = NewsItem::new("o", "", None);
        other.image = Some(" data:image/png;base64,AAAA".to_string());
        let html = render_article_page(&item, &[&other], &SiteConfig::default(), &Links::query(), None);
        assert!(!html.contains("javascript:"));
        assert!(!html.contains("data:"));
        assert!(!html.contains("Читать в источнике"));
        assert!(!html.contains("article-image"));
    }

    #[test]
    fn not_found_explains_reason() {
        let html = render_not_found(NotFoundReason::InvalidIndex, &SiteConfig::default(), &Links::query());
        assert!(html.contains("Статья не найдена"));
        assert!(html.contains("Некорректный параметр ?i"));
    }
}
