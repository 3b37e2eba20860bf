//! RSS 2.0 / Atom parsing with quick-xml.
//!
//! # Invariants
//! - Only direct children of `<item>`/`<entry>` populate entry fields.
//! - Undecodable entities degrade to lossy text instead of failing the feed.

use crate::model::item::{host_of, NewsItem};
use crate::normalize::date::parse_datetime;
use crate::normalize::text::{decode_entities, norm_text};
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

const UNTITLED: &str = "(без заголовка)";

static IMG_SRC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#).expect("valid img src regex")
});

pub type FeedParseResult<T> = Result<T, FeedParseError>;

#[derive(Debug)]
pub struct FeedParseError {
    pub position: u64,
    pub source: quick_xml::Error,
}

impl Display for FeedParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed feed at byte {}: {}", self.position, self.source)
    }
}

impl Error for FeedParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// One `<item>` or `<entry>` as found in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub content: String,
    pub published: Option<String>,
    pub updated: Option<String>,
    pub media_content: Option<String>,
    pub media_thumbnail: Option<String>,
    pub enclosure_image: Option<String>,
    pub categories: Vec<String>,
}

impl FeedEntry {
    /// First usable image: media content, image enclosure, thumbnail,
    /// then the first `<img>` in the body.
    pub fn image(&self) -> Option<String> {
        self.media_content
            .clone()
            .or_else(|| self.enclosure_image.clone())
            .or_else(|| self.media_thumbnail.clone())
            .or_else(|| first_img_src(&self.summary))
            .or_else(|| first_img_src(&self.content))
    }

    /// Converts the raw entry into a canonical item attributed to `source`.
    pub fn into_item(self, source: &str) -> NewsItem {
        let image = self.image();
        let title = norm_text(&self.title);
        let title = if title.is_empty() {
            UNTITLED.to_string()
        } else {
            title
        };
        let published_at = self
            .published
            .as_deref()
            .and_then(parse_datetime)
            .or_else(|| self.updated.as_deref().and_then(parse_datetime));

        let mut item = NewsItem::new(title, self.link.trim(), published_at);
        item.domain = host_of(&item.link).unwrap_or_default();
        item.source = source.to_string();
        item.summary = if self.summary.trim().is_empty() {
            self.content.trim().to_string()
        } else {
            self.summary.trim().to_string()
        };
        item.content_html = self.content.trim().to_string();
        item.image = image;
        item.add_tags(self.categories.iter());
        item
    }
}

fn first_img_src(html: &str) -> Option<String> {
    IMG_SRC_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| decode_entities(m.as_str().trim()))
        .filter(|src| !src.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Summary,
    Content,
    Published,
    Updated,
    Category,
}

fn field_for(name: &[u8]) -> Option<Field> {
    match name {
        b"title" => Some(Field::Title),
        b"link" => Some(Field::Link),
        b"description" | b"summary" => Some(Field::Summary),
        b"content:encoded" | b"content" => Some(Field::Content),
        b"pubDate" | b"published" | b"dc:date" => Some(Field::Published),
        b"updated" | b"atom:updated" => Some(Field::Updated),
        b"category" | b"dc:subject" => Some(Field::Category),
        _ => None,
    }
}

fn is_entry(name: &[u8]) -> bool {
    matches!(name, b"item" | b"entry")
}

fn attr(start: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    start
        .attributes()
        .flatten()
        .find(|attribute| attribute.key.as_ref() == key)
        .and_then(|attribute| attribute.unescape_value().ok().map(|v| v.trim().to_string()))
        .filter(|value| !value.is_empty())
}

fn text_of(text: &BytesText<'_>) -> String {
    match text.unescape() {
        Ok(value) => value.into_owned(),
        Err(_) => decode_entities(&String::from_utf8_lossy(text)),
    }
}

/// Applies attributes of a direct entry child (`<link href>`, media, enclosure).
fn apply_attributes(entry: &mut FeedEntry, start: &BytesStart<'_>) {
    match start.name().as_ref() {
        b"link" => {
            let rel = attr(start, b"rel");
            if matches!(rel.as_deref(), None | Some("alternate")) && entry.link.is_empty() {
                if let Some(href) = attr(start, b"href") {
                    entry.link = href;
                }
            }
            if rel.as_deref() == Some("enclosure") {
                let is_image = attr(start, b"type").is_some_and(|t| t.starts_with("image/"));
                if is_image && entry.enclosure_image.is_none() {
                    entry.enclosure_image = attr(start, b"href");
                }
            }
        }
        b"media:content" => {
            let medium_ok = attr(start, b"medium").map_or(true, |m| m == "image");
            let type_ok = attr(start, b"type").map_or(true, |t| t.starts_with("image/"));
            if medium_ok && type_ok && entry.media_content.is_none() {
                entry.media_content = attr(start, b"url");
            }
        }
        b"media:thumbnail" => {
            if entry.media_thumbnail.is_none() {
                entry.media_thumbnail = attr(start, b"url");
            }
        }
        b"enclosure" => {
            let is_image = attr(start, b"type")
                .is_some_and(|t| t.starts_with("image/") || t.starts_with("img/"));
            if is_image && entry.enclosure_image.is_none() {
                entry.enclosure_image = attr(start, b"url");
            }
        }
        b"category" => {
            if let Some(term) = attr(start, b"term") {
                entry.categories.push(term);
            }
        }
        _ => {}
    }
}

fn commit(entry: &mut FeedEntry, field: Field, value: String) {
    let value = value.trim().to_string();
    if value.is_empty() {
        return;
    }
    match field {
        Field::Title => entry.title = value,
        Field::Link => {
            if entry.link.is_empty() {
                entry.link = value;
            }
        }
        Field::Summary => entry.summary = value,
        Field::Content => entry.content = value,
        Field::Published => entry.published = Some(value),
        Field::Updated => entry.updated = Some(value),
        Field::Category => entry.categories.push(value),
    }
}

/// Parses an RSS 2.0 or Atom document into raw entries.
pub fn parse_feed(bytes: &[u8]) -> FeedParseResult<Vec<FeedEntry>> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);
    reader.config_mut().check_end_names = false;

    let mut entries = Vec::new();
    let mut buf = Vec::new();
    let mut depth: usize = 0;
    let mut entry_depth: Option<usize> = None;
    let mut current = FeedEntry::default();
    let mut field: Option<Field> = None;
    let mut text = String::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|source| FeedParseError {
                position: reader.buffer_position(),
                source,
            })?;
        match event {
            Event::Start(start) => {
                depth += 1;
                match entry_depth {
                    None if is_entry(start.name().as_ref()) => {
                        entry_depth = Some(depth);
                        current = FeedEntry::default();
                    }
                    Some(at) if depth == at + 1 => {
                        apply_attributes(&mut current, &start);
                        field = field_for(start.name().as_ref());
                        text.clear();
                    }
                    _ => {}
                }
            }
            Event::Empty(start) => {
                if matches!(entry_depth, Some(at) if depth == at) {
                    apply_attributes(&mut current, &start);
                }
            }
            Event::Text(value) => {
                if field.is_some() {
                    text.push_str(&text_of(&value));
                }
            }
            Event::CData(value) => {
                if field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&value.into_inner()));
                }
            }
            Event::End(_) => {
                match entry_depth {
                    Some(at) if depth == at => {
                        entries.push(std::mem::take(&mut current));
                        entry_depth = None;
                    }
                    Some(at) if depth == at + 1 => {
                        if let Some(done) = field.take() {
                            commit(&mut current, done, std::mem::take(&mut text));
                        }
                    }
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::parse_feed;

    #[test]
    fn rss_item_fields_and_media_are_read() {
        let xml = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
<channel><title>Channel</title>
<item>
  <title>Новый &amp; тягач</title>
  <link>https://auto.test/a</link>
  <description><![CDATA[<p>Lead <img src="https://auto.test/inline.jpg"></p>]]></description>
  <pubDate>Tue, 05 Mar 2024 09:30:00 GMT</pubDate>
  <media:thumbnail url="https://auto.test/thumb.jpg"/>
  <category>Рынок</category>
</item>
</channel></rss>"#
            .as_bytes();
        let entries = parse_feed(xml).unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.title, "Новый & тягач");
        assert_eq!(entry.link, "https://auto.test/a");
        assert!(entry.summary.contains("<img"));
        assert_eq!(entry.image().as_deref(), Some("https://auto.test/thumb.jpg"));
        assert_eq!(entry.categories, vec!["Рынок".to_string()]);
    }

    #[test]
    fn channel_title_is_not_taken_as_entry_title() {
        let xml = r#"<rss><channel><title>Channel</title><item><link>https://x.test/1</link></item></channel></rss>"#
            .as_bytes();
        let entries = parse_feed(xml).unwrap();
        assert_eq!(entries[0].title, "");
        let item = entries[0].clone().into_item("X");
        assert_eq!(item.title, "(без заголовка)");
        assert_eq!(item.domain, "x.test");
    }

    #[test]
    fn atom_links_and_dates_are_read() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
<entry>
  <title type="html">Atom entry</title>
  <link rel="alternate" href="https://atom.test/e1"/>
  <link rel="enclosure" type="image/png" href="https://atom.test/e1.png"/>
  <updated>2024-03-05T09:30:00Z</updated>
  <content type="html">&lt;p&gt;Body&lt;/p&gt;</content>
  <category term="Выставки"/>
</entry>
</feed>"#
            .as_bytes();
        let entries = parse_feed(xml).unwrap();
        let item = entries[0].clone().into_item("Atom");
        assert_eq!(item.link, "https://atom.test/e1");
        assert_eq!(item.image.as_deref(), Some("https://atom.test/e1.png"));
        assert_eq!(item.summary, "<p>Body</p>");
        assert_eq!(item.tags, vec!["Выставки".to_string()]);
        assert!(item.published_at.is_some());
    }
}
