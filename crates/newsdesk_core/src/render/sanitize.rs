//! Allowlist sanitizer for feed-provided HTML and URL scheme checks.
//!
//! # Invariants
//! - Every emitted tag is rebuilt from its parsed name and allowed
//!   attributes; nothing from the source tag is copied verbatim.
//! - Attribute values are entity-decoded before checks and re-escaped on
//!   output, so the browser reads exactly the value that was checked.
//! - Content of dropped containers (`script`, `svg`, `math`, ...) never
//!   reaches the output.

use crate::normalize::text::decode_entities;
use crate::render::html::escape_html;
use reqwest::Url;

const ALLOWED_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "blockquote", "br", "caption", "cite", "code", "dd", "div", "dl", "dt", "em",
    "figcaption", "figure", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "li", "ol", "p",
    "pre", "q", "s", "small", "span", "strong", "sub", "sup", "table", "tbody", "td", "tfoot",
    "th", "thead", "tr", "u", "ul",
];

/// Elements dropped together with everything inside them.
const DROPPED_CONTAINERS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "svg", "math", "template", "noscript",
    "noembed", "noframes", "textarea", "title", "select", "xmp", "frameset",
];

const VOID_ELEMENTS: &[&str] = &["br", "hr", "img"];

/// Where a URL ends up in the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    /// In-body `href`: http(s), mailto or relative.
    Link,
    /// Image `src`: http(s) or relative.
    Media,
    /// Outbound link to the original article: absolute http(s) only.
    External,
}

impl UrlKind {
    fn schemes(self) -> &'static [&'static str] {
        match self {
            Self::Link => &["http", "https", "mailto"],
            Self::Media | Self::External => &["http", "https"],
        }
    }

    fn allows_relative(self) -> bool {
        !matches!(self, Self::External)
    }
}

/// Returns the URL ready for an attribute when its scheme is allowed.
///
/// Tabs and newlines are removed and surrounding control characters
/// trimmed first, as browsers do before resolving a URL.
pub fn checked_url(raw: &str, kind: UrlKind) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|ch| !matches!(ch, '\t' | '\n' | '\r'))
        .collect();
    let cleaned = cleaned.trim_matches(|ch: char| ch <= ' ').to_string();
    if cleaned.is_empty() {
        return None;
    }

    if has_scheme(&cleaned) {
        let url = Url::parse(&cleaned).ok()?;
        return kind.schemes().contains(&url.scheme()).then_some(cleaned);
    }
    kind.allows_relative().then_some(cleaned)
}

/// `scheme ":"` prefix as URL parsers recognise it.
fn has_scheme(value: &str) -> bool {
    let Some((prefix, _)) = value.split_once(':') else {
        return false;
    };
    let mut chars = prefix.chars();
    chars.next().is_some_and(|ch| ch.is_ascii_alphabetic())
        && chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.'))
}

/// Strips active content from feed-provided HTML.
///
/// Keeps a fixed set of formatting elements with a fixed set of
/// attributes, drops `on*` handlers, `style` and any URL whose scheme is
/// not http(s) (or mailto for links), and marks images for lazy loading.
pub fn sanitize_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    let mut dropping: Option<(String, usize)> = None;

    while let Some(lt) = rest.find('<') {
        let (text, tail) = rest.split_at(lt);
        if dropping.is_none() {
            out.push_str(text);
        }
        match read_markup(tail) {
            Markup::Stray => {
                if dropping.is_none() {
                    out.push_str("&lt;");
                }
                rest = &tail[1..];
            }
            Markup::Skip(len) => rest = &tail[len..],
            Markup::Tag(tag, len) => {
                rest = &tail[len..];
                if let Some((container, depth)) = dropping.as_mut() {
                    if tag.name == *container {
                        if tag.closing {
                            *depth -= 1;
                        } else {
                            *depth += 1;
                        }
                    }
                    if *depth == 0 {
                        dropping = None;
                    }
                    continue;
                }
                if DROPPED_CONTAINERS.contains(&tag.name.as_str()) {
                    if !tag.closing {
                        dropping = Some((tag.name, 1));
                    }
                    continue;
                }
                if ALLOWED_ELEMENTS.contains(&tag.name.as_str()) {
                    emit_tag(&mut out, &tag);
                }
            }
        }
    }
    if dropping.is_none() {
        out.push_str(rest);
    }
    out
}

#[derive(Debug)]
struct Tag {
    name: String,
    closing: bool,
    attrs: Vec<(String, Option<String>)>,
}

enum Markup {
    /// `<` that does not open markup.
    Stray,
    /// Comment, doctype, processing instruction or unterminated tag.
    Skip(usize),
    Tag(Tag, usize),
}

fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0c)
}

/// Reads the markup at the start of `input`, which begins with `<`.
fn read_markup(input: &str) -> Markup {
    let bytes = input.as_bytes();
    if input.starts_with("<!--") {
        return Markup::Skip(input[4..].find("-->").map_or(input.len(), |end| end + 7));
    }
    match bytes.get(1) {
        Some(b'!' | b'?') => return skip_to_gt(input),
        Some(b'/') if !bytes.get(2).is_some_and(u8::is_ascii_alphabetic) => {
            return skip_to_gt(input);
        }
        Some(b'/') => {}
        Some(byte) if byte.is_ascii_alphabetic() => {}
        _ => return Markup::Stray,
    }

    let closing = bytes[1] == b'/';
    let mut pos = if closing { 2 } else { 1 };
    let name_start = pos;
    while pos < bytes.len() && !is_space(bytes[pos]) && !matches!(bytes[pos], b'/' | b'>') {
        pos += 1;
    }
    let name = input[name_start..pos].to_ascii_lowercase();
    let mut attrs = Vec::new();

    loop {
        while pos < bytes.len() && (is_space(bytes[pos]) || bytes[pos] == b'/') {
            pos += 1;
        }
        match bytes.get(pos) {
            None => return Markup::Skip(input.len()),
            Some(b'>') => {
                let tag = Tag {
                    name,
                    closing,
                    attrs,
                };
                return Markup::Tag(tag, pos + 1);
            }
            Some(_) => {}
        }

        let attr_start = pos;
        pos += 1;
        while pos < bytes.len()
            && !is_space(bytes[pos])
            && !matches!(bytes[pos], b'/' | b'>' | b'=')
        {
            pos += 1;
        }
        let attr_name = input[attr_start..pos].to_ascii_lowercase();

        let mut look = pos;
        while look < bytes.len() && is_space(bytes[look]) {
            look += 1;
        }
        if bytes.get(look) != Some(&b'=') {
            attrs.push((attr_name, None));
            continue;
        }
        pos = look + 1;
        while pos < bytes.len() && is_space(bytes[pos]) {
            pos += 1;
        }
        let value = match bytes.get(pos) {
            None => return Markup::Skip(input.len()),
            Some(&quote) if quote == b'"' || quote == b'\'' => {
                let Some(len) = input[pos + 1..].find(quote as char) else {
                    return Markup::Skip(input.len());
                };
                let value = &input[pos + 1..pos + 1 + len];
                pos += len + 2;
                value
            }
            Some(_) => {
                let value_start = pos;
                while pos < bytes.len() && !is_space(bytes[pos]) && bytes[pos] != b'>' {
                    pos += 1;
                }
                &input[value_start..pos]
            }
        };
        attrs.push((attr_name, Some(value.to_string())));
    }
}

fn skip_to_gt(input: &str) -> Markup {
    Markup::Skip(input.find('>').map_or(input.len(), |end| end + 1))
}

enum AttrRule {
    Plain,
    Url(UrlKind),
}

fn attr_rule(element: &str, attr: &str) -> Option<AttrRule> {
    match (element, attr) {
        (_, "title" | "lang" | "dir") => Some(AttrRule::Plain),
        ("a", "href") => Some(AttrRule::Url(UrlKind::Link)),
        ("blockquote" | "q", "cite") => Some(AttrRule::Url(UrlKind::Link)),
        ("img", "src") => Some(AttrRule::Url(UrlKind::Media)),
        ("img", "alt" | "width" | "height" | "loading") => Some(AttrRule::Plain),
        ("td" | "th", "colspan" | "rowspan") => Some(AttrRule::Plain),
        ("ol", "start") => Some(AttrRule::Plain),
        _ => None,
    }
}

fn emit_tag(out: &mut String, tag: &Tag) {
    if tag.closing {
        if !VOID_ELEMENTS.contains(&tag.name.as_str()) {
            out.push_str(&format!("</{}>", tag.name));
        }
        return;
    }

    out.push('<');
    out.push_str(&tag.name);
    if tag.name == "img" && !tag.attrs.iter().any(|(name, _)| name == "loading") {
        out.push_str(" loading=\"lazy\"");
    }
    let mut seen: Vec<&str> = Vec::new();
    for (name, value) in &tag.attrs {
        // The first occurrence of an attribute wins, as in browsers.
        if seen.contains(&name.as_str()) {
            continue;
        }
        seen.push(name.as_str());
        let Some(rule) = attr_rule(&tag.name, name) else {
            continue;
        };
        let decoded = value.as_deref().map(decode_entities);
        match (rule, decoded) {
            (AttrRule::Plain, None) => out.push_str(&format!(" {name}")),
            (AttrRule::Plain, Some(value)) => {
                out.push_str(&format!(" {name}=\"{}\"", escape_html(&value)));
            }
            (AttrRule::Url(kind), Some(value)) => {
                if let Some(url) = checked_url(&value, kind) {
                    out.push_str(&format!(" {name}=\"{}\"", escape_html(&url)));
                }
            }
            (AttrRule::Url(_), None) => {}
        }
    }
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::{checked_url, sanitize_html, UrlKind};

    #[test]
    fn scripts_handlers_and_js_urls_are_removed() {
        let dirty = r#"<p onclick="steal()">Hi<script>alert(1)</script></p><iframe src="x"></iframe><a href="javascript:void(0)">x</a>"#;
        assert_eq!(sanitize_html(dirty), "<p>Hi</p><a>x</a>");
    }

    #[test]
    fn slash_separated_and_unquoted_payloads_are_removed() {
        let dirty = r#"<img/onerror=alert(1) src=x><a href=javascript:alert(2)>x</a>"#;
        assert_eq!(
            sanitize_html(dirty),
            r#"<img loading="lazy" src="x"><a>x</a>"#
        );
    }

    #[test]
    fn entity_encoded_and_obfuscated_schemes_are_removed() {
        let dirty = concat!(
            r#"<a href="&#106;avascript:alert(1)">a</a>"#,
            r#"<a href="java&#x09;script:alert(1)">b</a>"#,
            r#"<a href=" JaVaScRiPt:alert(1)">c</a>"#,
            r#"<img src="data:image/svg+xml,<svg onload=alert(1)>">"#,
        );
        assert_eq!(
            sanitize_html(dirty),
            r#"<a>a</a><a>b</a><a>c</a><img loading="lazy">"#
        );
    }

    #[test]
    fn svg_and_math_subtrees_are_dropped() {
        let dirty = "<p>a<svg><svg></svg><script>x</script>hidden</svg>b\
                     <math><mi xlink:href=\"javascript:x\">m</mi></math>c</p>";
        assert_eq!(sanitize_html(dirty), "<p>abc</p>");
    }

    #[test]
    fn unknown_elements_and_attributes_are_unwrapped() {
        let dirty = r#"<font color="red" style="x:y">Hi</font><p class="x" title="a &amp; b">t</p><!-- c -->"#;
        assert_eq!(sanitize_html(dirty), r#"Hi<p title="a &amp; b">t</p>"#);
    }

    #[test]
    fn safe_links_and_images_survive() {
        let html = r#"<a href="https://a.test/x?a=1&amp;b=2">x</a><a href="/local">y</a><img loading="eager" src="b.jpg">"#;
        assert_eq!(
            sanitize_html(html),
            r#"<a href="https://a.test/x?a=1&amp;b=2">x</a><a href="/local">y</a><img loading="eager" src="b.jpg">"#
        );
    }

    #[test]
    fn stray_angle_brackets_and_unterminated_tags() {
        assert_eq!(sanitize_html("1 < 2 <b>ok</b>"), "1 &lt; 2 <b>ok</b>");
        assert_eq!(sanitize_html("text <img src=x onerror=alert(1)"), "text ");
    }

    #[test]
    fn url_kinds_restrict_schemes() {
        assert_eq!(
            checked_url("https://a.test/x", UrlKind::External).as_deref(),
            Some("https://a.test/x")
        );
        assert_eq!(checked_url("/x", UrlKind::External), None);
        assert_eq!(checked_url("javascript:alert(1)", UrlKind::Link), None);
        assert_eq!(checked_url("\tjava\nscript:alert(1)", UrlKind::Media), None);
        assert_eq!(
            checked_url("mailto:desk@a.test", UrlKind::Link).as_deref(),
            Some("mailto:desk@a.test")
        );
        assert_eq!(checked_url("mailto:desk@a.test", UrlKind::Media), None);
        assert_eq!(checked_url("img/a.jpg", UrlKind::Media).as_deref(), Some("img/a.jpg"));
    }
}
