//! URL canonicalization for duplicate detection.

use reqwest::Url;

const TRACKING_PREFIXES: &[&str] = &["utm_", "ga_"];
const TRACKING_PARAMS: &[&str] = &[
    "gclid", "yclid", "fbclid", "mc_cid", "mc_eid", "ref", "ref_src",
];

fn is_tracking_param(key: &str) -> bool {
    let lowered = key.to_ascii_lowercase();
    TRACKING_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
        || TRACKING_PARAMS.contains(&lowered.as_str())
}

/// Canonical form of an article URL.
///
/// Lowercases scheme and host, drops default ports, `www.`, fragments,
/// tracking and empty query parameters, sorts the rest and strips a
/// trailing slash from non-root paths. Unparseable input is returned
/// trimmed.
pub fn canonical_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let Ok(parsed) = Url::parse(trimmed) else {
        return trimmed.to_string();
    };
    let Some(host) = parsed.host_str() else {
        return trimmed.to_string();
    };

    let host = host.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let port = parsed
        .port()
        .map(|port| format!(":{port}"))
        .unwrap_or_default();

    let mut path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    if path == "/" {
        path.clear();
    }

    let mut pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, value)| !value.is_empty() && !is_tracking_param(key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    pairs.sort_by(|left, right| left.0.cmp(&right.0));

    let mut canonical = format!("{}://{host}{port}{path}", parsed.scheme());
    if !pairs.is_empty() {
        let query: Vec<(&str, String)> = pairs
            .iter()
            .map(|(key, value)| (key.as_str(), value.clone()))
            .collect();
        canonical.push('?');
        canonical.push_str(&crate::render::links::encode_query(&query));
    }
    canonical
}

/// Host of a URL without a leading `www.`, lowercased.
pub fn bare_host(raw: &str) -> String {
    Url::parse(raw.trim())
        .ok()
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
        .map(|host| host.strip_prefix("www.").unwrap_or(&host).to_string())
        .unwrap_or_default()
}
