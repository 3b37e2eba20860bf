use chrono::{TimeZone, Utc};
use newsdesk_core::feed::export::{read_feed, write_feed, write_meta, FeedMeta};
use newsdesk_core::feed::load::{load_feed, LoadError};
use newsdesk_core::ingest::fetch::{FeedFetcher, FetchError, FetchResult};
use newsdesk_core::normalize_feed;
use serde_json::json;
use std::cell::RefCell;

/// Serves a fixed body for one URL and records every request.
struct StubFetcher {
    url: &'static str,
    body: &'static str,
    requests: RefCell<Vec<String>>,
}

impl FeedFetcher for StubFetcher {
    fn fetch(&self, url: &str) -> FetchResult<Vec<u8>> {
        self.requests.borrow_mut().push(url.to_string());
        if url == self.url {
            Ok(self.body.as_bytes().to_vec())
        } else {
            Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }
}

#[test]
fn mixed_feed_versions_normalize_into_one_order() {
    let raw = json!({
        "items": [
            {"_id": "old", "headline": "Старый формат", "source_url": "https://old.test/a",
             "pubDate": "Tue, 05 Mar 2024 09:30:00 GMT", "rubrics": ["Рынок"]},
            {"title": "Новый формат", "url": "https://new.test/b",
             "published_at": "2024-03-06T10:00:00Z", "source": {"name": "Новое издание"},
             "images": [{"url": "https://new.test/b.jpg"}], "content": "Текст"},
            "not an object",
            {"name": "Без даты", "link": "https://x.test/c", "date": ""}
        ]
    });

    let items = normalize_feed(&raw);
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].title, "Новый формат");
    assert_eq!(items[0].source_label(), "Новое издание");
    assert_eq!(items[0].image.as_deref(), Some("https://new.test/b.jpg"));
    assert_eq!(items[0].body(), "Текст");
    assert_eq!(items[1].id.as_str(), "old");
    assert_eq!(items[1].tags, vec!["Рынок".to_string()]);
    assert_eq!(items[1].domain, "old.test");
    assert_eq!(items[2].title, "Без даты");
    assert!(items[2].published_at.is_none());
}

#[test]
fn exported_feed_reads_back_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("news.json");
    let raw = json!([
        {"title": "Первая", "url": "https://a.test/1", "published_at": "2024-03-01T08:00:00Z",
         "tags": ["грузовик"], "category": "Рынок", "summary": "Коротко"},
        {"title": "Вторая", "url": "https://a.test/2", "published_at": 1709366400}
    ]);
    let items = normalize_feed(&raw);

    write_feed(&path, &items).unwrap();
    assert_eq!(read_feed(&path).unwrap(), items);
    assert!(!dir.path().join("data").join("news.json.tmp").exists());
}

#[test]
fn missing_feed_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    assert!(read_feed(dir.path().join("absent.json")).unwrap().is_empty());
}

#[test]
fn meta_document_records_count_and_time() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("news_meta.json");
    let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();

    let meta = write_meta(&path, 42, now).unwrap();
    assert_eq!(meta.updated_at, "2024-03-10T12:00:00Z");

    let stored: FeedMeta = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(stored, meta);
    assert_eq!(stored.count, 42);
}

#[test]
fn loading_falls_back_through_locations() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{not json").unwrap();
    let fetcher = StubFetcher {
        url: "https://cdn.test/news.json",
        body: r#"[{"title": "С CDN", "url": "https://a.test/1"}]"#,
        requests: RefCell::new(Vec::new()),
    };
    let locations = vec![
        dir.path().join("missing.json").display().to_string(),
        broken.display().to_string(),
        "https://mirror.test/news.json".to_string(),
        "https://cdn.test/news.json".to_string(),
    ];

    let items = load_feed(&locations, &fetcher).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "С CDN");
    assert_eq!(
        *fetcher.requests.borrow(),
        vec![
            "https://mirror.test/news.json".to_string(),
            "https://cdn.test/news.json".to_string()
        ]
    );
}

#[test]
fn loading_reports_every_failed_location() {
    let fetcher = StubFetcher {
        url: "https://never.test/",
        body: "",
        requests: RefCell::new(Vec::new()),
    };
    let locations = vec![
        "/definitely/missing/news.json".to_string(),
        "https://mirror.test/news.json".to_string(),
    ];

    match load_feed(&locations, &fetcher).unwrap_err() {
        LoadError::AllFailed(attempts) => {
            assert_eq!(attempts.len(), 2);
            assert_eq!(attempts[1].0, "https://mirror.test/news.json");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(
        load_feed(&[], &fetcher).unwrap_err(),
        LoadError::NoLocations
    ));
}
