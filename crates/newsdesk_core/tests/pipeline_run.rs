use chrono::{TimeZone, Utc};
use newsdesk_core::config::{ClassifyRules, SourceConfig};
use newsdesk_core::ingest::collect::collect;
use newsdesk_core::ingest::fetch::{FeedFetcher, FetchError, FetchResult};
use newsdesk_core::pipeline::run::process;
use newsdesk_core::{run_pipeline, NewsItem, NewsdeskConfig};
use std::collections::HashMap;

const TRUCKS_RSS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
<channel><title>Грузовики</title>
<item>
  <title>Премьера нового тягача</title>
  <link>https://trucks.test/news/1?utm_source=rss</link>
  <description>Компания показала тягач на выставке.</description>
  <pubDate>Tue, 05 Mar 2024 09:30:00 GMT</pubDate>
  <media:content url="https://trucks.test/1.jpg" medium="image"/>
</item>
<item>
  <title>Премьера нового тягача</title>
  <link>https://www.trucks.test/news/1</link>
  <description>Повтор с другим адресом.</description>
  <pubDate>Tue, 05 Mar 2024 09:45:00 GMT</pubDate>
</item>
<item>
  <title>Скидки на шины</title>
  <link>https://trucks.test/news/2</link>
  <description>Реклама партнёра.</description>
  <pubDate>Wed, 06 Mar 2024 10:00:00 GMT</pubDate>
</item>
<item>
  <title>Архивная заметка</title>
  <link>https://trucks.test/news/3</link>
  <pubDate>Mon, 02 Jan 2023 10:00:00 GMT</pubDate>
</item>
</channel></rss>"#;

const WIRE_ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
<title>Лента</title>
<entry>
  <title>Заявление агентства</title>
  <link href="https://tass.ru/ekonomika/1"/>
  <updated>2024-03-07T08:00:00Z</updated>
</entry>
<entry>
  <title>Автобусы для города</title>
  <link rel="alternate" href="https://buses.test/a"/>
  <summary>Город закупил электробусы.</summary>
  <published>2024-03-08T08:00:00Z</published>
  <category term="Транспорт"/>
</entry>
</feed>"#;

struct MapFetcher(HashMap<&'static str, &'static str>);

impl FeedFetcher for MapFetcher {
    fn fetch(&self, url: &str) -> FetchResult<Vec<u8>> {
        self.0
            .get(url)
            .map(|body| body.as_bytes().to_vec())
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 503,
            })
    }
}

fn fetcher() -> MapFetcher {
    MapFetcher(HashMap::from([
        ("https://trucks.test/rss", TRUCKS_RSS),
        ("https://wire.test/atom", WIRE_ATOM),
    ]))
}

fn source(name: &str, url: &str) -> SourceConfig {
    SourceConfig {
        name: name.to_string(),
        url: url.to_string(),
    }
}

fn config() -> NewsdeskConfig {
    let mut config = NewsdeskConfig::default();
    config.sources = vec![
        source("Trucks", "https://trucks.test/rss"),
        source("Down", "https://down.test/rss"),
        source("Wire", "https://wire.test/atom"),
        source("Empty", "  "),
    ];
    config.classify = ClassifyRules(vec![
        ("Выставки".to_string(), vec!["выставк".to_string()]),
        ("Новые модели".to_string(), vec!["премьер".to_string()]),
    ]);
    config.exclude.keywords = vec!["реклама".to_string()];
    config
}

#[test]
fn collect_isolates_failing_sources() {
    let (items, reports) = collect(&config().sources, &fetcher(), 2);

    assert_eq!(items.len(), 4);
    assert_eq!(reports[0].collected, 2);
    assert!(reports[1].error.is_some());
    assert_eq!(reports[2].collected, 2);
    assert!(reports[3].error.is_some());
    assert_eq!(items[0].source, "Trucks");
}

#[test]
fn pipeline_filters_classifies_and_dedupes() {
    let now = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
    let outcome = run_pipeline(&config(), &fetcher(), Vec::new(), now).unwrap();
    let report = &outcome.report;

    assert_eq!(report.fresh, 6);
    assert_eq!(report.blocked, 1);
    assert_eq!(report.excluded, 1);
    assert_eq!(report.too_old, 1);

    let titles: Vec<&str> = outcome.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Автобусы для города", "Премьера нового тягача"]);
    assert_eq!(report.merged, 2);

    let truck = &outcome.items[1];
    assert_eq!(truck.category.as_deref(), Some("Выставки"));
    assert_eq!(truck.image.as_deref(), Some("https://trucks.test/1.jpg"));
    assert_eq!(outcome.items[0].tags.first().map(String::as_str), Some("Транспорт"));
    assert_eq!(report.top_domain.as_ref().map(|(_, count)| *count), Some(1));
}

#[test]
fn existing_items_are_merged_and_capped() {
    let now = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
    let mut config = config();
    config.limits.global_limit = 2;

    let old = |n: u32| {
        NewsItem::new(
            format!("Старая {n}"),
            format!("https://old.test/{n}"),
            Utc.with_ymd_and_hms(2024, 2, 1, n, 0, 0).single(),
        )
    };
    let existing = vec![old(1), old(2), old(2)];

    let outcome = process(&config, Vec::new(), existing, now).unwrap();
    assert_eq!(outcome.report.existing, 3);
    assert_eq!(outcome.items.len(), 2);
    assert_eq!(outcome.items[0].title, "Старая 2");
    assert_eq!(outcome.items[1].title, "Старая 1");

    let fresh = vec![NewsItem::new(
        "Свежая",
        "https://new.test/1",
        Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).single(),
    )];
    let merged = process(&config, fresh, outcome.items, now).unwrap();
    let titles: Vec<&str> = merged.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Свежая", "Старая 2"]);
}
