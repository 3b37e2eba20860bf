use chrono::{TimeZone, Utc};
use newsdesk_core::db::open_db_in_memory;
use newsdesk_core::repo::news_repo::{NewsListQuery, NewsRepository, RepoError, TagCount};
use newsdesk_core::service::archive_service::{ArchiveFilter, ArchiveService};
use newsdesk_core::{normalize_item, ItemId, NewsItem, SqliteNewsRepository};
use serde_json::json;

fn item(n: u32, category: Option<&str>, tags: &[&str]) -> NewsItem {
    let at = Utc.with_ymd_and_hms(2024, 3, 1, n, 0, 0).single();
    let mut item = NewsItem::new(
        format!("Заголовок {n}"),
        format!("https://news.test/{n}"),
        at,
    );
    item.source = "News Test".to_string();
    item.summary = format!("Краткое описание {n}");
    item.category = category.map(str::to_string);
    item.add_tags(tags);
    item
}

#[test]
fn upsert_then_get_round_trips_all_fields() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteNewsRepository::new(&mut conn);
    let mut original = item(1, Some("Рынок"), &["грузовик", "Лизинг"]);
    original.image = Some("https://news.test/1.jpg".to_string());
    original.content_html = "<p>Тело</p>".to_string();

    assert_eq!(repo.upsert_items(&[original.clone()]).unwrap(), 1);
    let loaded = repo.get_item(&original.id).unwrap().unwrap();
    assert_eq!(loaded, original);

    let missing = ItemId::parse("nope").unwrap();
    assert!(repo.get_item(&missing).unwrap().is_none());
}

#[test]
fn upsert_replaces_fields_and_tag_set() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteNewsRepository::new(&mut conn);
    let mut news = item(1, None, &["старый"]);
    repo.upsert_items(&[news.clone()]).unwrap();

    news.title = "Обновлено".to_string();
    news.tags = vec!["новый".to_string()];
    repo.upsert_items(&[news.clone()]).unwrap();

    let loaded = repo.get_item(&news.id).unwrap().unwrap();
    assert_eq!(loaded.title, "Обновлено");
    assert_eq!(loaded.tags, vec!["новый".to_string()]);
    assert_eq!(repo.count_items(&NewsListQuery::default()).unwrap(), 1);
}

#[test]
fn untitled_feed_entries_are_archived() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteNewsRepository::new(&mut conn);
    let untitled = normalize_item(&json!({"url": "https://news.test/untitled"})).unwrap();
    assert!(untitled.title.is_empty());

    assert_eq!(repo.upsert_items(&[item(1, None, &[]), untitled.clone()]).unwrap(), 2);
    let loaded = repo.get_item(&untitled.id).unwrap().unwrap();
    assert_eq!(loaded.title, "");
    assert_eq!(loaded.link, "https://news.test/untitled");
}

#[test]
fn invalid_item_aborts_whole_batch() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteNewsRepository::new(&mut conn);
    let mut broken = item(2, None, &[]);
    broken.id = serde_json::from_value(json!("  ")).unwrap();

    let err = repo.upsert_items(&[item(1, None, &[]), broken]).unwrap_err();
    assert!(matches!(err, RepoError::InvalidItem(_)));
    assert_eq!(repo.count_items(&NewsListQuery::default()).unwrap(), 0);
}

#[test]
fn listing_filters_by_tag_and_category_newest_first() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteNewsRepository::new(&mut conn);
    repo.upsert_items(&[
        item(1, Some("Рынок"), &["КАМАЗ"]),
        item(2, Some("Выставки"), &["камаз", "выставка"]),
        item(3, Some("Рынок"), &[]),
    ])
    .unwrap();

    let by_tag = repo
        .list_items(&NewsListQuery {
            tag: Some("камаз".to_string()),
            ..NewsListQuery::default()
        })
        .unwrap();
    let titles: Vec<&str> = by_tag.iter().map(|item| item.title.as_str()).collect();
    assert_eq!(titles, vec!["Заголовок 2", "Заголовок 1"]);

    let by_category = NewsListQuery {
        category: Some("Рынок".to_string()),
        ..NewsListQuery::default()
    };
    assert_eq!(repo.count_items(&by_category).unwrap(), 2);
    assert_eq!(repo.list_items(&by_category).unwrap()[0].title, "Заголовок 3");
    let other_case = NewsListQuery {
        category: Some("РЫНОК".to_string()),
        ..NewsListQuery::default()
    };
    assert_eq!(repo.count_items(&other_case).unwrap(), 0);

    let tags = repo.list_tags().unwrap();
    assert_eq!(
        tags[0],
        TagCount {
            name: "КАМАЗ".to_string(),
            count: 2
        }
    );
    assert_eq!(tags.len(), 2);
}

#[test]
fn archive_service_pages_and_clamps() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = ArchiveService::new(SqliteNewsRepository::new(&mut conn));
    let items: Vec<NewsItem> = (0..5).map(|n| item(n, None, &[])).collect();
    assert_eq!(service.ingest(&items).unwrap(), 5);
    assert_eq!(service.ingest(&[]).unwrap(), 0);

    let filter = ArchiveFilter::default();
    let second = service.page(&filter, 2, 2).unwrap();
    assert_eq!((second.page, second.pages, second.total), (2, 3, 5));
    assert_eq!(second.items[0].title, "Заголовок 2");

    let clamped = service.page(&filter, 99, 2).unwrap();
    assert_eq!(clamped.page, 3);
    assert_eq!(clamped.items.len(), 1);
    assert_eq!(clamped.items[0].title, "Заголовок 0");
}
