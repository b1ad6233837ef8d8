// tests/key_index.rs
use std::fs;

use newsdesk_aggregator::collect::keys::ExistingKeys;
use newsdesk_aggregator::store::{cache, FailingStore, MemoryStore, RelationalStore};
use newsdesk_aggregator::Article;

fn art(url: &str, title: &str) -> Article {
    Article {
        title: title.into(),
        url: url.into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn unions_store_and_cache_file_keys() {
    let dir = tempfile::tempdir().unwrap();
    let cache_file = dir.path().join("01_rss_news.json");
    cache::append_articles(&cache_file, &[art("http://cached", "Cached Headline")]).unwrap();

    let store = MemoryStore::new();
    store
        .insert_articles(&[art("http://stored", "Stored Headline")])
        .await
        .unwrap();

    let keys = ExistingKeys::load(&store, &[cache_file]).await;
    assert!(keys.urls.contains("http://cached"));
    assert!(keys.urls.contains("http://stored"));
    assert!(keys.titles.contains("cached headline"));
    assert!(keys.titles.contains("stored headline"));
}

#[tokio::test]
async fn unreachable_store_degrades_to_cache_only() {
    let dir = tempfile::tempdir().unwrap();
    let cache_file = dir.path().join("01_rss_news.json");
    cache::append_articles(&cache_file, &[art("http://cached", "Cached Headline")]).unwrap();

    let keys = ExistingKeys::load(&FailingStore, &[cache_file]).await;
    assert_eq!(keys.urls.len(), 1);
    assert!(keys.urls.contains("http://cached"));
}

#[tokio::test]
async fn missing_and_corrupt_cache_files_read_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.json");
    let corrupt = dir.path().join("corrupt.json");
    fs::write(&corrupt, "{not json").unwrap();

    let keys = ExistingKeys::load(&MemoryStore::new(), &[missing, corrupt]).await;
    assert!(keys.urls.is_empty());
    assert!(keys.titles.is_empty());
}

#[tokio::test]
async fn empty_keys_are_not_indexed() {
    let store = MemoryStore::new();
    store
        .insert_articles(&[art("http://u", "")])
        .await
        .unwrap();

    let keys = ExistingKeys::load(&store, &[]).await;
    assert!(keys.titles.is_empty());
    assert!(keys.urls.contains("http://u"));
}
