// tests/cache_roundtrip.rs
use std::fs;

use chrono::{TimeZone, Utc};
use newsdesk_aggregator::store::cache;
use newsdesk_aggregator::Article;

fn art(url: &str, title: &str) -> Article {
    Article {
        title: title.into(),
        url: url.into(),
        published_at: Some(Utc.with_ymd_and_hms(2024, 7, 30, 14, 5, 0).unwrap()),
        source_name: Some("Market News".into()),
        authors: vec!["Jane Doe".into()],
        tickers: vec!["SPY".into()],
        topics: vec!["rates".into()],
        ..Default::default()
    }
}

#[test]
fn append_then_read_reproduces_articles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("05_tiingo.json");

    let original = vec![art("http://a", "Fed Cuts Rates"), art("http://b", "Dollar Slips")];
    let appended = cache::append_articles(&path, &original).unwrap();
    assert_eq!(appended, 2);

    let reloaded = cache::read_articles(&path);
    assert_eq!(reloaded, original);
    // Timestamps survive the ISO-8601 round trip exactly.
    assert_eq!(reloaded[0].published_at, original[0].published_at);
}

#[test]
fn missing_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    assert!(cache::read_articles(&dir.path().join("absent.json")).is_empty());
}

#[test]
fn corrupt_file_reads_as_empty_and_is_rewritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "][ not json").unwrap();

    assert!(cache::read_articles(&path).is_empty());
    cache::append_articles(&path, &[art("http://a", "Recovered")]).unwrap();
    assert_eq!(cache::read_articles(&path).len(), 1);
}

#[test]
fn cache_layer_does_not_dedupe() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("01_rss_news.json");

    let one = [art("http://same", "Same Article")];
    cache::append_articles(&path, &one).unwrap();
    cache::append_articles(&path, &one).unwrap();
    assert_eq!(cache::article_count(&path), 2);
}
