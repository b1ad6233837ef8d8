// tests/persist_sinks.rs
use std::sync::Arc;

use newsdesk_aggregator::store::{
    cache, FailingMirror, FailingStore, MemoryMirror, MemoryStore, MultiSinkWriter,
};
use newsdesk_aggregator::Article;

fn art(url: &str, title: &str) -> Article {
    Article {
        title: title.into(),
        url: url.into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn repeated_persist_is_idempotent_per_sink_contract() {
    let dir = tempfile::tempdir().unwrap();
    let writer = MultiSinkWriter::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryMirror::new()),
        dir.path(),
    );
    let batch = [art("http://a", "Fed Cuts Rates")];

    let first = writer.persist(&batch, "02_newsapi_ai.json").await;
    assert_eq!(first.db_count, 1);
    assert_eq!(first.inserted.len(), 1);
    assert_eq!(first.cache_count, 1);
    assert_eq!(first.mirror_count, 1);

    // Second time: the unique constraint rejects the repeat, the mirror
    // upsert still reports a write, the cache appends blindly.
    let second = writer.persist(&batch, "02_newsapi_ai.json").await;
    assert_eq!(second.db_count, 0);
    assert!(second.inserted.is_empty());
    assert_eq!(second.cache_count, 1);
    assert_eq!(second.mirror_count, 1);
    assert_eq!(
        cache::article_count(&dir.path().join("02_newsapi_ai.json")),
        2
    );
}

#[tokio::test]
async fn unreachable_relational_store_does_not_block_other_sinks() {
    let dir = tempfile::tempdir().unwrap();
    let writer = MultiSinkWriter::new(
        Arc::new(FailingStore),
        Arc::new(MemoryMirror::new()),
        dir.path(),
    );

    let outcome = writer
        .persist(&[art("http://a", "One"), art("http://b", "Two")], "x.json")
        .await;
    assert_eq!(outcome.db_count, 0);
    assert!(outcome.inserted.is_empty());
    assert_eq!(outcome.cache_count, 2);
    assert_eq!(outcome.mirror_count, 2);
}

#[tokio::test]
async fn unreachable_mirror_does_not_block_other_sinks() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new());
    let writer = MultiSinkWriter::new(store.clone(), Arc::new(FailingMirror), dir.path());

    let outcome = writer.persist(&[art("http://a", "One")], "x.json").await;
    assert_eq!(outcome.mirror_count, 0);
    assert_eq!(outcome.db_count, 1);
    assert_eq!(outcome.cache_count, 1);
    assert_eq!(store.articles().len(), 1);
}

#[tokio::test]
async fn empty_batch_touches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let writer = MultiSinkWriter::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryMirror::new()),
        dir.path(),
    );

    let outcome = writer.persist(&[], "x.json").await;
    assert_eq!(outcome.db_count, 0);
    assert_eq!(outcome.cache_count, 0);
    assert_eq!(outcome.mirror_count, 0);
    assert!(!dir.path().join("x.json").exists());
}
