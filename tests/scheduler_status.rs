// tests/scheduler_status.rs
use std::sync::Arc;
use std::time::Duration;

use newsdesk_aggregator::collect::scheduler::Scheduler;
use newsdesk_aggregator::collect::types::{Collector, Family};
use newsdesk_aggregator::live_log::LiveLog;
use newsdesk_aggregator::store::{MemoryMirror, MemoryStore, MultiSinkWriter};
use newsdesk_aggregator::Article;

struct StubCollector {
    articles: Vec<Article>,
    fail: bool,
}

#[async_trait::async_trait]
impl Collector for StubCollector {
    async fn fetch_and_transform(&self) -> anyhow::Result<Vec<Article>> {
        if self.fail {
            anyhow::bail!("upstream down");
        }
        Ok(self.articles.clone())
    }

    fn name(&self) -> &'static str {
        "stub"
    }

    fn cache_file(&self) -> &'static str {
        "stub.json"
    }
}

fn art(url: &str, title: &str) -> Article {
    Article {
        title: title.into(),
        url: url.into(),
        ..Default::default()
    }
}

fn scheduler_with(
    dir: &tempfile::TempDir,
    api: Vec<Box<dyn Collector>>,
) -> Arc<Scheduler> {
    let writer = Arc::new(MultiSinkWriter::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryMirror::new()),
        dir.path(),
    ));
    Arc::new(Scheduler::new(writer, LiveLog::new(16), api, Vec::new()))
}

#[tokio::test]
async fn never_started_family_reports_idle() {
    let dir = tempfile::tempdir().unwrap();
    let scheduler = scheduler_with(&dir, Vec::new());

    let status = scheduler.status(Family::Api);
    assert!(!status.running);
    assert!(status.last_run_at.is_none());
    assert_eq!(status.new_count_session, 0);
    assert!(!status.error_flag);
}

#[tokio::test]
async fn manual_run_updates_status_and_dedupes_reruns() {
    let dir = tempfile::tempdir().unwrap();
    let scheduler = scheduler_with(
        &dir,
        vec![Box::new(StubCollector {
            articles: vec![art("http://a", "One"), art("http://b", "Two")],
            fail: false,
        })],
    );

    let summary = scheduler.run_family_once(Family::Api).await;
    assert_eq!(summary.new_articles.len(), 2);
    assert!(!summary.had_error);

    let status = scheduler.status(Family::Api);
    assert!(status.last_run_at.is_some());
    assert_eq!(status.new_count_session, 2);
    assert!(!status.error_flag);

    // Same batch again: everything collides with durable state.
    let rerun = scheduler.run_family_once(Family::Api).await;
    assert!(rerun.new_articles.is_empty());
    assert_eq!(rerun.duplicates, 2);
    assert_eq!(scheduler.status(Family::Api).new_count_session, 2);
}

#[tokio::test]
async fn failing_collector_sets_error_flag_but_spares_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let scheduler = scheduler_with(
        &dir,
        vec![
            Box::new(StubCollector {
                articles: Vec::new(),
                fail: true,
            }),
            Box::new(StubCollector {
                articles: vec![art("http://ok", "Still Works")],
                fail: false,
            }),
        ],
    );

    let summary = scheduler.run_family_once(Family::Api).await;
    assert!(summary.had_error);
    assert_eq!(summary.new_articles.len(), 1);
    assert!(scheduler.status(Family::Api).error_flag);

    // The flag clears at the start of the next clean run.
    let scheduler_ok = scheduler_with(
        &dir,
        vec![Box::new(StubCollector {
            articles: Vec::new(),
            fail: false,
        })],
    );
    let clean = scheduler_ok.run_family_once(Family::Api).await;
    assert!(!clean.had_error);
    assert!(!scheduler_ok.status(Family::Api).error_flag);
}

#[tokio::test]
async fn start_is_guarded_and_stop_is_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let scheduler = scheduler_with(
        &dir,
        vec![Box::new(StubCollector {
            articles: vec![art("http://a", "One")],
            fail: false,
        })],
    );

    assert!(scheduler.start(Family::Api, Duration::from_secs(3600)));
    assert!(!scheduler.start(Family::Api, Duration::from_secs(3600)));
    assert!(scheduler.status(Family::Api).running);

    // The first pass runs immediately on start.
    let mut waited = 0;
    while scheduler.status(Family::Api).last_run_at.is_none() && waited < 200 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        waited += 1;
    }
    assert!(scheduler.status(Family::Api).last_run_at.is_some());

    // Stop does not wait out the 1h interval.
    assert!(scheduler.stop(Family::Api));
    let mut waited = 0;
    while scheduler.status(Family::Api).running && waited < 200 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        waited += 1;
    }
    assert!(!scheduler.status(Family::Api).running);

    // A second stop has nothing to do.
    assert!(!scheduler.stop(Family::Api));
}
