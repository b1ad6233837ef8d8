// src/collect/scheduler.rs
//! Per-family collection workers. Each family (API providers, RSS feeds) has
//! one startable/stoppable periodic worker plus a manual single-shot path;
//! both share a per-family run lock so they never race on the cache files,
//! and both update the same status record.

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use serde_json::json;
use tokio::sync::watch;

use crate::collect::collect_and_store;
use crate::collect::types::{Article, Collector, Family};
use crate::live_log::LiveLog;
use crate::store::MultiSinkWriter;

/// Snapshot of one family's collection state, exposed via `status`.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct FamilyStatus {
    pub running: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub new_count_session: u64,
    pub error_flag: bool,
}

/// Outcome of one manual or periodic family run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunSummary {
    pub family: Family,
    pub fetched: usize,
    pub duplicates: usize,
    /// Articles newly inserted into the relational store this run.
    pub new_articles: Vec<Article>,
    pub had_error: bool,
}

struct FamilyUnit {
    collectors: Vec<Box<dyn Collector>>,
    status: RwLock<FamilyStatus>,
    /// Serializes manual and periodic runs of the same family.
    run_lock: tokio::sync::Mutex<()>,
    stop: Mutex<Option<watch::Sender<bool>>>,
}

impl FamilyUnit {
    fn new(collectors: Vec<Box<dyn Collector>>) -> Self {
        Self {
            collectors,
            status: RwLock::new(FamilyStatus::default()),
            run_lock: tokio::sync::Mutex::new(()),
            stop: Mutex::new(None),
        }
    }
}

pub struct Scheduler {
    writer: Arc<MultiSinkWriter>,
    log: LiveLog,
    api: Arc<FamilyUnit>,
    rss: Arc<FamilyUnit>,
    cache_files: Arc<Vec<&'static str>>,
}

impl Scheduler {
    pub fn new(
        writer: Arc<MultiSinkWriter>,
        log: LiveLog,
        api_collectors: Vec<Box<dyn Collector>>,
        rss_collectors: Vec<Box<dyn Collector>>,
    ) -> Self {
        let mut cache_files: Vec<&'static str> = api_collectors
            .iter()
            .chain(rss_collectors.iter())
            .map(|c| c.cache_file())
            .collect();
        cache_files.dedup();
        Self {
            writer,
            log,
            api: Arc::new(FamilyUnit::new(api_collectors)),
            rss: Arc::new(FamilyUnit::new(rss_collectors)),
            cache_files: Arc::new(cache_files),
        }
    }

    fn unit(&self, family: Family) -> &Arc<FamilyUnit> {
        match family {
            Family::Api => &self.api,
            Family::Rss => &self.rss,
        }
    }

    /// Every cache file the collectors write; the stats endpoint and the
    /// existing-key index both scan the full set.
    pub fn cache_files(&self) -> &[&'static str] {
        &self.cache_files
    }

    pub fn status(&self, family: Family) -> FamilyStatus {
        self.unit(family)
            .status
            .read()
            .expect("status lock poisoned")
            .clone()
    }

    /// Manual single-shot run, serialized against the periodic worker.
    pub async fn run_family_once(&self, family: Family) -> RunSummary {
        let unit = self.unit(family);
        let _guard = unit.run_lock.lock().await;
        run_pass(unit, family, &self.writer, &self.cache_files, &self.log).await
    }

    /// Start a family's periodic worker. Returns false when already running.
    pub fn start(&self, family: Family, interval: Duration) -> bool {
        let unit = Arc::clone(self.unit(family));
        {
            let mut status = unit.status.write().expect("status lock poisoned");
            if status.running {
                return false;
            }
            status.running = true;
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        *unit.stop.lock().expect("stop lock poisoned") = Some(stop_tx);

        let writer = Arc::clone(&self.writer);
        let cache_files = Arc::clone(&self.cache_files);
        let log = self.log.clone();
        tokio::spawn(async move {
            tracing::info!(
                family = family.as_str(),
                interval_secs = interval.as_secs(),
                "collection worker started"
            );
            loop {
                {
                    let _guard = unit.run_lock.lock().await;
                    run_pass(&unit, family, &writer, &cache_files, &log).await;
                }
                // Cancellable inter-run sleep: a stop request wakes this
                // immediately instead of waiting out the interval.
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = stop_rx.changed() => {}
                }
                if *stop_rx.borrow() {
                    break;
                }
            }
            unit.status.write().expect("status lock poisoned").running = false;
            tracing::info!(family = family.as_str(), "collection worker stopped");
            log.push_log(format!("{} collection stopped", family.as_str()));
        });

        self.log.push_log(format!(
            "{} collection started (every {}s)",
            family.as_str(),
            interval.as_secs()
        ));
        true
    }

    /// Request a family's worker to stop after its current unit of work.
    /// Returns false when no worker is active.
    pub fn stop(&self, family: Family) -> bool {
        let sender = self
            .unit(family)
            .stop
            .lock()
            .expect("stop lock poisoned")
            .take();
        match sender {
            Some(tx) => {
                let _ = tx.send(true);
                true
            }
            None => false,
        }
    }
}

/// One full family pass: every collector in fixed order, per-collector errors
/// contained, status record updated exactly once at the end.
async fn run_pass(
    unit: &FamilyUnit,
    family: Family,
    writer: &MultiSinkWriter,
    cache_files: &[&'static str],
    log: &LiveLog,
) -> RunSummary {
    unit.status
        .write()
        .expect("status lock poisoned")
        .error_flag = false;

    let mut summary = RunSummary {
        family,
        fetched: 0,
        duplicates: 0,
        new_articles: Vec::new(),
        had_error: false,
    };

    for collector in &unit.collectors {
        match collect_and_store(collector.as_ref(), writer, cache_files, log).await {
            Ok(outcome) => {
                summary.fetched += outcome.fetched;
                summary.duplicates += outcome.duplicates;
                summary.new_articles.extend(outcome.persist.inserted);
            }
            Err(e) => {
                summary.had_error = true;
                counter!("collect_provider_errors_total").increment(1);
                tracing::warn!(
                    collector = collector.name(),
                    error = ?e,
                    "collector failed, continuing with siblings"
                );
                log.push_log(format!("{}: collection failed: {e:#}", collector.name()));
            }
        }
    }

    let now = Utc::now();
    {
        let mut status = unit.status.write().expect("status lock poisoned");
        status.last_run_at = Some(now);
        status.new_count_session += summary.new_articles.len() as u64;
        status.error_flag = summary.had_error;
    }
    counter!("collect_runs_total").increment(1);
    gauge!("collect_last_run_ts", "family" => family.as_str()).set(now.timestamp().max(0) as f64);

    log.push_log(format!(
        "{} run finished: {} fetched, {} duplicates, {} new",
        family.as_str(),
        summary.fetched,
        summary.duplicates,
        summary.new_articles.len()
    ));
    if !summary.new_articles.is_empty() {
        log.push_data(json!({
            "family": family,
            "new_articles": summary.new_articles,
        }));
    }

    summary
}
