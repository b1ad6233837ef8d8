// src/collect/mod.rs
pub mod keys;
pub mod providers;
pub mod scheduler;
pub mod types;

use chrono::{DateTime, TimeZone, Utc};
use metrics::{counter, describe_counter, describe_gauge};
use once_cell::sync::OnceCell;

use crate::collect::keys::ExistingKeys;
use crate::collect::types::{Article, Collector};
use crate::live_log::LiveLog;
use crate::store::{MultiSinkWriter, PersistOutcome};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "collect_fetched_total",
            "Articles fetched and mapped by providers."
        );
        describe_counter!(
            "collect_kept_total",
            "Articles kept after deduplication."
        );
        describe_counter!(
            "collect_duplicates_total",
            "Articles dropped as title/url duplicates."
        );
        describe_counter!(
            "collect_provider_errors_total",
            "Provider fetch/parse errors."
        );
        describe_counter!("collect_runs_total", "Completed family collection runs.");
        describe_counter!(
            "persist_sink_failures_total",
            "Persistence failures per sink (postgres/cache/mongo)."
        );
        describe_gauge!(
            "collect_last_run_ts",
            "Unix ts when a family's pipeline last ran."
        );
    });
}

/// Canonical title key used for near-duplicate detection.
/// Lower-cases, strips everything that is not a word character or whitespace,
/// collapses whitespace runs, trims. Deterministic and idempotent.
/// An empty result must never be used as a dedup key.
pub fn normalize_title(title: &str) -> String {
    static RE_PUNCT: OnceCell<regex::Regex> = OnceCell::new();
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_punct = RE_PUNCT.get_or_init(|| regex::Regex::new(r"[^\w\s]").unwrap());
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());

    let lowered = title.to_lowercase();
    let stripped = re_punct.replace_all(&lowered, "");
    let collapsed = re_ws.replace_all(&stripped, " ");
    collapsed.trim().to_string()
}

/// Parse a provider timestamp into UTC. Accepts RFC 3339, RFC 2822,
/// `YYYY-MM-DD HH:MM:SS` and the compact `YYYYMMDDTHHMMSS` form.
/// Timestamps more than a day in the future are treated as junk.
pub fn parse_published_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .or_else(|_| DateTime::parse_from_rfc2822(raw).map(|d| d.with_timezone(&Utc)))
        .ok()
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|n| Utc.from_utc_datetime(&n))
        })
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y%m%dT%H%M%S")
                .ok()
                .map(|n| Utc.from_utc_datetime(&n))
        })?;
    if parsed > Utc::now() + chrono::Duration::days(1) {
        return None;
    }
    Some(parsed)
}

/// Filter a freshly fetched batch against the existing-key index and against
/// itself. First occurrence wins; later articles sharing a url or a normalized
/// title are dropped. Empty keys never collide. Input order is preserved.
pub fn deduplicate(candidates: Vec<Article>, existing: &ExistingKeys) -> (Vec<Article>, usize) {
    let mut unique = Vec::with_capacity(candidates.len());
    let mut seen_titles = std::collections::HashSet::new();
    let mut seen_urls = std::collections::HashSet::new();
    let mut duplicates = 0usize;

    for article in candidates {
        let norm = normalize_title(&article.title);
        let url_hit = !article.url.is_empty()
            && (existing.urls.contains(&article.url) || seen_urls.contains(&article.url));
        let title_hit =
            !norm.is_empty() && (existing.titles.contains(&norm) || seen_titles.contains(&norm));

        if url_hit || title_hit {
            duplicates += 1;
            continue;
        }
        if !article.url.is_empty() {
            seen_urls.insert(article.url.clone());
        }
        if !norm.is_empty() {
            seen_titles.insert(norm);
        }
        unique.push(article);
    }

    (unique, duplicates)
}

/// Result of one collector's fetch→dedupe→persist pass.
#[derive(Debug, Default)]
pub struct CollectOutcome {
    pub fetched: usize,
    pub duplicates: usize,
    pub persist: PersistOutcome,
}

/// Run the full pipeline for a single collector: fetch, reload the existing-key
/// index, dedupe, persist to all sinks. The index is reloaded here (not once
/// per family run) so a later collector in the same run sees what an earlier
/// one just persisted.
pub async fn collect_and_store(
    collector: &dyn Collector,
    writer: &MultiSinkWriter,
    all_cache_files: &[&'static str],
    log: &LiveLog,
) -> anyhow::Result<CollectOutcome> {
    ensure_metrics_described();

    let raw = collector.fetch_and_transform().await?;
    let fetched = raw.len();
    counter!("collect_fetched_total").increment(fetched as u64);

    let cache_paths: Vec<std::path::PathBuf> =
        all_cache_files.iter().map(|f| writer.cache_path(f)).collect();
    let existing = ExistingKeys::load(writer.relational(), &cache_paths).await;

    let (unique, duplicates) = deduplicate(raw, &existing);
    counter!("collect_kept_total").increment(unique.len() as u64);
    counter!("collect_duplicates_total").increment(duplicates as u64);

    let persist = writer.persist(&unique, collector.cache_file()).await;

    tracing::info!(
        collector = collector.name(),
        fetched,
        duplicates,
        db = persist.db_count,
        cache = persist.cache_count,
        mirror = persist.mirror_count,
        "collector finished"
    );
    log.push_log(format!(
        "{}: fetched {}, duplicates {}, saved db={} cache={} mirror={}",
        collector.name(),
        fetched,
        duplicates,
        persist.db_count,
        persist.cache_count,
        persist.mirror_count
    ));

    Ok(CollectOutcome {
        fetched,
        duplicates,
        persist,
    })
}
