// src/store/mod.rs
pub mod cache;
pub mod mongo;
pub mod postgres;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use metrics::counter;

use crate::collect::types::Article;

/// The authoritative relational sink. Insertion is guarded by a uniqueness
/// constraint on `url`; a conflicting insert is a silent no-op.
#[async_trait::async_trait]
pub trait RelationalStore: Send + Sync {
    /// Insert a batch, returning the subset actually inserted.
    async fn insert_articles(&self, articles: &[Article]) -> Result<Vec<Article>>;
    /// Every stored (title, url) pair, for seeding the dedup index.
    async fn title_url_pairs(&self) -> Result<Vec<(Option<String>, Option<String>)>>;
    /// Most recent articles for the API, optionally filtered by source name.
    async fn recent_articles(&self, limit: i64, source: Option<&str>) -> Result<Vec<StoredArticle>>;
    async fn total_count(&self) -> Result<i64>;
}

/// The document-store mirror: idempotent upserts keyed by `url`.
#[async_trait::async_trait]
pub trait DocumentMirror: Send + Sync {
    /// Upsert a batch; returns upserted + matched so a repeated upsert of an
    /// identical article still reports a write.
    async fn upsert_articles(&self, articles: &[Article]) -> Result<u64>;
    async fn total_count(&self) -> Result<u64>;
}

/// An article as stored in the relational table.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct StoredArticle {
    pub id: i32,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub source_name: Option<String>,
    pub source_url: Option<String>,
    pub language: Option<String>,
    pub full_content: Option<String>,
    pub authors: Option<Vec<String>>,
    pub tickers: Option<Vec<String>>,
    pub topics: Option<Vec<String>>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Aggregated result of one persist call.
#[derive(Debug, Default)]
pub struct PersistOutcome {
    pub db_count: usize,
    pub cache_count: usize,
    pub mirror_count: usize,
    /// The subset newly inserted into the relational store, used for
    /// notification payloads.
    pub inserted: Vec<Article>,
}

/// Writes one deduplicated batch to all three sinks. Every sink is attempted
/// even when another already failed; a failed sink reports zero and the
/// caller can read degraded persistence off the counts.
pub struct MultiSinkWriter {
    relational: Arc<dyn RelationalStore>,
    mirror: Arc<dyn DocumentMirror>,
    cache_dir: PathBuf,
}

impl MultiSinkWriter {
    pub fn new(
        relational: Arc<dyn RelationalStore>,
        mirror: Arc<dyn DocumentMirror>,
        cache_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            relational,
            mirror,
            cache_dir: cache_dir.into(),
        }
    }

    pub fn relational(&self) -> &dyn RelationalStore {
        self.relational.as_ref()
    }

    pub fn mirror(&self) -> &dyn DocumentMirror {
        self.mirror.as_ref()
    }

    pub fn cache_path(&self, file: &str) -> PathBuf {
        self.cache_dir.join(file)
    }

    pub async fn persist(&self, articles: &[Article], cache_file: &str) -> PersistOutcome {
        if articles.is_empty() {
            return PersistOutcome::default();
        }

        let (db_count, inserted) = match self.relational.insert_articles(articles).await {
            Ok(inserted) => (inserted.len(), inserted),
            Err(e) => {
                counter!("persist_sink_failures_total", "sink" => "postgres").increment(1);
                tracing::warn!(error = ?e, "relational insert failed; continuing with other sinks");
                (0, Vec::new())
            }
        };

        let cache_count = match cache::append_articles(&self.cache_path(cache_file), articles) {
            Ok(n) => n,
            Err(e) => {
                counter!("persist_sink_failures_total", "sink" => "cache").increment(1);
                tracing::warn!(error = ?e, file = cache_file, "cache append failed");
                0
            }
        };

        let mirror_count = match self.mirror.upsert_articles(articles).await {
            Ok(n) => n as usize,
            Err(e) => {
                counter!("persist_sink_failures_total", "sink" => "mongo").increment(1);
                tracing::warn!(error = ?e, "mirror upsert failed");
                0
            }
        };

        PersistOutcome {
            db_count,
            cache_count,
            mirror_count,
            inserted,
        }
    }
}

fn stored_from_article(id: i32, a: &Article) -> StoredArticle {
    StoredArticle {
        id,
        title: Some(a.title.clone()),
        description: a.description.clone(),
        url: Some(a.url.clone()),
        image_url: a.image_url.clone(),
        published_at: a.published_at,
        source_name: a.source_name.clone(),
        source_url: a.source_url.clone(),
        language: a.language.clone(),
        full_content: a.full_content.clone(),
        authors: Some(a.authors.clone()),
        tickers: Some(a.tickers.clone()),
        topics: Some(a.topics.clone()),
        created_at: Some(Utc::now()),
    }
}

// --- Test helpers ---

/// In-memory relational store honoring the url-uniqueness contract.
#[derive(Default)]
pub struct MemoryStore {
    rows: std::sync::Mutex<Vec<Article>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn articles(&self) -> Vec<Article> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RelationalStore for MemoryStore {
    async fn insert_articles(&self, articles: &[Article]) -> Result<Vec<Article>> {
        let mut rows = self.rows.lock().unwrap();
        let mut inserted = Vec::new();
        for a in articles {
            let conflict = !a.url.is_empty() && rows.iter().any(|r| r.url == a.url);
            if conflict {
                continue;
            }
            rows.push(a.clone());
            inserted.push(a.clone());
        }
        Ok(inserted)
    }

    async fn title_url_pairs(&self) -> Result<Vec<(Option<String>, Option<String>)>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .map(|a| (Some(a.title.clone()), Some(a.url.clone())))
            .collect())
    }

    async fn recent_articles(
        &self,
        limit: i64,
        source: Option<&str>,
    ) -> Result<Vec<StoredArticle>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|a| match source {
                Some(s) => a
                    .source_name
                    .as_deref()
                    .is_some_and(|n| n.to_lowercase().contains(&s.to_lowercase())),
                None => true,
            })
            .take(limit.max(0) as usize)
            .enumerate()
            .map(|(i, a)| stored_from_article(i as i32 + 1, a))
            .collect())
    }

    async fn total_count(&self) -> Result<i64> {
        Ok(self.rows.lock().unwrap().len() as i64)
    }
}

/// A relational store whose connection is always down.
pub struct FailingStore;

#[async_trait::async_trait]
impl RelationalStore for FailingStore {
    async fn insert_articles(&self, _articles: &[Article]) -> Result<Vec<Article>> {
        Err(anyhow::anyhow!("relational store unreachable"))
    }

    async fn title_url_pairs(&self) -> Result<Vec<(Option<String>, Option<String>)>> {
        Err(anyhow::anyhow!("relational store unreachable"))
    }

    async fn recent_articles(
        &self,
        _limit: i64,
        _source: Option<&str>,
    ) -> Result<Vec<StoredArticle>> {
        Err(anyhow::anyhow!("relational store unreachable"))
    }

    async fn total_count(&self) -> Result<i64> {
        Err(anyhow::anyhow!("relational store unreachable"))
    }
}

/// In-memory mirror with pymongo-style upsert counting.
#[derive(Default)]
pub struct MemoryMirror {
    docs: std::sync::Mutex<std::collections::HashMap<String, Article>>,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl DocumentMirror for MemoryMirror {
    async fn upsert_articles(&self, articles: &[Article]) -> Result<u64> {
        let mut docs = self.docs.lock().unwrap();
        let mut written = 0u64;
        for a in articles {
            docs.insert(a.url.clone(), a.clone());
            written += 1; // upserted or matched, both count as a write
        }
        Ok(written)
    }

    async fn total_count(&self) -> Result<u64> {
        Ok(self.docs.lock().unwrap().len() as u64)
    }
}

/// A mirror whose server never answers.
pub struct FailingMirror;

#[async_trait::async_trait]
impl DocumentMirror for FailingMirror {
    async fn upsert_articles(&self, _articles: &[Article]) -> Result<u64> {
        Err(anyhow::anyhow!("document mirror unreachable"))
    }

    async fn total_count(&self) -> Result<u64> {
        Err(anyhow::anyhow!("document mirror unreachable"))
    }
}
