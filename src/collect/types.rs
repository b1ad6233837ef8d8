// src/collect/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// Unified article record every provider mapper produces.
///
/// `url` is the article's identity; no two persisted articles share one.
/// `published_at` is UTC-normalized and serializes as RFC 3339 text, which is
/// also the on-disk form in the flat-file caches.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Article {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub full_content: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub tickers: Vec<String>,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// A group of collectors sharing one scheduling lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// The five HTTP API providers.
    Api,
    /// The RSS/Atom feed provider.
    Rss,
}

impl Family {
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Api => "api",
            Family::Rss => "rss",
        }
    }
}

#[async_trait::async_trait]
pub trait Collector: Send + Sync {
    /// Fetch the latest batch from the provider and map it to unified articles.
    /// Malformed records are dropped by the mapper, not surfaced as errors.
    async fn fetch_and_transform(&self) -> Result<Vec<Article>>;
    fn name(&self) -> &'static str;
    /// File name of this collector's flat cache, relative to the outputs dir.
    fn cache_file(&self) -> &'static str;
}
