// src/collect/providers/tiingo.rs
//! Tiingo financial news collector. The one API-family provider that carries
//! ticker tags natively.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{check_status, http_client};
use crate::collect::parse_published_at;
use crate::collect::types::{Article, Collector};
use crate::config::Config;

pub const CACHE_FILE: &str = "05_tiingo.json";

const ENDPOINT: &str = "https://api.tiingo.com/tiingo/news";

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    #[serde(rename = "publishedDate")]
    published_date: Option<String>,
    source: Option<String>,
    #[serde(default)]
    tickers: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
}

pub struct TiingoCollector {
    client: reqwest::Client,
    api_key: String,
    max_items: usize,
}

impl TiingoCollector {
    pub fn new(cfg: &Config) -> Result<Self> {
        Ok(Self {
            client: http_client(),
            api_key: Config::require_key(&cfg.tiingo_key, "TIINGO_API_KEY")?,
            max_items: cfg.max_items,
        })
    }

    fn transform(raw: RawArticle) -> Option<Article> {
        let url = raw.url.filter(|u| !u.is_empty())?;
        Some(Article {
            title: raw.title.unwrap_or_default(),
            description: raw.description.clone(),
            url: url.clone(),
            image_url: None,
            published_at: raw.published_date.as_deref().and_then(parse_published_at),
            source_name: raw.source,
            source_url: Some(url),
            language: Some("en".into()), // Tiingo publishes English content
            full_content: raw.description,
            authors: Vec::new(),
            tickers: raw.tickers,
            topics: raw.tags,
        })
    }
}

#[async_trait]
impl Collector for TiingoCollector {
    async fn fetch_and_transform(&self) -> Result<Vec<Article>> {
        let limit = self.max_items.min(100).to_string();
        let resp = self
            .client
            .get(ENDPOINT)
            .query(&[("token", self.api_key.as_str()), ("limit", limit.as_str())])
            .send()
            .await
            .context("tiingo request")?;
        check_status(self.name(), resp.status())?;
        let parsed: Vec<RawArticle> = resp.json().await.context("tiingo response body")?;

        Ok(parsed
            .into_iter()
            .take(self.max_items)
            .filter_map(Self::transform)
            .collect())
    }

    fn name(&self) -> &'static str {
        "Tiingo"
    }

    fn cache_file(&self) -> &'static str {
        CACHE_FILE
    }
}
