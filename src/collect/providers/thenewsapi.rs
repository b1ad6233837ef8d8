// src/collect/providers/thenewsapi.rs
//! TheNewsAPI.com collector.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{check_status, http_client};
use crate::collect::parse_published_at;
use crate::collect::types::{Article, Collector};
use crate::config::Config;

pub const CACHE_FILE: &str = "03_thenewsapi.json";

const ENDPOINT: &str = "https://api.thenewsapi.com/v1/news/all";

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    data: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: Option<String>,
    snippet: Option<String>,
    url: Option<String>,
    image_url: Option<String>,
    published_at: Option<String>,
    source: Option<String>,
    language: Option<String>,
    #[serde(default)]
    categories: Vec<String>,
}

pub struct TheNewsApiCollector {
    client: reqwest::Client,
    api_key: String,
    max_items: usize,
}

impl TheNewsApiCollector {
    pub fn new(cfg: &Config) -> Result<Self> {
        Ok(Self {
            client: http_client(),
            api_key: Config::require_key(&cfg.thenewsapi_key, "THENEWSAPI_API_KEY")?,
            max_items: cfg.max_items,
        })
    }

    fn transform(raw: RawArticle) -> Option<Article> {
        let url = raw.url.filter(|u| !u.is_empty())?;
        Some(Article {
            title: raw.title.unwrap_or_default(),
            description: raw.snippet,
            url: url.clone(),
            image_url: raw.image_url,
            published_at: raw.published_at.as_deref().and_then(parse_published_at),
            source_name: raw.source,
            source_url: Some(url),
            language: raw.language,
            full_content: None,
            authors: Vec::new(),
            tickers: Vec::new(),
            topics: raw.categories,
        })
    }
}

#[async_trait]
impl Collector for TheNewsApiCollector {
    async fn fetch_and_transform(&self) -> Result<Vec<Article>> {
        let limit = self.max_items.to_string();
        let resp = self
            .client
            .get(ENDPOINT)
            .query(&[
                ("api_token", self.api_key.as_str()),
                ("language", "en"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .context("thenewsapi request")?;
        check_status(self.name(), resp.status())?;
        let parsed: NewsResponse = resp.json().await.context("thenewsapi response body")?;

        Ok(parsed.data.into_iter().filter_map(Self::transform).collect())
    }

    fn name(&self) -> &'static str {
        "TheNewsAPI"
    }

    fn cache_file(&self) -> &'static str {
        CACHE_FILE
    }
}
