// src/collect/providers/newsdata.rs
//! NewsData.io collector. The only provider that filters results against the
//! configured source domains, since its free tier ignores domain query params.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{check_status, http_client};
use crate::collect::parse_published_at;
use crate::collect::types::{Article, Collector};
use crate::config::Config;

pub const CACHE_FILE: &str = "04_newsdata.json";

const ENDPOINT: &str = "https://newsdata.io/api/1/news";

#[derive(Debug, Deserialize)]
struct NewsResponse {
    status: Option<String>,
    message: Option<String>,
    #[serde(default)]
    results: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: Option<String>,
    description: Option<String>,
    link: Option<String>,
    image_url: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    source_id: Option<String>,
    source_url: Option<String>,
    language: Option<String>,
    content: Option<String>,
    #[serde(default)]
    creator: Option<Vec<String>>,
    #[serde(default)]
    category: Option<Vec<String>>,
}

pub struct NewsDataCollector {
    client: reqwest::Client,
    api_key: String,
    max_items: usize,
    domains: Vec<String>,
}

impl NewsDataCollector {
    pub fn new(cfg: &Config, domains: Vec<String>) -> Result<Self> {
        Ok(Self {
            client: http_client(),
            api_key: Config::require_key(&cfg.newsdata_key, "NEWSDATA_API_KEY")?,
            max_items: cfg.max_items,
            domains,
        })
    }

    fn transform(raw: RawArticle) -> Option<Article> {
        let url = raw.link.filter(|u| !u.is_empty())?;
        Some(Article {
            title: raw.title.unwrap_or_default(),
            description: raw.description,
            url,
            image_url: raw.image_url,
            published_at: raw.pub_date.as_deref().and_then(parse_published_at),
            source_name: raw.source_id,
            source_url: raw.source_url,
            language: raw.language,
            full_content: raw.content,
            authors: raw.creator.unwrap_or_default(),
            tickers: Vec::new(),
            topics: raw.category.unwrap_or_default(),
        })
    }

    fn from_configured_source(&self, article: &Article) -> bool {
        if self.domains.is_empty() {
            return true;
        }
        let source = article.source_name.as_deref().unwrap_or("").to_lowercase();
        let url = article.url.to_lowercase();
        self.domains
            .iter()
            .any(|d| source.contains(&d.to_lowercase()) || url.contains(&d.to_lowercase()))
    }
}

#[async_trait]
impl Collector for NewsDataCollector {
    async fn fetch_and_transform(&self) -> Result<Vec<Article>> {
        let size = self.max_items.min(50).to_string();
        let resp = self
            .client
            .get(ENDPOINT)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("language", "en"),
                ("size", size.as_str()),
            ])
            .send()
            .await
            .context("newsdata request")?;
        check_status(self.name(), resp.status())?;
        let parsed: NewsResponse = resp.json().await.context("newsdata response body")?;

        if parsed.status.as_deref() != Some("success") {
            let msg = parsed.message.unwrap_or_else(|| "unknown API error".into());
            return Err(anyhow!("NewsData.io: API error: {msg}"));
        }

        Ok(parsed
            .results
            .into_iter()
            .take(self.max_items)
            .filter_map(Self::transform)
            .filter(|a| self.from_configured_source(a))
            .collect())
    }

    fn name(&self) -> &'static str {
        "NewsData.io"
    }

    fn cache_file(&self) -> &'static str {
        CACHE_FILE
    }
}
