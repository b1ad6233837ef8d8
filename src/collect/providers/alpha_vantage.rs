// src/collect/providers/alpha_vantage.rs
//! Alpha Vantage NEWS_SENTIMENT collector. Rate limiting surfaces as a 200
//! with a "Note"/"Information" body instead of an HTTP status, so the body is
//! checked too.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{check_status, http_client};
use crate::collect::parse_published_at;
use crate::collect::types::{Article, Collector};
use crate::config::Config;

pub const CACHE_FILE: &str = "06_alpha_vantage.json";

const ENDPOINT: &str = "https://www.alphavantage.co/query";

#[derive(Debug, Deserialize)]
struct NewsSentimentResponse {
    #[serde(rename = "feed", default)]
    feed: Option<Vec<RawArticle>>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: Option<String>,
    url: Option<String>,
    #[serde(rename = "time_published")]
    time_published: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    summary: Option<String>,
    banner_image: Option<String>,
    source: Option<String>,
    source_domain: Option<String>,
    #[serde(default)]
    topics: Vec<RawTopic>,
    #[serde(rename = "ticker_sentiment", default)]
    ticker_sentiment: Vec<RawTicker>,
}

#[derive(Debug, Deserialize)]
struct RawTopic {
    topic: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTicker {
    ticker: Option<String>,
}

pub struct AlphaVantageCollector {
    client: reqwest::Client,
    api_key: String,
    max_items: usize,
}

impl AlphaVantageCollector {
    pub fn new(cfg: &Config) -> Result<Self> {
        Ok(Self {
            client: http_client(),
            api_key: Config::require_key(&cfg.alpha_vantage_key, "ALPHA_VANTAGE_API_KEY")?,
            max_items: cfg.max_items,
        })
    }

    fn transform(raw: RawArticle) -> Option<Article> {
        let url = raw.url.filter(|u| !u.is_empty())?;
        Some(Article {
            title: raw.title.unwrap_or_default(),
            description: raw.summary.clone(),
            url,
            image_url: raw.banner_image,
            published_at: raw.time_published.as_deref().and_then(parse_published_at),
            source_name: raw.source,
            source_url: raw.source_domain,
            language: Some("en".into()),
            full_content: raw.summary,
            authors: raw.authors,
            tickers: raw
                .ticker_sentiment
                .into_iter()
                .filter_map(|t| t.ticker)
                .collect(),
            topics: raw.topics.into_iter().filter_map(|t| t.topic).collect(),
        })
    }
}

#[async_trait]
impl Collector for AlphaVantageCollector {
    async fn fetch_and_transform(&self) -> Result<Vec<Article>> {
        let limit = self.max_items.to_string();
        let resp = self
            .client
            .get(ENDPOINT)
            .query(&[
                ("function", "NEWS_SENTIMENT"),
                ("apikey", self.api_key.as_str()),
                ("limit", limit.as_str()),
                ("sort", "LATEST"),
            ])
            .send()
            .await
            .context("alpha vantage request")?;
        check_status(self.name(), resp.status())?;
        let parsed: NewsSentimentResponse =
            resp.json().await.context("alpha vantage response body")?;

        let Some(feed) = parsed.feed else {
            let msg = parsed
                .note
                .or(parsed.information)
                .unwrap_or_else(|| "empty feed".into());
            return Err(anyhow!("AlphaVantage: API limit or error: {msg}"));
        };

        Ok(feed
            .into_iter()
            .take(self.max_items)
            .filter_map(Self::transform)
            .collect())
    }

    fn name(&self) -> &'static str {
        "AlphaVantage"
    }

    fn cache_file(&self) -> &'static str {
        CACHE_FILE
    }
}
