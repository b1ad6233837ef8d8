// src/collect/providers/newsapi_ai.rs
//! NewsAPI.ai (Event Registry) collector.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{check_status, http_client};
use crate::collect::parse_published_at;
use crate::collect::types::{Article, Collector};
use crate::config::Config;

pub const CACHE_FILE: &str = "02_newsapi_ai.json";

const ENDPOINT: &str = "https://eventregistry.org/api/v1/article/getArticles";

#[derive(Debug, Deserialize)]
struct GetArticlesResponse {
    #[serde(default)]
    articles: Option<ResultPage>,
}

#[derive(Debug, Deserialize)]
struct ResultPage {
    #[serde(default)]
    results: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: Option<String>,
    body: Option<String>,
    url: Option<String>,
    image: Option<String>,
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
    lang: Option<String>,
    source: Option<RawSource>,
    #[serde(default)]
    authors: Vec<RawAuthor>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    title: Option<String>,
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAuthor {
    name: Option<String>,
}

pub struct NewsApiAiCollector {
    client: reqwest::Client,
    api_key: String,
    max_items: usize,
}

impl NewsApiAiCollector {
    pub fn new(cfg: &Config) -> Result<Self> {
        Ok(Self {
            client: http_client(),
            api_key: Config::require_key(&cfg.newsapi_ai_key, "NEWSAPI_AI_API_KEY")?,
            max_items: cfg.max_items,
        })
    }

    fn transform(raw: RawArticle) -> Option<Article> {
        let url = raw.url.filter(|u| !u.is_empty())?;
        let source = raw.source.unwrap_or(RawSource {
            title: None,
            uri: None,
        });
        Some(Article {
            title: raw.title.unwrap_or_default(),
            description: raw.body.clone(),
            url,
            image_url: raw.image,
            published_at: raw.date_time.as_deref().and_then(parse_published_at),
            source_name: source.title,
            source_url: source.uri,
            language: raw.lang,
            full_content: raw.body,
            authors: raw.authors.into_iter().filter_map(|a| a.name).collect(),
            tickers: Vec::new(),
            topics: Vec::new(),
        })
    }
}

#[async_trait]
impl Collector for NewsApiAiCollector {
    async fn fetch_and_transform(&self) -> Result<Vec<Article>> {
        let body = json!({
            "action": "getArticles",
            "apiKey": self.api_key,
            "lang": "eng",
            "resultType": "articles",
            "articlesSortBy": "date",
            "articlesCount": self.max_items,
            "articleBodyLen": -1,
        });
        let resp = self
            .client
            .post(ENDPOINT)
            .json(&body)
            .send()
            .await
            .context("newsapi.ai request")?;
        check_status(self.name(), resp.status())?;
        let parsed: GetArticlesResponse = resp.json().await.context("newsapi.ai response body")?;

        Ok(parsed
            .articles
            .map(|p| p.results)
            .unwrap_or_default()
            .into_iter()
            .filter_map(Self::transform)
            .collect())
    }

    fn name(&self) -> &'static str {
        "NewsAPI.ai"
    }

    fn cache_file(&self) -> &'static str {
        CACHE_FILE
    }
}
