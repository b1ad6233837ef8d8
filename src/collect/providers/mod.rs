// src/collect/providers/mod.rs
pub mod alpha_vantage;
pub mod newsapi_ai;
pub mod newsdata;
pub mod rss;
pub mod thenewsapi;
pub mod tiingo;

use anyhow::{anyhow, Result};

use crate::collect::types::Collector;
use crate::config::{Config, SourceLists};

/// Build the API-family collectors in their fixed run order. A missing
/// credential fails here, once, rather than on every scheduled run.
pub fn api_collectors(cfg: &Config, sources: &SourceLists) -> Result<Vec<Box<dyn Collector>>> {
    Ok(vec![
        Box::new(newsapi_ai::NewsApiAiCollector::new(cfg)?),
        Box::new(thenewsapi::TheNewsApiCollector::new(cfg)?),
        Box::new(newsdata::NewsDataCollector::new(cfg, sources.api.clone())?),
        Box::new(tiingo::TiingoCollector::new(cfg)?),
        Box::new(alpha_vantage::AlphaVantageCollector::new(cfg)?),
    ])
}

/// The feed family is a single collector over all configured feeds.
pub fn rss_collectors(sources: &SourceLists) -> Result<Vec<Box<dyn Collector>>> {
    Ok(vec![Box::new(rss::RssCollector::new(sources.rss.clone()))])
}

/// Every cache file the collectors write, in registry order. The existing-key
/// index scans all of them regardless of which family is running.
pub const CACHE_FILES: &[&str] = &[
    rss::CACHE_FILE,
    newsapi_ai::CACHE_FILE,
    thenewsapi::CACHE_FILE,
    newsdata::CACHE_FILE,
    tiingo::CACHE_FILE,
    alpha_vantage::CACHE_FILE,
];

/// Map a provider HTTP status to the error the original APIs document.
pub(crate) fn check_status(provider: &'static str, status: reqwest::StatusCode) -> Result<()> {
    match status.as_u16() {
        200 => Ok(()),
        401 => Err(anyhow!("{provider}: invalid API key (401 Unauthorized)")),
        402 | 403 => Err(anyhow!("{provider}: API quota exceeded ({status})")),
        429 => Err(anyhow!("{provider}: rate limit exceeded (429 Too Many Requests)")),
        _ => Err(anyhow!("{provider}: HTTP error {status}")),
    }
}

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .unwrap_or_default()
}
