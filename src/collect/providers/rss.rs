// src/collect/providers/rss.rs
//! RSS/Atom feed collector: one collector over every configured feed. A
//! failing or malformed feed is logged and contributes nothing; the other
//! feeds in the same run are unaffected.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use super::http_client;
use crate::collect::parse_published_at;
use crate::collect::types::{Article, Collector};
use crate::config::RssSource;

pub const CACHE_FILE: &str = "01_rss_news.json";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    // quick-xml drops the namespace prefix, exposing only the local name
    #[serde(rename = "encoded")]
    content_encoded: Option<String>,
    #[serde(rename = "category", default)]
    categories: Vec<String>,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    title: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    summary: Option<String>,
    content: Option<String>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
}

fn parse_rfc2822_utc(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
}

fn parse_feed_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    parse_rfc2822_utc(raw).or_else(|| parse_published_at(raw))
}

/// Feeds with no usable date still need an ordering hint for readers.
fn fallback_published_at() -> DateTime<Utc> {
    Utc::now() - chrono::Duration::hours(1)
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

fn clean_text(s: Option<String>) -> Option<String> {
    let s = s?;
    let decoded = html_escape::decode_html_entities(&s).trim().to_string();
    if decoded.is_empty() {
        None
    } else {
        Some(decoded)
    }
}

/// Parse one feed document (RSS 2.0 first, Atom as fallback) into unified
/// articles. Items without a link are dropped.
pub fn parse_feed(xml: &str, source: &RssSource) -> Result<Vec<Article>> {
    let xml = scrub_html_entities_for_xml(xml);

    if let Ok(rss) = from_str::<Rss>(&xml) {
        return Ok(rss
            .channel
            .items
            .into_iter()
            .filter_map(|item| rss_item_to_article(item, source))
            .collect());
    }

    let atom: AtomFeed = from_str(&xml)
        .with_context(|| format!("parsing feed xml from {}", source.name))?;
    Ok(atom
        .entries
        .into_iter()
        .filter_map(|entry| atom_entry_to_article(entry, source))
        .collect())
}

fn rss_item_to_article(item: Item, source: &RssSource) -> Option<Article> {
    let url = item.link.filter(|u| !u.trim().is_empty())?;
    let url = url.trim().to_string();
    let description = clean_text(item.description);
    Some(Article {
        title: clean_text(item.title).unwrap_or_default(),
        description: description.clone(),
        url: url.clone(),
        image_url: None,
        published_at: Some(
            parse_feed_date(item.pub_date.as_deref()).unwrap_or_else(fallback_published_at),
        ),
        source_name: Some(source.name.clone()),
        source_url: Some(source.link.clone().unwrap_or(url)),
        language: item.language.or_else(|| Some("en".into())),
        full_content: clean_text(item.content_encoded).or(description),
        authors: Vec::new(),
        tickers: Vec::new(),
        topics: item
            .categories
            .into_iter()
            .filter(|c| !c.trim().is_empty())
            .collect(),
    })
}

fn atom_entry_to_article(entry: Entry, source: &RssSource) -> Option<Article> {
    let url = entry
        .links
        .into_iter()
        .filter_map(|l| l.href)
        .find(|u| !u.trim().is_empty())?;
    let summary = clean_text(entry.summary);
    let date = entry.published.or(entry.updated);
    Some(Article {
        title: clean_text(entry.title).unwrap_or_default(),
        description: summary.clone(),
        url: url.clone(),
        image_url: None,
        published_at: Some(
            parse_feed_date(date.as_deref()).unwrap_or_else(fallback_published_at),
        ),
        source_name: Some(source.name.clone()),
        source_url: Some(source.link.clone().unwrap_or(url)),
        language: Some("en".into()),
        full_content: clean_text(entry.content).or(summary),
        authors: Vec::new(),
        tickers: Vec::new(),
        topics: Vec::new(),
    })
}

pub struct RssCollector {
    client: reqwest::Client,
    sources: Vec<RssSource>,
}

impl RssCollector {
    pub fn new(sources: Vec<RssSource>) -> Self {
        Self {
            client: http_client(),
            sources,
        }
    }
}

#[async_trait]
impl Collector for RssCollector {
    async fn fetch_and_transform(&self) -> Result<Vec<Article>> {
        if self.sources.is_empty() {
            tracing::warn!("no RSS sources configured");
            return Ok(Vec::new());
        }

        let mut articles = Vec::new();
        for source in &self.sources {
            match self.fetch_one(source).await {
                Ok(mut items) => {
                    tracing::info!(feed = %source.name, items = items.len(), "feed fetched");
                    articles.append(&mut items);
                }
                Err(e) => {
                    tracing::warn!(feed = %source.name, url = %source.url, error = ?e, "feed failed");
                }
            }
        }
        Ok(articles)
    }

    fn name(&self) -> &'static str {
        "RSS"
    }

    fn cache_file(&self) -> &'static str {
        CACHE_FILE
    }
}

impl RssCollector {
    async fn fetch_one(&self, source: &RssSource) -> Result<Vec<Article>> {
        let body = self
            .client
            .get(&source.url)
            .send()
            .await
            .with_context(|| format!("fetching feed {}", source.url))?
            .error_for_status()
            .with_context(|| format!("feed {} returned an error status", source.name))?
            .text()
            .await
            .context("reading feed body")?;
        parse_feed(&body, source)
    }
}
