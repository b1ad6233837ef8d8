// src/config.rs
//! Environment configuration and source-list loading.
//!
//! Source lists live beside the binary (`sources/`), overridable through env
//! path variables; cache files land under the outputs directory with one file
//! per collector.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

const ENV_API_SOURCES_PATH: &str = "API_SOURCES_PATH";
const ENV_RSS_SOURCES_PATH: &str = "RSS_SOURCES_PATH";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub postgres_url: String,
    pub mongo_uri: String,
    pub mongo_db: String,
    pub newsapi_ai_key: Option<String>,
    pub thenewsapi_key: Option<String>,
    pub newsdata_key: Option<String>,
    pub tiingo_key: Option<String>,
    pub alpha_vantage_key: Option<String>,
    /// Per-provider fetch cap for one run.
    pub max_items: usize,
    pub cache_dir: PathBuf,
    /// When set, the family's periodic worker starts at boot.
    pub api_autostart_secs: Option<u64>,
    pub rss_autostart_secs: Option<u64>,
}

impl Config {
    pub fn from_env() -> Self {
        let host = env_or("APP_HOST", "0.0.0.0");
        let port = env_or("APP_PORT", "8000");

        let pg_host = env_or("POSTGRES_HOST", "localhost");
        let pg_port = env_or("POSTGRES_PORT", "5432");
        let pg_db = env_or("POSTGRES_DB", "news_db");
        let pg_user = env_or("POSTGRES_USER", "postgres");
        let pg_password = env_or("POSTGRES_PASSWORD", "");

        let mongo_host = env_or("MONGO_HOST", "localhost");
        let mongo_port = env_or("MONGO_PORT", "27017");

        Self {
            bind_addr: format!("{host}:{port}"),
            postgres_url: format!(
                "postgres://{pg_user}:{pg_password}@{pg_host}:{pg_port}/{pg_db}"
            ),
            mongo_uri: format!("mongodb://{mongo_host}:{mongo_port}"),
            mongo_db: env_or("MONGO_DB_NAME", "news_db_backup"),
            newsapi_ai_key: std::env::var("NEWSAPI_AI_API_KEY").ok(),
            thenewsapi_key: std::env::var("THENEWSAPI_API_KEY").ok(),
            newsdata_key: std::env::var("NEWSDATA_API_KEY").ok(),
            tiingo_key: std::env::var("TIINGO_API_KEY").ok(),
            alpha_vantage_key: std::env::var("ALPHA_VANTAGE_API_KEY").ok(),
            max_items: std::env::var("COLLECT_MAX_ITEMS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            cache_dir: PathBuf::from(env_or("OUTPUTS_DIR", "outputs")),
            api_autostart_secs: std::env::var("API_COLLECT_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok()),
            rss_autostart_secs: std::env::var("RSS_COLLECT_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    /// Pull a required credential out of an optional one, naming the variable
    /// in the error. Collector constructors call this exactly once.
    pub fn require_key(key: &Option<String>, var: &'static str) -> Result<String> {
        key.clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| anyhow!("{var} is not set"))
    }
}

fn env_or(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

/// One configured RSS/Atom feed.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RssSource {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub link: Option<String>,
}

/// The configured source lists, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct SourceLists {
    /// Domains the API collectors filter against.
    pub api: Vec<String>,
    pub rss: Vec<RssSource>,
}

impl SourceLists {
    pub fn load() -> Self {
        Self {
            api: load_api_sources().unwrap_or_else(|e| {
                tracing::warn!(error = ?e, "no API source list loaded");
                Vec::new()
            }),
            rss: load_rss_sources().unwrap_or_else(|e| {
                tracing::warn!(error = ?e, "no RSS source list loaded");
                Vec::new()
            }),
        }
    }
}

/// Load API source domains: $API_SOURCES_PATH, then `sources/api_sources.txt`.
/// Supports a plain line list (with `#` comments), a TOML `sources = []`
/// table, or a JSON array.
pub fn load_api_sources() -> Result<Vec<String>> {
    let path = match std::env::var(ENV_API_SOURCES_PATH) {
        Ok(p) => PathBuf::from(p),
        Err(_) => PathBuf::from("sources/api_sources.txt"),
    };
    if !path.exists() {
        return Ok(Vec::new());
    }
    load_api_sources_from(&path)
}

pub fn load_api_sources_from(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading api sources from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "toml" => parse_toml_sources(&content),
        "json" => parse_json_sources(&content),
        _ => Ok(clean_list(
            content
                .lines()
                .map(|l| l.trim())
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(str::to_string)
                .collect(),
        )),
    }
}

/// Load RSS feeds: $RSS_SOURCES_PATH, then `sources/rss_sources.json`.
pub fn load_rss_sources() -> Result<Vec<RssSource>> {
    let path = match std::env::var(ENV_RSS_SOURCES_PATH) {
        Ok(p) => PathBuf::from(p),
        Err(_) => PathBuf::from("sources/rss_sources.json"),
    };
    if !path.exists() {
        return Ok(Vec::new());
    }
    load_rss_sources_from(&path)
}

pub fn load_rss_sources_from(path: &Path) -> Result<Vec<RssSource>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading rss sources from {}", path.display()))?;
    let sources: Vec<RssSource> =
        serde_json::from_str(&content).context("parsing rss sources json")?;
    Ok(sources
        .into_iter()
        .filter(|s| !s.url.trim().is_empty())
        .collect())
}

fn parse_toml_sources(s: &str) -> Result<Vec<String>> {
    #[derive(serde::Deserialize)]
    struct TomlSources {
        sources: Vec<String>,
    }
    let v: TomlSources = toml::from_str(s).context("parsing toml source list")?;
    Ok(clean_list(v.sources))
}

fn parse_json_sources(s: &str) -> Result<Vec<String>> {
    let v: Vec<String> = serde_json::from_str(s).context("parsing json source list")?;
    Ok(clean_list(v))
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    use std::collections::BTreeSet;
    let mut set = BTreeSet::new();
    for it in items {
        let t = it.trim();
        if !t.is_empty() {
            set.insert(t.to_string());
        }
    }
    set.into_iter().collect()
}
