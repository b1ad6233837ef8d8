// src/store/cache.rs
//! Flat-file JSON cache: one array document per collector under the outputs
//! directory. The append path rewrites the file in full; timestamps are
//! already RFC 3339 text through the Article serde form.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::collect::types::Article;

/// Read a cache file. A missing or unparseable file reads as empty.
pub fn read_articles(path: &Path) -> Vec<Article> {
    let raw = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    match serde_json::from_str(&raw) {
        Ok(articles) => articles,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = ?e, "unreadable cache file treated as empty");
            Vec::new()
        }
    }
}

/// Append articles and rewrite the whole file. No dedup happens here; the
/// caller already deduplicated. Returns the number appended this call.
pub fn append_articles(path: &Path, articles: &[Article]) -> Result<usize> {
    if articles.is_empty() {
        return Ok(0);
    }

    let mut all = read_articles(path);
    all.extend_from_slice(articles);

    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating cache dir {}", dir.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(&all).context("serializing cache file")?;
    fs::write(path, json).with_context(|| format!("writing cache file {}", path.display()))?;

    Ok(articles.len())
}

/// Article count in one cache file, for the stats endpoint.
pub fn article_count(path: &Path) -> usize {
    read_articles(path).len()
}
