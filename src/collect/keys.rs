// src/collect/keys.rs
//! Existing-key index: the set of title/url keys already persisted anywhere,
//! loaded fresh before each dedup pass.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::collect::normalize_title;
use crate::store::{cache, RelationalStore};

/// Title keys are normalized, url keys are verbatim. Empty keys are never
/// inserted, so an empty title or url cannot collide.
#[derive(Debug, Default)]
pub struct ExistingKeys {
    pub titles: HashSet<String>,
    pub urls: HashSet<String>,
}

impl ExistingKeys {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Union keys from the relational store and every flat-file cache.
    ///
    /// Degrades rather than fails: an unreachable store means cache-only keys,
    /// a missing or unparseable cache file contributes nothing.
    pub async fn load(relational: &dyn RelationalStore, cache_files: &[PathBuf]) -> Self {
        let mut keys = Self::empty();

        match relational.title_url_pairs().await {
            Ok(rows) => {
                for (title, url) in rows {
                    if let Some(t) = title {
                        keys.insert_title(&t);
                    }
                    if let Some(u) = url {
                        keys.insert_url(u);
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = ?e,
                    "relational store unreachable while loading dedup keys; using cache files only"
                );
            }
        }

        for path in cache_files {
            for article in cache::read_articles(path) {
                keys.insert_title(&article.title);
                keys.insert_url(article.url);
            }
        }

        keys
    }

    fn insert_title(&mut self, title: &str) {
        let norm = normalize_title(title);
        if !norm.is_empty() {
            self.titles.insert(norm);
        }
    }

    fn insert_url(&mut self, url: String) {
        if !url.is_empty() {
            self.urls.insert(url);
        }
    }
}
