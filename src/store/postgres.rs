// src/store/postgres.rs
//! PostgreSQL sink. The pool is lazy so an unreachable database degrades
//! per-operation instead of failing boot; callers see the degradation as
//! zeroed counts through the multi-sink writer.

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;

use super::{RelationalStore, StoredArticle};
use crate::collect::types::Article;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS articles (
    id SERIAL PRIMARY KEY,
    title TEXT,
    description TEXT,
    url TEXT UNIQUE,
    image_url TEXT,
    published_at TIMESTAMPTZ,
    source_name TEXT,
    source_url TEXT,
    language TEXT,
    full_content TEXT,
    authors TEXT[],
    tickers TEXT[],
    topics TEXT[],
    created_at TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP
)
"#;

const INSERT: &str = r#"
INSERT INTO articles (title, description, url, image_url, published_at,
                      source_name, source_url, language, full_content,
                      authors, tickers, topics)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
ON CONFLICT (url) DO NOTHING
RETURNING id
"#;

const RECENT: &str = r#"
SELECT id, title, description, url, image_url, published_at,
       source_name, source_url, language, full_content,
       authors, tickers, topics, created_at
FROM articles
WHERE ($1::text IS NULL OR source_name ILIKE '%' || $1 || '%')
  AND (published_at IS NULL OR published_at <= NOW() + INTERVAL '2 days')
ORDER BY published_at DESC NULLS LAST, id DESC
LIMIT $2
"#;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn connect_lazy(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy(url)
            .context("building postgres pool")?;
        Ok(Self { pool })
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .context("creating articles table")?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl RelationalStore for PgStore {
    async fn insert_articles(&self, articles: &[Article]) -> Result<Vec<Article>> {
        if articles.is_empty() {
            return Ok(Vec::new());
        }
        // One connection up front: a dead database fails here, once, and the
        // writer degrades this sink as a whole.
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("acquiring postgres connection")?;

        let mut inserted = Vec::new();
        for article in articles {
            let row: std::result::Result<Option<i32>, sqlx::Error> = sqlx::query_scalar(INSERT)
                .bind(&article.title)
                .bind(&article.description)
                .bind(&article.url)
                .bind(&article.image_url)
                .bind(article.published_at)
                .bind(&article.source_name)
                .bind(&article.source_url)
                .bind(&article.language)
                .bind(&article.full_content)
                .bind(&article.authors)
                .bind(&article.tickers)
                .bind(&article.topics)
                .fetch_optional(&mut *conn)
                .await;
            match row {
                Ok(Some(_id)) => inserted.push(article.clone()),
                Ok(None) => {} // url conflict: silent no-op
                Err(e) => {
                    tracing::warn!(url = %article.url, error = ?e, "article insert failed, skipping row");
                }
            }
        }
        Ok(inserted)
    }

    async fn title_url_pairs(&self) -> Result<Vec<(Option<String>, Option<String>)>> {
        let rows = sqlx::query("SELECT title, url FROM articles")
            .fetch_all(&self.pool)
            .await
            .context("loading title/url pairs")?;
        Ok(rows
            .into_iter()
            .map(|r| (r.get("title"), r.get("url")))
            .collect())
    }

    async fn recent_articles(
        &self,
        limit: i64,
        source: Option<&str>,
    ) -> Result<Vec<StoredArticle>> {
        let rows = sqlx::query_as::<_, StoredArticle>(RECENT)
            .bind(source)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("fetching recent articles")?;
        Ok(rows)
    }

    async fn total_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await
            .context("counting articles")?;
        Ok(count)
    }
}
