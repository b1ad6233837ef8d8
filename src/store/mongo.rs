// src/store/mongo.rs
//! MongoDB mirror: bulk ReplaceOne upserts keyed by url. Best-effort by
//! design; an unreachable server surfaces as an error the writer turns into
//! a zero count.

use std::time::Duration;

use anyhow::{Context, Result};
use mongodb::bson::{doc, Document};
use mongodb::options::{ClientOptions, ReplaceOneModel, WriteModel};
use mongodb::{Client, Collection, Namespace};

use super::DocumentMirror;
use crate::collect::types::Article;

const COLLECTION: &str = "articles";

pub struct MongoMirror {
    client: Client,
    namespace: Namespace,
}

impl MongoMirror {
    pub async fn connect(uri: &str, db: &str) -> Result<Self> {
        let mut options = ClientOptions::parse(uri)
            .await
            .context("parsing mongo uri")?;
        // Fail fast instead of the driver's 30s default when the mirror is down.
        options.server_selection_timeout = Some(Duration::from_secs(5));
        let client = Client::with_options(options).context("building mongo client")?;
        Ok(Self {
            client,
            namespace: Namespace::new(db, COLLECTION),
        })
    }

    fn collection(&self) -> Collection<Document> {
        self.client
            .database(&self.namespace.db)
            .collection(&self.namespace.coll)
    }
}

#[async_trait::async_trait]
impl DocumentMirror for MongoMirror {
    async fn upsert_articles(&self, articles: &[Article]) -> Result<u64> {
        if articles.is_empty() {
            return Ok(0);
        }
        let mut models = Vec::with_capacity(articles.len());
        for article in articles {
            let replacement =
                mongodb::bson::to_document(article).context("serializing article to bson")?;
            models.push(WriteModel::ReplaceOne(
                ReplaceOneModel::builder()
                    .namespace(self.namespace.clone())
                    .filter(doc! { "url": &article.url })
                    .replacement(replacement)
                    .upsert(true)
                    .build(),
            ));
        }
        let result = self
            .client
            .bulk_write(models)
            .await
            .context("mongo bulk upsert")?;
        // matched (not modified): replacing an identical document still counts
        // as a write for reporting purposes.
        Ok((result.upserted_count + result.matched_count) as u64)
    }

    async fn total_count(&self) -> Result<u64> {
        let count = self
            .collection()
            .count_documents(doc! {})
            .await
            .context("counting mirrored articles")?;
        Ok(count)
    }
}
