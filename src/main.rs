//! News aggregation service — binary entrypoint.
//! Boots the Axum HTTP server, wires the stores and the collection
//! scheduler, and optionally autostarts the periodic workers.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newsdesk_aggregator::api::{create_router, AppState};
use newsdesk_aggregator::collect::providers;
use newsdesk_aggregator::collect::scheduler::Scheduler;
use newsdesk_aggregator::collect::types::Family;
use newsdesk_aggregator::config::{Config, SourceLists};
use newsdesk_aggregator::live_log::LiveLog;
use newsdesk_aggregator::metrics::Metrics;
use newsdesk_aggregator::store::mongo::MongoMirror;
use newsdesk_aggregator::store::postgres::PgStore;
use newsdesk_aggregator::store::MultiSinkWriter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("newsdesk_aggregator=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = Config::from_env();
    let metrics = Metrics::init();

    let store = Arc::new(PgStore::connect_lazy(&cfg.postgres_url)?);
    if let Err(e) = store.ensure_schema().await {
        tracing::warn!(
            error = ?e,
            "could not ensure articles schema; relational sink degraded until the database is reachable"
        );
    }
    let mirror = Arc::new(
        MongoMirror::connect(&cfg.mongo_uri, &cfg.mongo_db)
            .await
            .context("configuring mongo mirror")?,
    );

    let writer = Arc::new(MultiSinkWriter::new(
        store.clone(),
        mirror.clone(),
        cfg.cache_dir.clone(),
    ));
    let log = LiveLog::default();
    let sources = Arc::new(SourceLists::load());

    let api_collectors = providers::api_collectors(&cfg, &sources)?;
    let rss_collectors = providers::rss_collectors(&sources)?;
    let scheduler = Arc::new(Scheduler::new(
        writer.clone(),
        log.clone(),
        api_collectors,
        rss_collectors,
    ));

    if let Some(secs) = cfg.api_autostart_secs {
        scheduler.start(Family::Api, Duration::from_secs(secs.max(1)));
    }
    if let Some(secs) = cfg.rss_autostart_secs {
        scheduler.start(Family::Rss, Duration::from_secs(secs.max(1)));
    }

    let state = AppState {
        scheduler,
        writer,
        log,
        sources,
    };
    let router = create_router(state).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    tracing::info!(addr = %cfg.bind_addr, "news aggregation service listening");
    axum::serve(listener, router).await.context("serving http")?;

    Ok(())
}
