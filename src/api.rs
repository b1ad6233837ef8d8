// src/api.rs
//! Thin HTTP layer over the collection core: manual triggers, scheduler
//! control, stats, article listing, and the live log WebSocket.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;

use crate::collect::scheduler::Scheduler;
use crate::collect::types::Family;
use crate::config::SourceLists;
use crate::live_log::{LiveLog, LogEvent};
use crate::store::{cache, MultiSinkWriter};

const DEFAULT_NEWS_LIMIT: i64 = 50;
const DEFAULT_INTERVAL_SECS: u64 = 300;

#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<Scheduler>,
    pub writer: Arc<MultiSinkWriter>,
    pub log: LiveLog,
    pub sources: Arc<SourceLists>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health))
        .route("/api/news", get(news))
        .route("/api/stats", get(stats))
        .route("/api/sources", get(sources))
        .route("/api/collect/api", post(collect_api))
        .route("/api/collect/rss", post(collect_rss))
        .route("/api/scheduler/start", post(scheduler_start))
        .route("/api/scheduler/stop", post(scheduler_stop))
        .route("/api/scheduler/status", get(scheduler_status))
        .route("/ws/logs", get(ws_logs))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>News Aggregation Service</title></head>
<body>
<h1>News Aggregation Service</h1>
<ul>
  <li>GET /api/health</li>
  <li>GET /api/news?limit=50&amp;source=reuters</li>
  <li>GET /api/stats</li>
  <li>GET /api/sources</li>
  <li>POST /api/collect/api | /api/collect/rss</li>
  <li>POST /api/scheduler/start | /api/scheduler/stop</li>
  <li>GET /api/scheduler/status</li>
  <li>GET /ws/logs (WebSocket)</li>
  <li>GET /metrics</li>
</ul>
</body>
</html>
"#;

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(serde::Deserialize)]
struct NewsQuery {
    limit: Option<i64>,
    source: Option<String>,
}

async fn news(State(state): State<AppState>, Query(q): Query<NewsQuery>) -> Json<serde_json::Value> {
    let limit = q.limit.unwrap_or(DEFAULT_NEWS_LIMIT).clamp(1, 500);
    match state
        .writer
        .relational()
        .recent_articles(limit, q.source.as_deref())
        .await
    {
        Ok(articles) => Json(json!({
            "success": true,
            "count": articles.len(),
            "articles": articles,
        })),
        Err(e) => Json(json!({
            "success": false,
            "error": format!("{e:#}"),
            "count": 0,
            "articles": [],
        })),
    }
}

async fn stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    let db_count = state.writer.relational().total_count().await.unwrap_or(0);
    let mirror_count = state.writer.mirror().total_count().await.unwrap_or(0);

    let mut source_stats = serde_json::Map::new();
    for file in state.scheduler.cache_files() {
        let name = file.trim_end_matches(".json").to_string();
        let count = cache::article_count(&state.writer.cache_path(file));
        source_stats.insert(name, json!(count));
    }

    Json(json!({
        "success": true,
        "database_count": db_count,
        "mirror_count": mirror_count,
        "source_stats": source_stats,
        "last_updated": Utc::now().to_rfc3339(),
    }))
}

async fn sources(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "sources": {
            "api": state.sources.api,
            "rss": state.sources.rss,
        },
    }))
}

async fn collect_api(State(state): State<AppState>) -> Json<serde_json::Value> {
    run_family(state, Family::Api).await
}

async fn collect_rss(State(state): State<AppState>) -> Json<serde_json::Value> {
    run_family(state, Family::Rss).await
}

async fn run_family(state: AppState, family: Family) -> Json<serde_json::Value> {
    let summary = state.scheduler.run_family_once(family).await;
    let preview: Vec<_> = summary.new_articles.iter().take(10).collect();
    Json(json!({
        "success": true,
        "family": family,
        "new_article_count": summary.new_articles.len(),
        "duplicates": summary.duplicates,
        "error_flag": summary.had_error,
        "articles": preview,
    }))
}

#[derive(serde::Deserialize)]
struct StartRequest {
    family: Family,
    interval_secs: Option<u64>,
}

async fn scheduler_start(
    State(state): State<AppState>,
    Json(req): Json<StartRequest>,
) -> Json<serde_json::Value> {
    let interval = Duration::from_secs(req.interval_secs.unwrap_or(DEFAULT_INTERVAL_SECS).max(1));
    let started = state.scheduler.start(req.family, interval);
    Json(json!({
        "success": true,
        "family": req.family,
        "started": started,
        "message": if started { "collection started" } else { "already running" },
    }))
}

#[derive(serde::Deserialize)]
struct StopRequest {
    family: Family,
}

async fn scheduler_stop(
    State(state): State<AppState>,
    Json(req): Json<StopRequest>,
) -> Json<serde_json::Value> {
    let stopped = state.scheduler.stop(req.family);
    Json(json!({
        "success": true,
        "family": req.family,
        "stopped": stopped,
        "message": if stopped { "stop requested" } else { "not running" },
    }))
}

async fn scheduler_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "api": state.scheduler.status(Family::Api),
        "rss": state.scheduler.status(Family::Rss),
    }))
}

async fn ws_logs(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let rx = state.log.subscribe();
    ws.on_upgrade(move |socket| stream_logs(socket, rx))
}

async fn stream_logs(mut socket: WebSocket, mut rx: broadcast::Receiver<LogEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                let Ok(text) = serde_json::to_string(&event) else {
                    continue;
                };
                if socket.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            // A slow client just misses the lagged entries.
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
