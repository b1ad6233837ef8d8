// tests/api_http.rs
//! Router-level smoke tests against in-memory sinks; no databases or
//! upstream providers involved.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt; // for oneshot

use newsdesk_aggregator::api::{create_router, AppState};
use newsdesk_aggregator::collect::scheduler::Scheduler;
use newsdesk_aggregator::collect::types::{Collector, Family};
use newsdesk_aggregator::config::SourceLists;
use newsdesk_aggregator::live_log::LiveLog;
use newsdesk_aggregator::store::{MemoryMirror, MemoryStore, MultiSinkWriter};
use newsdesk_aggregator::Article;

struct StubCollector;

#[async_trait::async_trait]
impl Collector for StubCollector {
    async fn fetch_and_transform(&self) -> anyhow::Result<Vec<Article>> {
        Ok(vec![
            Article {
                title: "Fed Cuts Rates".into(),
                url: "http://example.com/fed".into(),
                source_name: Some("Reuters".into()),
                ..Default::default()
            },
            Article {
                title: "Dollar Slips".into(),
                url: "http://example.com/dollar".into(),
                source_name: Some("Bloomberg".into()),
                ..Default::default()
            },
        ])
    }

    fn name(&self) -> &'static str {
        "stub"
    }

    fn cache_file(&self) -> &'static str {
        "stub.json"
    }
}

fn build_state(dir: &tempfile::TempDir) -> AppState {
    let writer = Arc::new(MultiSinkWriter::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryMirror::new()),
        dir.path(),
    ));
    let log = LiveLog::new(16);
    let scheduler = Arc::new(Scheduler::new(
        writer.clone(),
        log.clone(),
        vec![Box::new(StubCollector)],
        Vec::new(),
    ));
    AppState {
        scheduler,
        writer,
        log,
        sources: Arc::new(SourceLists::default()),
    }
}

async fn get_json(
    app: &axum::Router,
    method: &str,
    uri: &str,
) -> (StatusCode, serde_json::Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::empty())
        .expect("build request");
    let resp = app.clone().oneshot(req).await.expect("router response");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_reports_ok() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(build_state(&dir));

    let (status, body) = get_json(&app, "GET", "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn status_before_any_run_is_idle() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(build_state(&dir));

    let (status, body) = get_json(&app, "GET", "/api/scheduler/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["api"]["running"], false);
    assert!(body["api"]["last_run_at"].is_null());
    assert_eq!(body["api"]["new_count_session"], 0);
}

#[tokio::test]
async fn manual_collect_persists_and_lists_articles() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(build_state(&dir));

    let (status, body) = get_json(&app, "POST", "/api/collect/api").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["new_article_count"], 2);
    assert_eq!(body["error_flag"], false);
    assert_eq!(body["articles"].as_array().unwrap().len(), 2);

    let (_, news) = get_json(&app, "GET", "/api/news?limit=10").await;
    assert_eq!(news["success"], true);
    assert_eq!(news["count"], 2);

    let (_, filtered) = get_json(&app, "GET", "/api/news?source=reuters").await;
    assert_eq!(filtered["count"], 1);

    let (_, stats) = get_json(&app, "GET", "/api/stats").await;
    assert_eq!(stats["success"], true);
    assert_eq!(stats["database_count"], 2);
    assert_eq!(stats["mirror_count"], 2);
    assert_eq!(stats["source_stats"]["stub"], 2);
}

#[tokio::test]
async fn repeat_manual_collect_finds_only_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(build_state(&dir));

    let _ = get_json(&app, "POST", "/api/collect/api").await;
    let (_, second) = get_json(&app, "POST", "/api/collect/api").await;
    assert_eq!(second["new_article_count"], 0);
    assert_eq!(second["duplicates"], 2);
}

#[tokio::test]
async fn scheduler_start_guard_via_http() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(build_state(&dir));

    let start = |body: &str| {
        let req = Request::builder()
            .method("POST")
            .uri("/api/scheduler/start")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("build request");
        app.clone().oneshot(req)
    };

    let resp = start(r#"{"family":"api","interval_secs":3600}"#).await.unwrap();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["started"], true);

    let resp = start(r#"{"family":"api","interval_secs":3600}"#).await.unwrap();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["started"], false);
    assert_eq!(body["message"], "already running");

    let req = Request::builder()
        .method("POST")
        .uri("/api/scheduler/stop")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"family":"api"}"#))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["stopped"], true);
}

#[tokio::test]
async fn sources_endpoint_echoes_configuration() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(build_state(&dir));

    let (status, body) = get_json(&app, "GET", "/api/sources").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["sources"]["api"].is_array());
    assert!(body["sources"]["rss"].is_array());
}
