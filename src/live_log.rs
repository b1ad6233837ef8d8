// src/live_log.rs
//! Observability sink: a broadcast channel of log/data events that the
//! WebSocket endpoint streams to connected clients. Pushes are
//! fire-and-forget and never block or fail the pipeline.

use tokio::sync::broadcast;

#[derive(Debug, Clone, serde::Serialize)]
pub struct LogEvent {
    #[serde(rename = "type")]
    pub kind: &'static str, // "log" | "data"
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

#[derive(Clone)]
pub struct LiveLog {
    tx: broadcast::Sender<LogEvent>,
}

impl LiveLog {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Push a human-readable log line. Dropped silently when nobody listens.
    pub fn push_log(&self, message: impl Into<String>) {
        let _ = self.tx.send(LogEvent {
            kind: "log",
            timestamp: timestamp(),
            message: Some(message.into()),
            payload: None,
        });
    }

    /// Push a structured data update (e.g. freshly inserted articles).
    pub fn push_data(&self, payload: serde_json::Value) {
        let _ = self.tx.send(LogEvent {
            kind: "data",
            timestamp: timestamp(),
            message: None,
            payload: Some(payload),
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.tx.subscribe()
    }
}

impl Default for LiveLog {
    fn default() -> Self {
        Self::new(256)
    }
}

fn timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
