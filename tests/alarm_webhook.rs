//! End-to-end delivery against an in-process webhook.

#![cfg(feature = "alarm")]

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use ctx_log_bridge::alarm::{AlarmNotifier, MarkdownContent, MarkdownMessage};
use ctx_log_bridge::capture::CaptureSink;
use ctx_log_bridge::{ContextLogger, Level, Logger};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Fails the first `failures` requests with 500, then answers 200.
struct Hook {
    failures: usize,
    hits: AtomicUsize,
    bodies: Mutex<Vec<(Option<String>, String)>>,
}

async fn receive(
    State(hook): State<Arc<Hook>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    hook.bodies.lock().unwrap().push((content_type, body));

    let n = hook.hits.fetch_add(1, Ordering::SeqCst);
    if n < hook.failures {
        (StatusCode::INTERNAL_SERVER_ERROR, "try later".to_string())
    } else {
        (StatusCode::OK, r#"{"errcode":0,"errmsg":"ok"}"#.to_string())
    }
}

async fn spawn_hook(failures: usize) -> (String, Arc<Hook>) {
    let hook = Arc::new(Hook {
        failures,
        hits: AtomicUsize::new(0),
        bodies: Mutex::new(Vec::new()),
    });
    let app = Router::new()
        .route("/send", post(receive))
        .with_state(Arc::clone(&hook));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/send", addr), hook)
}

fn notifier() -> (AlarmNotifier, CaptureSink) {
    let sink = CaptureSink::new();
    let logger = ContextLogger::new(Logger::new(Arc::new(sink.clone()), Level::Debug));
    let notifier = AlarmNotifier::new(logger).with_backoff(Duration::from_millis(20));
    (notifier, sink)
}

#[tokio::test]
async fn retries_until_the_webhook_accepts() {
    let (url, hook) = spawn_hook(2).await;
    let (notifier, sink) = notifier();

    notifier
        .send_markdown(&url, 3, &MarkdownContent::new("**room-7** crashed"))
        .await;

    assert_eq!(hook.hits.load(Ordering::SeqCst), 3);
    let bodies = hook.bodies.lock().unwrap();
    for (content_type, body) in bodies.iter() {
        assert_eq!(content_type.as_deref(), Some("application/json"));
        let msg: MarkdownMessage = serde_json::from_str(body).unwrap();
        assert_eq!(msg.msgtype, "markdown");
        assert_eq!(msg.markdown.content, "**room-7** crashed");
    }
    assert!(sink.contains("send alarm success. code: 200"));
}

#[tokio::test]
async fn persistent_failure_is_only_logged() {
    let (url, hook) = spawn_hook(usize::MAX).await;
    let (notifier, sink) = notifier();

    notifier
        .send_markdown(&url, 2, &MarkdownContent::new("db unreachable"))
        .await;

    assert_eq!(hook.hits.load(Ordering::SeqCst), 2);
    assert!(sink.contains("code: 500"));
    assert_eq!(sink.last().unwrap().message, "send alarm gave up after 2 attempts");
}

#[tokio::test]
async fn unreachable_webhook_does_not_escape() {
    let (notifier, sink) = notifier();

    notifier
        .send_markdown("http://127.0.0.1:1/send", 1, &MarkdownContent::new("x"))
        .await;

    assert!(sink.contains("send http request"));
}
