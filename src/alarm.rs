//! Markdown alarm delivery to a chat-bot webhook.
//!
//! Delivery is best effort: failures are written to the logger and never
//! returned, so alerting cannot break the code that raises the alert.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Duration};

use crate::error::AlarmError;
use crate::facade::ContextLogger;

/// Pause between two delivery attempts.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Client-side timeout of a single POST.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Markdown text of an alarm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownContent {
    pub content: String,
}

impl MarkdownContent {
    pub fn new(content: impl Into<String>) -> Self {
        MarkdownContent {
            content: content.into(),
        }
    }
}

/// Webhook envelope: `{"msgtype":"markdown","markdown":{"content":...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownMessage {
    pub msgtype: String,
    pub markdown: MarkdownContent,
}

impl MarkdownMessage {
    pub fn new(markdown: MarkdownContent) -> Self {
        MarkdownMessage {
            msgtype: "markdown".to_string(),
            markdown,
        }
    }
}

/// Sends an already-encoded JSON body to a webhook.
#[async_trait]
pub trait AlarmTransport: Send + Sync {
    /// POST `body` to `url` with `Content-Type: application/json`.
    ///
    /// **Returns**
    /// - `Ok((status, body))` once a response was fully read, whatever the
    ///   status.
    /// - `Err(..)` if the request could not be built, sent or read.
    async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<(u16, String), AlarmError>;
}

/// [`AlarmTransport`] over `reqwest`, bounded by [`REQUEST_TIMEOUT`].
#[derive(Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        HttpTransport { client }
    }
}

#[async_trait]
impl AlarmTransport for HttpTransport {
    async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<(u16, String), AlarmError> {
        let request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .timeout(REQUEST_TIMEOUT)
            .body(body)
            .build()
            .map_err(|e| AlarmError::Build(e.to_string()))?;

        let resp = self
            .client
            .execute(request)
            .await
            .map_err(|e| AlarmError::Send(e.to_string()))?;

        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .map_err(|e| AlarmError::ReadBody(e.to_string()))?;
        Ok((status, text))
    }
}

/// Delivers markdown alarms with bounded retries.
///
/// **Behavior**
/// - Up to `retry_count` POSTs, stopping at the first HTTP 200.
/// - [`RETRY_BACKOFF`] (or the configured backoff) between attempts, never
///   after the last one.
/// - Every failed attempt is logged at `error`, a delivery at `info`, and
///   running out of attempts at `error` once more.
pub struct AlarmNotifier<T = HttpTransport> {
    transport: T,
    logger: ContextLogger,
    backoff: Duration,
}

impl AlarmNotifier<HttpTransport> {
    pub fn new(logger: ContextLogger) -> Self {
        AlarmNotifier::with_transport(HttpTransport::new(), logger)
    }
}

impl<T: AlarmTransport> AlarmNotifier<T> {
    pub fn with_transport(transport: T, logger: ContextLogger) -> Self {
        AlarmNotifier {
            transport,
            logger,
            backoff: RETRY_BACKOFF,
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Send `content` to `url`, trying at most `retry_count` times.
    ///
    /// Returns once delivered or out of attempts; the outcome is only
    /// visible in the log.
    pub async fn send_markdown(&self, url: &str, retry_count: usize, content: &MarkdownContent) {
        let body = match serde_json::to_vec(&MarkdownMessage::new(content.clone())) {
            Ok(body) => body,
            Err(e) => {
                self.logger
                    .errorf(format_args!("send alarm failed: {}", AlarmError::Encode(e)));
                return;
            }
        };

        for attempt in 1..=retry_count {
            match self.deliver(url, &body).await {
                Ok(()) => return,
                Err(e) => {
                    self.logger
                        .with_field("attempt", attempt)
                        .errorf(format_args!("send alarm failed: {}", e));
                    if attempt < retry_count {
                        sleep(self.backoff).await;
                    }
                }
            }
        }

        if retry_count > 0 {
            self.logger
                .with_field("attempts", retry_count)
                .errorf(format_args!("send alarm gave up after {} attempts", retry_count));
        }
    }

    async fn deliver(&self, url: &str, body: &[u8]) -> Result<(), AlarmError> {
        let (status, text) = self.transport.post_json(url, body.to_vec()).await?;
        if status != 200 {
            return Err(AlarmError::Status { status, body: text });
        }
        self.logger
            .infof(format_args!("send alarm success. code: {}, body: {}", status, text));
        Ok(())
    }
}

/// Send a markdown alarm over HTTP, logging through the global logger
/// (or a console logger if none was initialized).
pub async fn try_send_alarm_markdown(url: &str, retry_count: usize, content: &MarkdownContent) {
    let logger = crate::init::global().unwrap_or_default();
    AlarmNotifier::new(logger)
        .send_markdown(url, retry_count, content)
        .await;
}
