// src/alert/webhook.rs
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

use super::AlertSink;

/// Posts alerts as `{"text": ...}` to a Slack-compatible incoming webhook.
#[derive(Clone)]
pub struct WebhookAlertSink {
    url: String,
    client: Client,
    timeout: Duration,
}

impl WebhookAlertSink {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: Client::new(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    async fn send(&self, message: &str) -> Result<()> {
        let body = serde_json::json!({ "text": format!("*now-playing announcer:* {message}") });

        self.client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .context("alert webhook post")?
            .error_for_status()
            .context("alert webhook non-2xx")?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl AlertSink for WebhookAlertSink {
    async fn alert(&self, message: &str) {
        if let Err(e) = self.send(message).await {
            tracing::warn!(error = %format!("{e:#}"), "alert webhook delivery failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_text_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_string_contains("HTTP 429"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sink = WebhookAlertSink::new(format!("{}/hook", server.uri()));
        sink.alert("Facebook rejected the post with HTTP 429").await;
    }

    #[tokio::test]
    async fn delivery_failure_does_not_panic() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let sink = WebhookAlertSink::new(server.uri()).with_timeout(2);
        sink.alert("anything").await;
    }
}
