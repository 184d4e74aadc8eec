// src/alert/mod.rs
//! Operator alerting. The core only ever calls [`AlertSink::alert`] with a
//! human-readable line; where it ends up is decided at start-up.

pub mod webhook;

use std::sync::Arc;

use metrics::counter;

pub use webhook::WebhookAlertSink;

#[async_trait::async_trait]
pub trait AlertSink: Send + Sync {
    /// Deliver one diagnostic line. Delivery failures are logged, never returned.
    async fn alert(&self, message: &str);
}

/// Writes alerts to the log at error level. Always part of the mux.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

#[async_trait::async_trait]
impl AlertSink for LogAlertSink {
    async fn alert(&self, message: &str) {
        tracing::error!(target: "alert", "{message}");
    }
}

/// Fans one alert out to every configured sink, in order.
#[derive(Clone)]
pub struct AlertMux {
    sinks: Vec<Arc<dyn AlertSink>>,
}

impl AlertMux {
    /// Log sink plus the webhook sink when a URL is configured.
    pub fn new(webhook_url: Option<&str>) -> Self {
        let mut sinks: Vec<Arc<dyn AlertSink>> = vec![Arc::new(LogAlertSink)];
        match webhook_url {
            Some(url) => sinks.push(Arc::new(WebhookAlertSink::new(url.to_string()))),
            None => tracing::debug!("alert webhook disabled (no ALERT_WEBHOOK_URL)"),
        }
        Self { sinks }
    }

    pub fn with_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Never zero: the log sink is always present.
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}

#[async_trait::async_trait]
impl AlertSink for AlertMux {
    async fn alert(&self, message: &str) {
        counter!("announcer_alerts_total").increment(1);
        for sink in &self.sinks {
            sink.alert(message).await;
        }
    }
}
