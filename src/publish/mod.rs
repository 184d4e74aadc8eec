// src/publish/mod.rs
//! Announcement publishing with a bounded retry budget.
//!
//! Each attempt is classified as success (HTTP 200), auth/rate-limit
//! (400, 403, 429: alerted right away, still retried), other failure (logged,
//! retried) or transport error (logged and alerted, retried). Attempts are
//! spaced `attempt * backoff_step` apart; there is no wait after the last one.

pub mod facebook;

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;

use crate::alert::AlertSink;
use crate::error::PublishError;
use crate::resolve::TrackIdentity;

pub use facebook::GraphApiPoster;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_secs(3);
/// Upper bound for the per-attempt backoff step.
pub const MAX_BACKOFF_STEP: Duration = Duration::from_secs(300);

/// Longest response body excerpt carried into alerts and logs.
const BODY_EXCERPT_CHARS: usize = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub message: String,
    pub art_url: Option<String>,
    pub stream_url: String,
}

impl Announcement {
    pub fn for_track(track: &TrackIdentity, art_url: Option<String>, stream_url: String) -> Self {
        Self {
            message: format!("🎵 Now playing: \"{}\" by {}", track.title, track.artist),
            art_url,
            stream_url,
        }
    }

    /// Post text: the message plus the listen-live call to action.
    pub fn caption(&self) -> String {
        format!("{}\n\n🎧 Listen live: {}", self.message, self.stream_url)
    }
}

/// Raw answer from the social endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostResponse {
    pub status: u16,
    pub body: String,
}

/// Transport for a single photo post. No retries at this level.
#[async_trait::async_trait]
pub trait PhotoPoster: Send + Sync {
    async fn post_photo(&self, caption: &str, art_url: Option<&str>)
        -> Result<PostResponse, PublishError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptClass {
    Success,
    /// 400 / 403 / 429: expired token, missing permission, quota.
    AuthOrRateLimit,
    Retryable,
    TransportError,
}

pub fn classify(status: u16) -> AttemptClass {
    match status {
        200 => AttemptClass::Success,
        400 | 403 | 429 => AttemptClass::AuthOrRateLimit,
        _ => AttemptClass::Retryable,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishAttempt {
    /// 1-based.
    pub attempt: u32,
    pub status: Option<u16>,
    pub class: AttemptClass,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub attempts: Vec<PublishAttempt>,
}

impl PublishReport {
    pub fn succeeded(&self) -> bool {
        self.attempts
            .last()
            .is_some_and(|a| a.class == AttemptClass::Success)
    }
}

/// What the poll loop needs from a publisher.
#[async_trait::async_trait]
pub trait AnnouncementPublisher: Send + Sync {
    async fn publish(&self, announcement: &Announcement) -> bool;
}

pub struct RetryingPublisher<P> {
    poster: P,
    alerts: Arc<dyn AlertSink>,
    max_attempts: u32,
    backoff_step: Duration,
}

impl<P: PhotoPoster> RetryingPublisher<P> {
    pub fn new(poster: P, alerts: Arc<dyn AlertSink>) -> Self {
        Self {
            poster,
            alerts,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_step: DEFAULT_BACKOFF_STEP,
        }
    }

    /// Values below 1 are treated as 1.
    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n.max(1);
        self
    }

    /// Clamped to [`MAX_BACKOFF_STEP`].
    pub fn with_backoff_step(mut self, step: Duration) -> Self {
        self.backoff_step = step.min(MAX_BACKOFF_STEP);
        self
    }

    pub fn poster(&self) -> &P {
        &self.poster
    }

    pub async fn publish_report(&self, announcement: &Announcement) -> PublishReport {
        let caption = announcement.caption();
        let mut report = PublishReport::default();

        for attempt in 1..=self.max_attempts {
            counter!("announcer_publish_attempts_total").increment(1);

            let record = match self
                .poster
                .post_photo(&caption, announcement.art_url.as_deref())
                .await
            {
                Ok(resp) => {
                    let class = classify(resp.status);
                    let detail = excerpt(&resp.body);
                    match class {
                        AttemptClass::Success => {
                            tracing::info!(target: "announcer", attempt, status = resp.status, "posted to Facebook");
                        }
                        AttemptClass::AuthOrRateLimit => {
                            tracing::warn!(target: "announcer", attempt, status = resp.status, body = %detail, "Facebook rejected the post");
                            self.alerts
                                .alert(&format!(
                                    "Facebook rejected the post with HTTP {} (auth or rate limit, attempt {attempt}/{}): {detail}",
                                    resp.status, self.max_attempts
                                ))
                                .await;
                        }
                        _ => {
                            tracing::warn!(target: "announcer", attempt, status = resp.status, body = %detail, "Facebook post failed");
                        }
                    }
                    PublishAttempt {
                        attempt,
                        status: Some(resp.status),
                        class,
                        detail,
                    }
                }
                Err(e) => {
                    tracing::warn!(target: "announcer", attempt, error = %e, "Facebook post errored");
                    self.alerts
                        .alert(&format!(
                            "Facebook post error (attempt {attempt}/{}): {e}",
                            self.max_attempts
                        ))
                        .await;
                    PublishAttempt {
                        attempt,
                        status: None,
                        class: AttemptClass::TransportError,
                        detail: e.to_string(),
                    }
                }
            };

            let done = record.class == AttemptClass::Success;
            report.attempts.push(record);
            if done {
                counter!("announcer_posts_total").increment(1);
                return report;
            }

            if attempt < self.max_attempts {
                let wait = self.backoff_step.saturating_mul(attempt);
                tracing::debug!(target: "announcer", attempt, wait_secs = wait.as_secs_f64(), "backing off before retry");
                tokio::time::sleep(wait).await;
            }
        }

        counter!("announcer_publish_failures_total").increment(1);
        tracing::error!(target: "announcer", attempts = self.max_attempts, "giving up on this announcement");
        report
    }
}

#[async_trait::async_trait]
impl<P: PhotoPoster> AnnouncementPublisher for RetryingPublisher<P> {
    async fn publish(&self, announcement: &Announcement) -> bool {
        self.publish_report(announcement).await.succeeded()
    }
}

fn excerpt(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= BODY_EXCERPT_CHARS {
        body.to_string()
    } else {
        let mut s: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
        s.push('…');
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    struct Scripted {
        replies: Mutex<VecDeque<Result<PostResponse, PublishError>>>,
        seen: Mutex<Vec<(String, Option<String>)>>,
    }

    impl Scripted {
        fn statuses(codes: &[u16]) -> Self {
            Self {
                replies: Mutex::new(
                    codes
                        .iter()
                        .map(|&status| {
                            Ok(PostResponse {
                                status,
                                body: format!("{{\"code\":{status}}}"),
                            })
                        })
                        .collect(),
                ),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.seen.lock().len()
        }
    }

    #[async_trait::async_trait]
    impl PhotoPoster for Scripted {
        async fn post_photo(
            &self,
            caption: &str,
            art_url: Option<&str>,
        ) -> Result<PostResponse, PublishError> {
            self.seen
                .lock()
                .push((caption.to_string(), art_url.map(str::to_string)));
            self.replies.lock().pop_front().unwrap_or(Ok(PostResponse {
                status: 500,
                body: String::new(),
            }))
        }
    }

    #[derive(Default)]
    struct Alerts(Mutex<Vec<String>>);

    #[async_trait::async_trait]
    impl AlertSink for Alerts {
        async fn alert(&self, message: &str) {
            self.0.lock().push(message.to_string());
        }
    }

    fn announcement() -> Announcement {
        let track = TrackIdentity {
            artist: "DJ X".into(),
            title: "Azure".into(),
        };
        Announcement::for_track(&track, Some("http://img".into()), "http://stream".into())
    }

    fn publisher(codes: &[u16]) -> (RetryingPublisher<Scripted>, Arc<Alerts>) {
        let alerts = Arc::new(Alerts::default());
        let p = RetryingPublisher::new(Scripted::statuses(codes), alerts.clone())
            .with_backoff_step(Duration::ZERO);
        (p, alerts)
    }

    #[test]
    fn caption_has_message_and_listen_link() {
        let a = announcement();
        assert_eq!(a.message, "🎵 Now playing: \"Azure\" by DJ X");
        assert_eq!(
            a.caption(),
            "🎵 Now playing: \"Azure\" by DJ X\n\n🎧 Listen live: http://stream"
        );
    }

    #[test]
    fn classification_table() {
        assert_eq!(classify(200), AttemptClass::Success);
        assert_eq!(classify(400), AttemptClass::AuthOrRateLimit);
        assert_eq!(classify(403), AttemptClass::AuthOrRateLimit);
        assert_eq!(classify(429), AttemptClass::AuthOrRateLimit);
        assert_eq!(classify(201), AttemptClass::Retryable);
        assert_eq!(classify(500), AttemptClass::Retryable);
        assert_eq!(classify(401), AttemptClass::Retryable);
    }

    #[tokio::test]
    async fn first_200_stops_immediately() {
        let (p, alerts) = publisher(&[200, 500]);
        assert!(p.publish(&announcement()).await);
        assert_eq!(p.poster().calls(), 1);
        assert!(alerts.0.lock().is_empty());
    }

    #[tokio::test]
    async fn recovers_on_third_attempt_with_one_alert_for_429() {
        let (p, alerts) = publisher(&[500, 429, 200]);
        let report = p.publish_report(&announcement()).await;

        assert!(report.succeeded());
        assert_eq!(report.attempts.len(), 3);
        assert_eq!(p.poster().calls(), 3);

        let alerts = alerts.0.lock();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].contains("HTTP 429"));
    }

    #[tokio::test]
    async fn auth_failure_does_not_abort_the_retry_loop() {
        let (p, alerts) = publisher(&[403, 403, 403]);
        assert!(!p.publish(&announcement()).await);
        assert_eq!(p.poster().calls(), 3);
        assert_eq!(alerts.0.lock().len(), 3);
    }

    #[tokio::test]
    async fn exhausting_budget_returns_false() {
        let (p, _alerts) = publisher(&[500, 502, 503]);
        let report = p.publish_report(&announcement()).await;
        assert!(!report.succeeded());
        let statuses: Vec<_> = report.attempts.iter().map(|a| a.status).collect();
        assert_eq!(statuses, vec![Some(500), Some(502), Some(503)]);
    }

    #[tokio::test]
    async fn transport_errors_are_alerted_and_retried() {
        // A closed local port gives a real connection error.
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:9/")
            .send()
            .await
            .unwrap_err();
        let poster = Scripted::statuses(&[]);
        poster
            .replies
            .lock()
            .extend([Err(PublishError::from_transport(err)), Ok(PostResponse {
                status: 200,
                body: "{\"id\":\"1\"}".into(),
            })]);

        let alerts = Arc::new(Alerts::default());
        let p = RetryingPublisher::new(poster, alerts.clone()).with_backoff_step(Duration::ZERO);
        let report = p.publish_report(&announcement()).await;

        assert!(report.succeeded());
        assert_eq!(report.attempts[0].class, AttemptClass::TransportError);
        assert_eq!(alerts.0.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_is_linear_in_attempt_number() {
        let alerts = Arc::new(Alerts::default());
        let p = RetryingPublisher::new(Scripted::statuses(&[500, 500, 500]), alerts);
        let start = tokio::time::Instant::now();

        assert!(!p.publish(&announcement()).await);

        // 1*3s + 2*3s, nothing after the final attempt.
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(9), "waited {waited:?}");
        assert!(waited < Duration::from_secs(10), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn huge_backoff_step_is_clamped_instead_of_overflowing() {
        let alerts = Arc::new(Alerts::default());
        let p = RetryingPublisher::new(Scripted::statuses(&[500, 500, 500]), alerts)
            .with_backoff_step(Duration::from_secs(u64::MAX));
        let start = tokio::time::Instant::now();

        assert!(!p.publish(&announcement()).await);
        assert_eq!(p.poster().calls(), 3);

        // 1*300s + 2*300s
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(900), "waited {waited:?}");
        assert!(waited < Duration::from_secs(901), "waited {waited:?}");
    }

    #[tokio::test]
    async fn art_url_is_passed_through() {
        let (p, _) = publisher(&[200]);
        p.publish(&announcement()).await;
        let seen = p.poster().seen.lock();
        assert_eq!(seen[0].1.as_deref(), Some("http://img"));
        assert!(seen[0].0.contains("Listen live: http://stream"));
    }

    #[test]
    fn long_bodies_are_cut() {
        let long = "x".repeat(1000);
        let cut = excerpt(&long);
        assert_eq!(cut.chars().count(), BODY_EXCERPT_CHARS + 1);
    }
}
