// src/publish/facebook.rs
//! Facebook Graph API page photo post (`POST /{page-id}/photos`).

use std::fmt;
use std::time::Duration;

use reqwest::Client;

use super::{PhotoPoster, PostResponse};
use crate::error::PublishError;

pub const DEFAULT_PUBLISH_TIMEOUT_SECS: u64 = 30;

#[derive(Clone)]
pub struct GraphApiPoster {
    endpoint: String,
    access_token: String,
    client: Client,
    timeout: Duration,
}

impl GraphApiPoster {
    /// `api_base` like `https://graph.facebook.com` (trailing slash tolerated).
    pub fn new(api_base: &str, page_id: &str, access_token: String) -> Self {
        Self {
            endpoint: format!("{}/{}/photos", api_base.trim_end_matches('/'), page_id),
            access_token,
            client: Client::new(),
            timeout: Duration::from_secs(DEFAULT_PUBLISH_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl fmt::Debug for GraphApiPoster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphApiPoster")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl PhotoPoster for GraphApiPoster {
    async fn post_photo(
        &self,
        caption: &str,
        art_url: Option<&str>,
    ) -> Result<PostResponse, PublishError> {
        let mut form: Vec<(&str, &str)> = vec![("caption", caption)];
        if let Some(url) = art_url {
            form.push(("url", url));
        }
        form.push(("access_token", self.access_token.as_str()));

        let resp = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .form(&form)
            .send()
            .await
            .map_err(PublishError::from_transport)?;

        let status = resp.status().as_u16();
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(target: "announcer", status, error = %e, "could not read Facebook response body");
                format!("<unreadable body: {e}>")
            }
        };
        tracing::debug!(target: "announcer", status, body = %body, "Facebook post response");
        Ok(PostResponse { status, body })
    }
}
