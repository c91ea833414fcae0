//! Chat webhook notifier (Discord-compatible payload).

use serde::Serialize;
use tracing::debug;
use url::Url;

use super::Notifier;
use crate::error::{FetchError, ToolError};
use crate::fetch::HttpClient;

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    content: &'a str,
}

/// Posts `{"content": "<message>"}` to a webhook URL.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    http: HttpClient,
    url: Url,
}

impl WebhookNotifier {
    pub fn new(http: HttpClient, url: Url) -> Self {
        Self { http, url }
    }

    async fn send(&self, message: &str) -> Result<(), FetchError> {
        let url = self.url.as_str();
        let response = self
            .http
            .client()
            .post(self.url.clone())
            .json(&WebhookMessage { content: message })
            .timeout(self.http.timeout())
            .send()
            .await
            .map_err(|e| crate::fetch::transport_error(url, &e))?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

impl Notifier for WebhookNotifier {
    fn post(&self, message: &str) -> Result<(), ToolError> {
        debug!(message, "Posting webhook notification");
        self.http.block_on(self.send(message))?;
        Ok(())
    }
}
