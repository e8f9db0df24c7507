//! HTTP fetching with bounded retry.
//!
//! Every fetch makes up to `max_attempts` attempts back to back. A transport
//! error or a non-success status counts as a failed attempt.

use crate::error::{Result, ScanError};
use reqwest::header::{HeaderMap, HeaderValue, HOST};
use reqwest::{Client, RequestBuilder};
use scrapefrb_core::ScanningConfig;
use std::time::Duration;

/// Shared HTTP client for one run.
///
/// Cookies persist across requests so session-bound sources keep their
/// session between pages.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_attempts: u32,
}

impl HttpFetcher {
    /// Build a fetcher from the `[scanning]` configuration.
    pub fn from_config(config: &ScanningConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .cookie_store(true)
            .build()?;

        Ok(Self::with_client(client, config.max_attempts))
    }

    /// Wrap an existing client.
    #[must_use]
    pub fn with_client(client: Client, max_attempts: u32) -> Self {
        Self {
            client,
            max_attempts: max_attempts.max(1),
        }
    }

    /// The underlying client, shared with the downloader.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Attempts made per fetch.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// GET a page body, with optional query parameters.
    pub async fn get_text(&self, url: &str, query: &[(String, String)]) -> Result<String> {
        self.send_with_retry(url, || self.client.get(url).query(query))
            .await
    }

    /// GET and parse a JSON body.
    ///
    /// A body that is not JSON is not retried.
    pub async fn get_json(&self, url: &str) -> Result<serde_json::Value> {
        let body = self.send_with_retry(url, || self.client.get(url)).await?;
        serde_json::from_str(&body).map_err(|e| ScanError::Json {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// POST a form. `None` sends an empty body.
    pub async fn post_form(
        &self,
        url: &str,
        form: Option<&[(String, String)]>,
        host: Option<&str>,
    ) -> Result<String> {
        let mut headers = HeaderMap::new();
        if let Some(host) = host {
            let value = HeaderValue::from_str(host).map_err(|e| ScanError::InvalidUrl {
                url: host.to_string(),
                reason: e.to_string(),
            })?;
            headers.insert(HOST, value);
        }

        self.send_with_retry(url, || {
            let request = self.client.post(url).headers(headers.clone());
            match form {
                Some(form) => request.form(form),
                None => request.body(""),
            }
        })
        .await
    }

    async fn send_with_retry<F>(&self, url: &str, build: F) -> Result<String>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut last_status = None;

        for attempt in 1..=self.max_attempts {
            tracing::debug!("Loading {} (attempt {}/{})", url, attempt, self.max_attempts);

            match build().send().await {
                Ok(response) if response.status().is_success() => match response.text().await {
                    Ok(body) => return Ok(body),
                    Err(e) => {
                        tracing::info!(
                            "Failed reading body of {}: {}. Retrying ({}/{})",
                            url,
                            e,
                            attempt,
                            self.max_attempts
                        );
                    }
                },
                Ok(response) => {
                    last_status = Some(response.status().as_u16());
                    tracing::info!(
                        "No response from {} (HTTP {}). Retrying ({}/{})",
                        url,
                        response.status(),
                        attempt,
                        self.max_attempts
                    );
                }
                Err(e) => {
                    tracing::info!(
                        "No response from {}: {}. Retrying ({}/{})",
                        url,
                        e,
                        attempt,
                        self.max_attempts
                    );
                }
            }
        }

        Err(ScanError::RetriesExhausted {
            url: url.to_string(),
            attempts: self.max_attempts,
            last_status,
        })
    }
}
