//! Shared HTTP client for the index and pricing services.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::warn;

use crate::errors::{Error, Result};

/// HTTP status codes that indicate transient server errors (retryable)
const RETRYABLE_STATUS_CODES: &[u16] = &[502, 503, 504];

/// Maximum number of retry attempts for transient errors
const MAX_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds (doubles with each retry)
const INITIAL_BACKOFF_MS: u64 = 100;

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

async fn parse_response(response: Response) -> Result<String> {
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| Error::api("failed to read response body", e.to_string()))?;

    if status < 400 {
        return Ok(text);
    }
    Err(Error::api(format!("upstream returned status {status}"), text))
}

impl HttpClient {
    pub fn new(client: Option<Client>, base_url: impl Into<String>) -> Self {
        HttpClient {
            client: client.unwrap_or_default(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a GET request and deserialize the JSON response, retrying
    /// transient server errors (502, 503, 504) with exponential backoff:
    /// 100ms, 200ms, 400ms between attempts.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let full_url = format!("{}{path}", self.base_url);

        for attempt in 0..=MAX_RETRIES {
            let response = self.client.get(&full_url).send().await;

            match response {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if RETRYABLE_STATUS_CODES.contains(&status) && attempt < MAX_RETRIES {
                        let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempt);
                        warn!(
                            status,
                            attempt = attempt + 1,
                            backoff_ms = backoff,
                            url = %full_url,
                            "transient upstream error, retrying"
                        );
                        tokio::time::sleep(Duration::from_millis(backoff)).await;
                        continue;
                    }
                    let text = parse_response(response).await?;
                    return serde_json::from_str(&text)
                        .map_err(|e| Error::api("invalid json from upstream", e.to_string()));
                }
                Err(err) if attempt < MAX_RETRIES => {
                    let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempt);
                    warn!(
                        attempt = attempt + 1,
                        backoff_ms = backoff,
                        url = %full_url,
                        %err,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(err) => {
                    return Err(Error::api("request failed", err.to_string()));
                }
            }
        }

        Err(Error::api("request failed", "retries exhausted"))
    }
}
