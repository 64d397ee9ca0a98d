//! HTTP client for the bot API.

use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::envelope::ApiResponse;
use crate::error::BotApiError;

/// Header carrying the shared secret on every call.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Bot API connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BotApiConfig {
    /// Base URL, without a trailing slash (`BOT_API_BASE`).
    pub base_url: String,

    /// Shared secret sent in [`API_KEY_HEADER`] (`BOT_API_KEY`).
    pub api_key: String,

    /// Per-request timeout.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for BotApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Client for the bot API. Cheap to clone.
#[derive(Debug, Clone)]
pub struct BotApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl BotApiClient {
    /// Creates a client from `config`.
    pub fn new(config: &BotApiConfig) -> Result<Self, BotApiError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        url::Url::parse(&base_url)
            .map_err(|e| BotApiError::InvalidConfig(format!("base_url {base_url:?}: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BotApiError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    /// Base URL calls are made against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header(API_KEY_HEADER, &self.api_key)
    }

    /// Issues `GET path`.
    pub async fn get(&self, path: &str) -> ApiResponse {
        self.send(path, self.request(Method::GET, path)).await
    }

    /// Issues `GET path?query`.
    pub async fn get_with_query(&self, path: &str, query: &[(&str, &str)]) -> ApiResponse {
        self.send(path, self.request(Method::GET, path).query(query))
            .await
    }

    /// Issues `POST path` with a JSON body.
    pub async fn post<B>(&self, path: &str, body: &B) -> ApiResponse
    where
        B: Serialize + ?Sized,
    {
        self.send(path, self.request(Method::POST, path).json(body))
            .await
    }

    async fn send(&self, path: &str, request: RequestBuilder) -> ApiResponse {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return transport_error(path, &e),
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => {
                let parsed = ApiResponse::from_body(status, &body);
                if let ApiResponse::Failure { .. } = parsed {
                    warn!(path, status, "Bot API returned a non-JSON body");
                } else {
                    debug!(path, status, ok = parsed.is_ok(), "Bot API call completed");
                }
                parsed
            }
            Err(e) => transport_error(path, &e),
        }
    }
}

fn transport_error(path: &str, e: &reqwest::Error) -> ApiResponse {
    let message = if e.is_timeout() {
        format!("request timed out: {e}")
    } else if e.is_connect() {
        format!("failed to connect: {e}")
    } else {
        format!("request failed: {e}")
    };
    warn!(path, error = %message, "Bot API call failed");
    ApiResponse::TransportError { message }
}
