//! REST broker client.
//!
//! Talks to the broker's public trade API:
//! - Security directory via GET /public/api/v1/securities
//!
//! Authentication is a per-account access token sent in the `X-Api-Key` header.
//! The REST API has no streaming channel, so closing subscriptions only marks
//! the client as closed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

use crate::client::{BrokerClient, ClientFactory};
use crate::errors::ClientError;
use crate::models::{Security, SecurityDirectory};

pub const DEFAULT_BASE_URL: &str = "https://trade-api.finam.ru";
const SECURITIES_ENDPOINT: &str = "/public/api/v1/securities";
const API_KEY_HEADER: &str = "X-Api-Key";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

// ============================================================================
// API Response Structures
// ============================================================================

/// Envelope wrapping every API response
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Payload of the securities endpoint
#[derive(Debug, Deserialize)]
struct SecuritiesData {
    #[serde(default)]
    securities: Vec<Security>,
}

/// Decode a securities response body into a directory.
fn parse_securities(body: &str) -> Result<SecurityDirectory, ClientError> {
    let envelope: Envelope<SecuritiesData> =
        serde_json::from_str(body).map_err(|e| ClientError::Decode(e.to_string()))?;

    if let Some(error) = envelope.error {
        return Err(ClientError::Api {
            code: error.code,
            message: error.message,
        });
    }

    let data = envelope
        .data
        .ok_or_else(|| ClientError::Decode("response has neither data nor error".to_string()))?;

    Ok(SecurityDirectory::new(data.securities))
}

/// Map a non-success status and its body to a client error.
fn status_error(status: StatusCode, body: String) -> ClientError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized {
            message: body,
        },
        StatusCode::TOO_MANY_REQUESTS => ClientError::RateLimited,
        _ => {
            // Error envelopes are returned with 4xx/5xx as well
            if let Ok(envelope) = serde_json::from_str::<Envelope<serde_json::Value>>(&body) {
                if let Some(error) = envelope.error {
                    return ClientError::Api {
                        code: error.code,
                        message: error.message,
                    };
                }
            }
            ClientError::Http {
                status: status.as_u16(),
                message: body,
            }
        }
    }
}

// ============================================================================
// RestBrokerClient
// ============================================================================

/// Broker session over the REST trade API.
pub struct RestBrokerClient {
    client: Client,
    base_url: String,
    api_key: HeaderValue,
    closed: AtomicBool,
}

impl RestBrokerClient {
    fn new(client: Client, base_url: String, api_key: HeaderValue) -> Self {
        Self {
            client,
            base_url,
            api_key,
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn fetch(&self, endpoint: &str) -> Result<String, ClientError> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }

        let url = format!("{}{}", self.base_url, endpoint);
        debug!("Broker request: {}", endpoint);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, self.api_key.clone())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status, body));
        }

        Ok(body)
    }
}

#[async_trait]
impl BrokerClient for RestBrokerClient {
    async fn get_securities(&self) -> Result<SecurityDirectory, ClientError> {
        let body = self.fetch(SECURITIES_ENDPOINT).await?;
        let directory = parse_securities(&body)?;
        info!("Loaded {} securities", directory.len());
        Ok(directory)
    }

    async fn close_subscriptions(&self) -> Result<(), ClientError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("Broker client closed");
        }
        Ok(())
    }
}

// ============================================================================
// RestClientFactory
// ============================================================================

/// Opens [`RestBrokerClient`] sessions against one API endpoint.
#[derive(Debug, Clone)]
pub struct RestClientFactory {
    base_url: String,
    timeout: Duration,
}

impl RestClientFactory {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the factory at a different API host (test servers, proxies).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_key(access_token: &str) -> Result<HeaderValue, ClientError> {
        if access_token.trim().is_empty() {
            return Err(ClientError::InvalidToken("token is empty".to_string()));
        }
        let mut value = HeaderValue::from_str(access_token).map_err(|_| {
            ClientError::InvalidToken("token contains characters not allowed in a header".to_string())
        })?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl Default for RestClientFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClientFactory for RestClientFactory {
    async fn connect(&self, access_token: &str) -> Result<Arc<dyn BrokerClient>, ClientError> {
        let api_key = Self::api_key(access_token)?;
        let client = Client::builder().timeout(self.timeout).build()?;

        Ok(Arc::new(RestBrokerClient::new(
            client,
            self.base_url.clone(),
            api_key,
        )))
    }
}
