//! Error types for broker client operations.

use thiserror::Error;

/// Errors returned by a [`BrokerClient`](crate::BrokerClient) or a
/// [`ClientFactory`](crate::ClientFactory).
#[derive(Error, Debug)]
pub enum ClientError {
    /// The access token is empty or cannot be sent as a header value.
    #[error("Invalid access token: {0}")]
    InvalidToken(String),

    /// The broker rejected the access token (HTTP 401/403).
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Message returned by the broker, if any
        message: String,
    },

    /// The broker rate limited the request (HTTP 429).
    #[error("Rate limited")]
    RateLimited,

    /// Any other non-success HTTP status.
    #[error("HTTP {status} - {message}")]
    Http {
        /// Numeric HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// The broker answered with an error envelope.
    #[error("API error {code}: {message}")]
    Api {
        /// Broker error code
        code: String,
        /// Broker error message
        message: String,
    },

    /// The response body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The client was already closed.
    #[error("Client is closed")]
    Closed,

    /// A network error occurred while talking to the broker.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ClientError {
    /// Returns true when the failure is caused by bad or rejected credentials.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::InvalidToken(_) | Self::Unauthorized { .. })
    }
}
