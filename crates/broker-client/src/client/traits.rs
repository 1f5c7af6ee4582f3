//! Broker client trait definitions.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::ClientError;
use crate::models::SecurityDirectory;

/// An authenticated session with a broker.
///
/// A store holds one client per configured account. Order routing and market
/// data streaming live behind the client; the store only needs the security
/// directory and a way to shut background subscriptions down.
#[async_trait]
pub trait BrokerClient: Send + Sync {
    /// Fetch the full directory of tradable instruments.
    ///
    /// This is a slow call (the directory holds tens of thousands of entries).
    async fn get_securities(&self) -> Result<SecurityDirectory, ClientError>;

    /// Close the client's background subscription channel.
    ///
    /// Called once when the owning store stops.
    async fn close_subscriptions(&self) -> Result<(), ClientError>;
}

/// Opens broker sessions from access tokens.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    /// Open a session authenticated with `access_token`.
    async fn connect(&self, access_token: &str) -> Result<Arc<dyn BrokerClient>, ClientError>;
}
