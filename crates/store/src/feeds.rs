//! Data feed and broker adapter factories.
//!
//! The store does not implement data feeds or broker adapters itself. The
//! framework assigns factories for them and the store hands requests over
//! unchanged.

use std::sync::Arc;

use crate::errors::StoreError;
use crate::store::ProviderStore;

/// Parameters for a new data feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataParams {
    /// Instrument name, `"BOARD.SYMBOL"` or a bare symbol
    pub data_name: String,
    /// Provider to take data from; the default provider when `None`
    pub provider_name: Option<String>,
    /// Whether the feed should keep receiving bars after history is loaded
    pub live_bars: bool,
}

impl DataParams {
    pub fn new(data_name: impl Into<String>) -> Self {
        Self {
            data_name: data_name.into(),
            provider_name: None,
            live_bars: false,
        }
    }

    pub fn provider(mut self, provider_name: impl Into<String>) -> Self {
        self.provider_name = Some(provider_name.into());
        self
    }

    pub fn live_bars(mut self, live_bars: bool) -> Self {
        self.live_bars = live_bars;
        self
    }
}

/// Parameters for a new broker adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerParams {
    /// Account to trade through; the default provider when `None`
    pub provider_name: Option<String>,
    /// Whether open positions are loaded from the account at start
    pub use_positions: bool,
}

impl Default for BrokerParams {
    fn default() -> Self {
        Self {
            provider_name: None,
            use_positions: true,
        }
    }
}

impl BrokerParams {
    pub fn provider(mut self, provider_name: impl Into<String>) -> Self {
        self.provider_name = Some(provider_name.into());
        self
    }

    pub fn use_positions(mut self, use_positions: bool) -> Self {
        self.use_positions = use_positions;
        self
    }
}

/// A framework data feed created through the store.
pub trait DataFeed: Send {
    fn data_name(&self) -> &str;
}

/// A framework broker adapter created through the store.
pub trait BrokerAdapter: Send {
    fn provider_name(&self) -> &str;
}

/// Creates data feeds bound to a store.
pub trait DataFeedFactory: Send + Sync {
    fn create_data(
        &self,
        store: Arc<ProviderStore>,
        params: DataParams,
    ) -> Result<Box<dyn DataFeed>, StoreError>;
}

/// Creates broker adapters bound to a store.
pub trait BrokerFactory: Send + Sync {
    fn create_broker(
        &self,
        store: Arc<ProviderStore>,
        params: BrokerParams,
    ) -> Result<Box<dyn BrokerAdapter>, StoreError>;
}
