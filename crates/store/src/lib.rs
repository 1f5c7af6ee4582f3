//! Multistore Provider Store Crate
//!
//! Registers several broker accounts with a trading framework through one
//! store.
//!
//! # Overview
//!
//! A [`ProviderStore`] keeps:
//! - One authenticated broker session per configured account, keyed by provider name
//! - The security directory, loaded once through the first (default) account
//! - A FIFO notification queue drained by the framework's event loop
//! - Factories the framework assigns for its data feeds and broker adapters
//!
//! The store is normally shared as `Arc<ProviderStore>`. Frameworks that need a
//! process-wide instance use [`global::init`] and [`global::get`].
//!
//! # Symbols
//!
//! Instruments are named `"BOARD.SYMBOL"` (e.g. `"TQBR.SBER"`). A bare symbol is
//! resolved to the board of the first matching directory entry.

pub mod config;
pub mod errors;
pub mod feeds;
pub mod global;
pub mod notifications;
pub mod store;

pub use config::{ProviderConfig, StoreConfig, DEFAULT_PROVIDER_NAME, PROVIDERS_ENV_VAR};
pub use errors::StoreError;
pub use feeds::{BrokerAdapter, BrokerFactory, BrokerParams, DataFeed, DataFeedFactory, DataParams};
pub use notifications::{Notification, NotificationQueue};
pub use store::{ProviderRegistration, ProviderStore, StoreState};
