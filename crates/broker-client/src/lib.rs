//! Multistore Broker Client Crate
//!
//! Contract between a provider store and the broker it talks to, plus a
//! REST implementation of that contract.
//!
//! # Core Types
//!
//! - [`BrokerClient`] - An authenticated broker session
//! - [`ClientFactory`] - Opens sessions from access tokens
//! - [`SecurityDirectory`] - Snapshot of tradable instruments
//! - [`Security`] - One instrument, identified by board and code
//! - [`ClientError`] - Failures reported by clients and factories

pub mod client;
pub mod errors;
pub mod models;

pub use client::rest::{RestBrokerClient, RestClientFactory, DEFAULT_BASE_URL};
pub use client::{BrokerClient, ClientFactory};
pub use errors::ClientError;
pub use models::{Security, SecurityDirectory};
