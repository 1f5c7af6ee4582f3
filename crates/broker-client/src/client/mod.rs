//! Broker client abstractions and implementations.
//!
//! This module contains:
//! - The `BrokerClient` trait every broker session implements
//! - The `ClientFactory` trait that opens sessions from access tokens
//! - The REST implementation of both

mod traits;

pub mod rest;

pub use traits::{BrokerClient, ClientFactory};
