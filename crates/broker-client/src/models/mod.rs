//! Broker directory models
//!
//! - `security` - Tradable instrument (Security) and the directory snapshot (SecurityDirectory)

mod security;

pub use security::{Security, SecurityDirectory};
