//! Error types for the provider store.

use multistore_broker_client::ClientError;
use thiserror::Error;

/// Errors that can occur while building or using a provider store.
///
/// Construction errors are fatal: the store is never partially built.
/// Symbol lookups do not fail; a miss is reported as `None`.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The configuration lists no providers.
    #[error("No providers configured")]
    EmptyProviders,

    /// A provider entry has a blank or malformed field.
    #[error("Invalid provider config: {0}")]
    InvalidConfig(String),

    /// Two provider entries resolve to the same name.
    #[error("Duplicate provider name: {0}")]
    DuplicateProvider(String),

    /// A provider's session could not be opened.
    #[error("Failed to connect provider '{provider}': {source}")]
    Connection {
        provider: String,
        #[source]
        source: ClientError,
    },

    /// The security directory could not be fetched via the default provider.
    #[error("Failed to load securities via provider '{provider}': {source}")]
    Directory {
        provider: String,
        #[source]
        source: ClientError,
    },

    /// No provider is registered under the requested name.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// `get_data`/`get_broker` was called before the framework assigned a factory.
    #[error("No {0} factory assigned")]
    FactoryNotSet(&'static str),

    /// The configuration could not be parsed.
    #[error("Failed to parse store config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A required environment variable is missing.
    #[error("Environment variable {0} is not set")]
    MissingEnv(String),
}

impl StoreError {
    /// Returns true when the error was caused by rejected broker credentials.
    pub fn is_auth_error(&self) -> bool {
        match self {
            Self::Connection { source, .. } | Self::Directory { source, .. } => {
                source.is_auth_error()
            }
            _ => false,
        }
    }
}
