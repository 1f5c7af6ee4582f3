//! Store configuration.
//!
//! A store is configured with one entry per broker account:
//!
//! ```json
//! {
//!   "providers": [
//!     { "provider_name": "finam_trade", "client_id": "14xxxx", "access_token": "..." },
//!     { "provider_name": "finam_iia", "client_id": "15xxxx", "access_token": "..." }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::StoreError;

/// Name used for a provider entry without `provider_name`.
pub const DEFAULT_PROVIDER_NAME: &str = "default";

/// Environment variable holding the provider list as a JSON array.
pub const PROVIDERS_ENV_VAR: &str = "MULTISTORE_PROVIDERS";

/// One broker account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Unique provider name; [`DEFAULT_PROVIDER_NAME`] when omitted
    #[serde(default)]
    pub provider_name: Option<String>,
    /// Trading account id
    pub client_id: String,
    /// Access token for the account
    pub access_token: String,
}

impl ProviderConfig {
    pub fn new(client_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            provider_name: None,
            client_id: client_id.into(),
            access_token: access_token.into(),
        }
    }

    pub fn named(
        provider_name: impl Into<String>,
        client_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            provider_name: Some(provider_name.into()),
            ..Self::new(client_id, access_token)
        }
    }

    /// Effective provider name.
    pub fn name(&self) -> &str {
        self.provider_name.as_deref().unwrap_or(DEFAULT_PROVIDER_NAME)
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider_name", &self.provider_name)
            .field("client_id", &self.client_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Configuration of a provider store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub providers: Vec<ProviderConfig>,
}

impl StoreConfig {
    pub fn new(providers: Vec<ProviderConfig>) -> Self {
        Self { providers }
    }

    /// Parse a `{ "providers": [...] }` document.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read the provider list from [`PROVIDERS_ENV_VAR`].
    pub fn from_env() -> Result<Self, StoreError> {
        let raw = std::env::var(PROVIDERS_ENV_VAR)
            .map_err(|_| StoreError::MissingEnv(PROVIDERS_ENV_VAR.to_string()))?;
        Self::from_providers_json(&raw)
    }

    /// Parse a bare JSON array of provider entries.
    pub fn from_providers_json(json: &str) -> Result<Self, StoreError> {
        let providers: Vec<ProviderConfig> = serde_json::from_str(json)?;
        Ok(Self::new(providers))
    }

    /// Check that the store can be built from this configuration.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.providers.is_empty() {
            return Err(StoreError::EmptyProviders);
        }

        let mut names = HashSet::with_capacity(self.providers.len());
        for provider in &self.providers {
            let name = provider.name();
            if name.trim().is_empty() {
                return Err(StoreError::InvalidConfig(
                    "provider_name must not be blank".to_string(),
                ));
            }
            if provider.client_id.trim().is_empty() {
                return Err(StoreError::InvalidConfig(format!(
                    "client_id for provider '{}' must not be blank",
                    name
                )));
            }
            if provider.access_token.trim().is_empty() {
                return Err(StoreError::InvalidConfig(format!(
                    "access_token for provider '{}' must not be blank",
                    name
                )));
            }
            if !names.insert(name) {
                return Err(StoreError::DuplicateProvider(name.to_string()));
            }
        }

        Ok(())
    }
}
