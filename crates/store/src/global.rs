//! Process-wide provider store.
//!
//! Frameworks that look the store up instead of receiving it use this handle.
//! The first successful [`init`] builds the store; later calls return the same
//! instance and ignore their configuration.

use std::sync::Arc;

use log::warn;
use multistore_broker_client::ClientFactory;
use tokio::sync::OnceCell;

use crate::config::StoreConfig;
use crate::errors::StoreError;
use crate::store::ProviderStore;

static STORE: OnceCell<Arc<ProviderStore>> = OnceCell::const_new();

/// Build the process-wide store, or return it if it already exists.
///
/// A failed build leaves the handle empty so a later call can try again.
pub async fn init(
    config: StoreConfig,
    factory: &dyn ClientFactory,
) -> Result<Arc<ProviderStore>, StoreError> {
    let store = STORE
        .get_or_try_init(|| async {
            ProviderStore::connect(config.clone(), factory)
                .await
                .map(Arc::new)
        })
        .await?;

    if store.config() != &config {
        warn!(
            "Provider store already initialized with providers {:?}; ignoring new configuration",
            store.provider_names()
        );
    }

    Ok(Arc::clone(store))
}

/// The process-wide store, if [`init`] has succeeded.
pub fn get() -> Option<Arc<ProviderStore>> {
    STORE.get().cloned()
}
