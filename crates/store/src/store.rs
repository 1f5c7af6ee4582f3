//! Provider store.
//!
//! Holds one authenticated broker session per configured account, the
//! security directory loaded through the default (first) account, and the
//! notification queue drained by the framework's event loop.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use log::{debug, info, warn};
use multistore_broker_client::{BrokerClient, ClientFactory, Security, SecurityDirectory};

use crate::config::StoreConfig;
use crate::errors::StoreError;
use crate::feeds::{BrokerAdapter, BrokerFactory, BrokerParams, DataFeed, DataFeedFactory, DataParams};
use crate::notifications::{Notification, NotificationQueue};

/// A broker session registered under a provider name.
pub struct ProviderRegistration {
    name: String,
    client: Arc<dyn BrokerClient>,
    account_id: String,
}

impl ProviderRegistration {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &Arc<dyn BrokerClient> {
        &self.client
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }
}

impl fmt::Debug for ProviderRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistration")
            .field("name", &self.name)
            .field("account_id", &self.account_id)
            .finish_non_exhaustive()
    }
}

/// Store lifecycle. Transitions are one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Initialized,
    Stopped,
}

/// Multi-account provider store.
pub struct ProviderStore {
    config: StoreConfig,
    /// In configuration order; the first entry is the default provider.
    providers: Vec<ProviderRegistration>,
    symbols: SecurityDirectory,
    notifications: NotificationQueue,
    state: Mutex<StoreState>,
    data_factory: RwLock<Option<Arc<dyn DataFeedFactory>>>,
    broker_factory: RwLock<Option<Arc<dyn BrokerFactory>>>,
}

impl ProviderStore {
    /// Open a session for every configured provider and load the security
    /// directory through the first one.
    ///
    /// Any failure aborts construction; sessions opened so far are dropped.
    pub async fn connect(
        config: StoreConfig,
        factory: &dyn ClientFactory,
    ) -> Result<Self, StoreError> {
        config.validate()?;

        let mut providers = Vec::with_capacity(config.providers.len());
        for provider in &config.providers {
            let name = provider.name().to_string();
            info!(
                "Connecting provider '{}' for account {}",
                name, provider.client_id
            );

            let client = factory
                .connect(&provider.access_token)
                .await
                .map_err(|source| StoreError::Connection {
                    provider: name.clone(),
                    source,
                })?;

            providers.push(ProviderRegistration {
                name,
                client,
                account_id: provider.client_id.clone(),
            });
        }

        let default = providers.first().ok_or(StoreError::EmptyProviders)?;
        info!("Loading securities via provider '{}'", default.name);
        let symbols = default
            .client
            .get_securities()
            .await
            .map_err(|source| StoreError::Directory {
                provider: default.name.clone(),
                source,
            })?;
        info!(
            "Provider store ready: {} provider(s), {} securities",
            providers.len(),
            symbols.len()
        );

        Ok(Self {
            config,
            providers,
            symbols,
            notifications: NotificationQueue::new(),
            state: Mutex::new(StoreState::Initialized),
            data_factory: RwLock::new(None),
            broker_factory: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn state(&self) -> StoreState {
        *self.lock_state()
    }

    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Store state mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    // ------------------------------------------------------------------
    // Providers
    // ------------------------------------------------------------------

    /// The provider used for directory lookups and unnamed requests.
    pub fn default_provider(&self) -> &ProviderRegistration {
        // `connect` refuses empty configurations
        &self.providers[0]
    }

    /// Provider registered under `name`, or the default provider for `None`.
    pub fn provider(&self, name: Option<&str>) -> Option<&ProviderRegistration> {
        match name {
            None => self.providers.first(),
            Some(name) => self.providers.iter().find(|p| p.name == name),
        }
    }

    /// Like [`provider`](Self::provider) but reports unknown names as an error.
    pub fn require_provider(&self, name: Option<&str>) -> Result<&ProviderRegistration, StoreError> {
        self.provider(name).ok_or_else(|| {
            StoreError::UnknownProvider(name.unwrap_or_default().to_string())
        })
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn providers(&self) -> &[ProviderRegistration] {
        &self.providers
    }

    // ------------------------------------------------------------------
    // Factories
    // ------------------------------------------------------------------

    pub fn set_data_factory(&self, factory: Arc<dyn DataFeedFactory>) {
        *self
            .data_factory
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(factory);
    }

    pub fn set_broker_factory(&self, factory: Arc<dyn BrokerFactory>) {
        *self
            .broker_factory
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(factory);
    }

    /// Create a data feed through the assigned data factory.
    pub fn get_data(self: &Arc<Self>, params: DataParams) -> Result<Box<dyn DataFeed>, StoreError> {
        let factory = self
            .data_factory
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or(StoreError::FactoryNotSet("data"))?;
        factory.create_data(Arc::clone(self), params)
    }

    /// Create a broker adapter through the assigned broker factory.
    pub fn get_broker(
        self: &Arc<Self>,
        params: BrokerParams,
    ) -> Result<Box<dyn BrokerAdapter>, StoreError> {
        let factory = self
            .broker_factory
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or(StoreError::FactoryNotSet("broker"))?;
        factory.create_broker(Arc::clone(self), params)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    pub fn start(&self) {
        // TODO: subscribe every provider to new bars once the broker API offers bar streaming
        warn!("Live bar subscriptions are not available; data feeds must poll for new bars");
    }

    /// Close the subscription channel of every provider.
    ///
    /// A failing provider does not stop the others from being closed.
    /// Calling `stop` again has no effect.
    pub async fn stop(&self) {
        {
            let mut state = self.lock_state();
            if *state == StoreState::Stopped {
                debug!("Provider store already stopped");
                return;
            }
            *state = StoreState::Stopped;
        }

        for provider in &self.providers {
            match provider.client.close_subscriptions().await {
                Ok(()) => debug!("Closed subscriptions for provider '{}'", provider.name),
                Err(e) => warn!(
                    "Failed to close subscriptions for provider '{}': {}",
                    provider.name, e
                ),
            }
        }
        info!("Provider store stopped");
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    pub fn put_notification(&self, notification: impl Into<Notification>) {
        self.notifications.put(notification.into());
    }

    /// Drain queued notifications, oldest first.
    pub fn get_notifications(&self) -> Vec<Notification> {
        self.notifications.drain()
    }

    // ------------------------------------------------------------------
    // Symbols
    // ------------------------------------------------------------------

    pub fn symbols(&self) -> &SecurityDirectory {
        &self.symbols
    }

    /// Directory entry for `symbol` on `board`.
    pub fn find_symbol(&self, board: &str, symbol: &str) -> Option<&Security> {
        let found = self.symbols.find(board, symbol);
        if found.is_none() {
            warn!("Security {} not found", Self::join_board_symbol(board, symbol));
        }
        found
    }

    /// Split `"BOARD.SYMBOL"` into board and symbol.
    ///
    /// A name without a board takes the board of the first directory entry
    /// with that symbol; the board is `None` when no entry matches.
    pub fn split_data_name(&self, data_name: &str) -> (Option<String>, String) {
        match data_name.split_once('.') {
            Some((board, symbol)) => (Some(board.to_string()), symbol.to_string()),
            None => {
                let board = self.symbols.first_board_for(data_name).map(str::to_string);
                if board.is_none() {
                    debug!("No board found for symbol {}", data_name);
                }
                (board, data_name.to_string())
            }
        }
    }

    pub fn join_board_symbol(board: &str, symbol: &str) -> String {
        format!("{}.{}", board, symbol)
    }
}

impl fmt::Debug for ProviderStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderStore")
            .field("providers", &self.providers)
            .field("securities", &self.symbols.len())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use async_trait::async_trait;
    use multistore_broker_client::ClientError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockClient {
        securities: Vec<Security>,
        fail_directory: bool,
        fail_close: bool,
        close_calls: AtomicUsize,
    }

    #[async_trait]
    impl BrokerClient for MockClient {
        async fn get_securities(&self) -> Result<SecurityDirectory, ClientError> {
            if self.fail_directory {
                return Err(ClientError::Unauthorized {
                    message: "expired".to_string(),
                });
            }
            Ok(SecurityDirectory::new(self.securities.clone()))
        }

        async fn close_subscriptions(&self) -> Result<(), ClientError> {
            self.close_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_close {
                return Err(ClientError::Closed);
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockFactory {
        clients: Mutex<Vec<Arc<MockClient>>>,
        reject_token: Option<&'static str>,
        fail_directory: bool,
        fail_close_token: Option<&'static str>,
    }

    impl MockFactory {
        fn clients(&self) -> Vec<Arc<MockClient>> {
            self.clients.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ClientFactory for MockFactory {
        async fn connect(&self, access_token: &str) -> Result<Arc<dyn BrokerClient>, ClientError> {
            if self.reject_token == Some(access_token) {
                return Err(ClientError::InvalidToken("rejected".to_string()));
            }
            let client = Arc::new(MockClient {
                securities: vec![
                    Security::new("TQBR", "SBER"),
                    Security::new("SPBFUT", "SiZ4"),
                    Security::new("SMAL", "SBER"),
                ],
                fail_directory: self.fail_directory,
                fail_close: self.fail_close_token == Some(access_token),
                close_calls: AtomicUsize::new(0),
            });
            self.clients.lock().unwrap().push(Arc::clone(&client));
            Ok(client)
        }
    }

    fn two_accounts() -> StoreConfig {
        StoreConfig::new(vec![
            ProviderConfig::named("finam_trade", "14001", "t1"),
            ProviderConfig::named("finam_iia", "15001", "t2"),
        ])
    }

    async fn store() -> ProviderStore {
        ProviderStore::connect(two_accounts(), &MockFactory::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_connect_registers_providers_in_order() {
        let store = store().await;

        assert_eq!(store.provider_names(), vec!["finam_trade", "finam_iia"]);
        assert_eq!(store.default_provider().name(), "finam_trade");
        assert_eq!(store.provider(None).unwrap().account_id(), "14001");
        assert_eq!(store.provider(Some("finam_iia")).unwrap().account_id(), "15001");
        assert!(store.provider(Some("missing")).is_none());
        assert!(matches!(
            store.require_provider(Some("missing")),
            Err(StoreError::UnknownProvider(name)) if name == "missing"
        ));
        assert_eq!(store.symbols().len(), 3);
        assert_eq!(store.state(), StoreState::Initialized);
    }

    #[tokio::test]
    async fn test_connect_uses_default_name() {
        let config = StoreConfig::new(vec![ProviderConfig::new("14001", "t1")]);
        let store = ProviderStore::connect(config, &MockFactory::default())
            .await
            .unwrap();

        assert_eq!(store.provider_names(), vec!["default"]);
    }

    #[tokio::test]
    async fn test_connect_rejects_empty_config() {
        let result = ProviderStore::connect(StoreConfig::default(), &MockFactory::default()).await;
        assert!(matches!(result, Err(StoreError::EmptyProviders)));
    }

    #[tokio::test]
    async fn test_connect_propagates_session_failure() {
        let factory = MockFactory {
            reject_token: Some("t2"),
            ..Default::default()
        };

        match ProviderStore::connect(two_accounts(), &factory).await {
            Err(StoreError::Connection { provider, source }) => {
                assert_eq!(provider, "finam_iia");
                assert!(source.is_auth_error());
            }
            other => panic!("expected connection error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connect_propagates_directory_failure() {
        let factory = MockFactory {
            fail_directory: true,
            ..Default::default()
        };

        match ProviderStore::connect(two_accounts(), &factory).await {
            Err(error @ StoreError::Directory { .. }) => assert!(error.is_auth_error()),
            other => panic!("expected directory error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stop_closes_every_provider_once() {
        let factory = MockFactory::default();
        let store = ProviderStore::connect(two_accounts(), &factory).await.unwrap();

        store.start();
        store.stop().await;
        store.stop().await;

        let clients = factory.clients();
        assert_eq!(clients.len(), 2);
        for client in clients {
            assert_eq!(client.close_calls.load(Ordering::SeqCst), 1);
        }
        assert_eq!(store.state(), StoreState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_single_provider() {
        let factory = MockFactory::default();
        let config = StoreConfig::new(vec![ProviderConfig::new("14001", "t1")]);
        let store = ProviderStore::connect(config, &factory).await.unwrap();

        store.stop().await;

        let clients = factory.clients();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].close_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stop_continues_after_close_failure() {
        let factory = MockFactory {
            fail_close_token: Some("t1"),
            ..Default::default()
        };
        let store = ProviderStore::connect(two_accounts(), &factory).await.unwrap();

        store.stop().await;

        for client in factory.clients() {
            assert_eq!(client.close_calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn test_notifications() {
        let store = store().await;

        store.put_notification("a");
        store.put_notification("b");

        assert_eq!(
            store.get_notifications(),
            vec![Notification::new("a"), Notification::new("b")]
        );
        assert!(store.get_notifications().is_empty());
    }

    #[tokio::test]
    async fn test_find_symbol() {
        let store = store().await;

        let found = store.find_symbol("TQBR", "SBER").unwrap();
        assert_eq!(found.board, "TQBR");
        assert_eq!(found.code, "SBER");
        assert!(store.find_symbol("TQBR", "GAZP").is_none());
    }

    #[tokio::test]
    async fn test_split_data_name() {
        let store = store().await;

        assert_eq!(
            store.split_data_name("TQBR.SBER"),
            (Some("TQBR".to_string()), "SBER".to_string())
        );
        assert_eq!(
            store.split_data_name("SMAL.SBER"),
            (Some("SMAL".to_string()), "SBER".to_string())
        );
        assert_eq!(
            store.split_data_name("SBER"),
            (Some("TQBR".to_string()), "SBER".to_string())
        );
        assert_eq!(store.split_data_name("GAZP"), (None, "GAZP".to_string()));
    }

    #[tokio::test]
    async fn test_split_data_name_keeps_dots_in_symbol() {
        let store = store().await;

        assert_eq!(
            store.split_data_name("MCT.BRK.B"),
            (Some("MCT".to_string()), "BRK.B".to_string())
        );
    }

    #[test]
    fn test_join_board_symbol() {
        assert_eq!(ProviderStore::join_board_symbol("TQBR", "SBER"), "TQBR.SBER");
    }

    struct NamedFeed(String);

    impl DataFeed for NamedFeed {
        fn data_name(&self) -> &str {
            &self.0
        }
    }

    struct FeedFactory;

    impl DataFeedFactory for FeedFactory {
        fn create_data(
            &self,
            store: Arc<ProviderStore>,
            params: DataParams,
        ) -> Result<Box<dyn DataFeed>, StoreError> {
            store.require_provider(params.provider_name.as_deref())?;
            let (board, symbol) = store.split_data_name(&params.data_name);
            let board = board.ok_or_else(|| StoreError::InvalidConfig(params.data_name.clone()))?;
            Ok(Box::new(NamedFeed(ProviderStore::join_board_symbol(&board, &symbol))))
        }
    }

    struct AccountBroker(String);

    impl BrokerAdapter for AccountBroker {
        fn provider_name(&self) -> &str {
            &self.0
        }
    }

    struct AccountBrokerFactory;

    impl BrokerFactory for AccountBrokerFactory {
        fn create_broker(
            &self,
            store: Arc<ProviderStore>,
            params: BrokerParams,
        ) -> Result<Box<dyn BrokerAdapter>, StoreError> {
            let provider = store.require_provider(params.provider_name.as_deref())?;
            Ok(Box::new(AccountBroker(provider.name().to_string())))
        }
    }

    #[tokio::test]
    async fn test_factories_must_be_assigned() {
        let store = Arc::new(store().await);

        assert!(matches!(
            store.get_data(DataParams::new("SBER")),
            Err(StoreError::FactoryNotSet("data"))
        ));
        assert!(matches!(
            store.get_broker(BrokerParams::default()),
            Err(StoreError::FactoryNotSet("broker"))
        ));
    }

    #[tokio::test]
    async fn test_factories_receive_params() {
        let store = Arc::new(store().await);
        store.set_data_factory(Arc::new(FeedFactory));
        store.set_broker_factory(Arc::new(AccountBrokerFactory));

        let feed = store.get_data(DataParams::new("SBER").live_bars(true)).unwrap();
        assert_eq!(feed.data_name(), "TQBR.SBER");

        let broker = store
            .get_broker(BrokerParams::default().provider("finam_iia"))
            .unwrap();
        assert_eq!(broker.provider_name(), "finam_iia");

        assert!(matches!(
            store.get_broker(BrokerParams::default().provider("unknown")),
            Err(StoreError::UnknownProvider(_))
        ));
    }
}
