//! Client store layer.
//!
//! One store per domain. Each keeps its state behind an async lock together
//! with a loading flag and an error slot, talks to the API through a
//! [`Remote`], and mirrors what it holds into a [`LocalCache`]. A failed
//! action records a message in the error slot and leaves prior state alone.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod collections;
pub mod favorites;
pub mod local;
pub mod orders;
pub mod remote;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::config::ClientConfig;
use crate::error::ClientError;

pub use auth::{AuthState, AuthStore};
pub use cart::CartStore;
pub use catalog::{CatalogStore, LoadSource};
pub use collections::CollectionsStore;
pub use favorites::FavoritesStore;
pub use local::LocalCache;
pub use orders::OrdersStore;
pub use remote::{HttpRemote, Remote, Session};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StoreState<T> {
    pub data: T,
    pub is_loading: bool,
    pub error: Option<String>,
}

pub(crate) type Shared<T> = Arc<RwLock<StoreState<T>>>;

pub(crate) fn shared<T>(data: T) -> Shared<T> {
    Arc::new(RwLock::new(StoreState { data, is_loading: false, error: None }))
}

impl<T> StoreState<T> {
    pub(crate) fn begin(&mut self) {
        self.is_loading = true;
        self.error = None;
    }

    pub(crate) fn fail(&mut self, error: &ClientError) {
        self.is_loading = false;
        self.error = Some(error.to_string());
    }

    pub(crate) fn settle(&mut self, data: T) {
        self.data = data;
        self.is_loading = false;
    }
}

/// All stores wired to one API origin and one cache directory.
#[derive(Clone)]
pub struct Stores {
    pub auth: AuthStore,
    pub cart: CartStore,
    pub catalog: CatalogStore,
    pub collections: CollectionsStore,
    pub favorites: FavoritesStore,
    pub orders: OrdersStore,
    refresh_interval: Duration,
}

impl Stores {
    pub fn new(config: &ClientConfig) -> Self {
        let remote: Option<Arc<dyn Remote>> = match &config.api_url {
            Some(url) => Some(Arc::new(HttpRemote::new(url.clone()))),
            None => {
                tracing::info!("no API url configured; stores run on the local mirror only");
                None
            }
        };
        Self::with_remote(remote, LocalCache::new(config.cache_dir.clone()), config)
    }

    pub fn with_remote(remote: Option<Arc<dyn Remote>>, cache: LocalCache, config: &ClientConfig) -> Self {
        Self {
            auth: AuthStore::new(remote.clone(), cache.clone()),
            cart: CartStore::new(cache.clone()),
            catalog: CatalogStore::new(remote.clone(), cache.clone(), config),
            collections: CollectionsStore::new(remote.clone(), cache.clone(), config),
            favorites: FavoritesStore::new(remote.clone(), cache.clone()),
            orders: OrdersStore::new(remote, cache),
            refresh_interval: config.refresh_interval,
        }
    }

    /// Keeps the catalog fresh on the configured interval. Abort the handle
    /// when the app goes inactive.
    pub fn start_refresh(&self) -> JoinHandle<()> {
        self.catalog.spawn_refresh(self.refresh_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::FakeRemote;
    use super::*;
    use crate::domain::Wallpaper;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    #[tokio::test(start_paused = true)]
    async fn test_refresh_runs_on_configured_interval() {
        let dir = TempDir::new().unwrap();
        let remote = Arc::new(FakeRemote::default());
        *remote.catalog.lock().unwrap() = vec![Wallpaper::new("a", "Palm Leaf", Decimal::ONE)];
        let config = ClientConfig { refresh_interval: Duration::from_secs(5), ..ClientConfig::default() };
        let stores = Stores::with_remote(Some(remote.clone() as Arc<dyn Remote>), LocalCache::new(dir.path()), &config);

        let handle = stores.start_refresh();
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(remote.calls().is_empty());
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(remote.calls(), ["fetch_catalog"]);
        assert_eq!(stores.catalog.wallpapers().await.len(), 1);
        handle.abort();
    }
}
