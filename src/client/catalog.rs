//! Wallpaper catalog store.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::local::{self, LocalCache};
use super::remote::Remote;
use super::{shared, Shared, StoreState};
use crate::config::ClientConfig;
use crate::domain::wallpaper::regroup_all;
use crate::domain::{default_catalog, Wallpaper};
use crate::error::{ClientError, ClientResult};

/// Which tier a load was served from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadSource {
    Remote,
    Cache,
    Defaults,
}

#[derive(Clone)]
pub struct CatalogStore {
    remote: Option<Arc<dyn Remote>>,
    cache: LocalCache,
    timeout: Duration,
    state: Shared<Vec<Wallpaper>>,
}

impl CatalogStore {
    pub fn new(remote: Option<Arc<dyn Remote>>, cache: LocalCache, config: &ClientConfig) -> Self {
        Self { remote, cache, timeout: config.catalog_timeout, state: shared(Vec::new()) }
    }

    pub async fn snapshot(&self) -> StoreState<Vec<Wallpaper>> {
        self.state.read().await.clone()
    }

    pub async fn wallpapers(&self) -> Vec<Wallpaper> {
        self.state.read().await.data.clone()
    }

    pub async fn wallpaper(&self, id: &str) -> Option<Wallpaper> {
        self.state.read().await.data.iter().find(|w| w.id == id).cloned()
    }

    /// Other wallpapers of the same design: same group key, different id.
    pub async fn variants_of(&self, id: &str) -> Vec<Wallpaper> {
        let state = self.state.read().await;
        let Some(group) = state.data.iter().find(|w| w.id == id).map(Wallpaper::group_key) else {
            return Vec::new();
        };
        state.data.iter().filter(|w| w.id != id && w.group_key() == group).cloned().collect()
    }

    /// Remote, then the local mirror (unless `force_refresh`), then the
    /// bundled catalog. Never fails; groups are recomputed on every path.
    pub async fn load(&self, force_refresh: bool) -> LoadSource {
        self.state.write().await.begin();

        if let Some(remote) = &self.remote {
            match remote.fetch_catalog(self.timeout).await {
                Ok(items) if !items.is_empty() => {
                    self.accept(items).await;
                    return LoadSource::Remote;
                }
                Ok(_) => warn!("remote catalog is empty; falling back"),
                Err(e) => warn!(error = %e, "catalog fetch failed; falling back"),
            }
        }

        if !force_refresh {
            if let Some(mut items) = self.cache.restore::<Vec<Wallpaper>>(local::CATALOG).await.filter(|i| !i.is_empty()) {
                regroup_all(&mut items);
                debug!(items = items.len(), "catalog served from local mirror");
                self.state.write().await.settle(items);
                return LoadSource::Cache;
            }
        }

        let defaults = default_catalog();
        info!(items = defaults.len(), "using bundled catalog");
        self.cache.mirror(local::CATALOG, &defaults).await;
        self.state.write().await.settle(defaults);
        LoadSource::Defaults
    }

    pub async fn refetch(&self) -> LoadSource {
        self.load(true).await
    }

    async fn accept(&self, mut items: Vec<Wallpaper>) {
        regroup_all(&mut items);
        self.cache.mirror(local::CATALOG, &items).await;
        self.cache.mirror(local::CATALOG_TIMESTAMP, &chrono::Utc::now().timestamp_millis()).await;
        self.state.write().await.settle(items);
    }

    /// Overwrites the whole remote catalog. Local state changes only once
    /// the remote accepted it; without an API the mirror is the store.
    pub async fn save(&self, catalog: Vec<Wallpaper>, token: &str) -> ClientResult<()> {
        let result = self.try_save(catalog, token).await;
        if let Err(e) = &result {
            self.state.write().await.fail(e);
        }
        result
    }

    async fn try_save(&self, catalog: Vec<Wallpaper>, token: &str) -> ClientResult<()> {
        if token.trim().is_empty() {
            return Err(ClientError::Unauthorized("No hay token de autenticación. Por favor inicia sesión.".into()));
        }
        if let Some(remote) = &self.remote {
            let count = remote.save_catalog(&catalog, token).await?;
            info!(items = count, "catalog saved");
        }
        self.accept(catalog).await;
        Ok(())
    }

    pub async fn add_wallpaper(&self, wallpaper: Wallpaper, token: &str) -> ClientResult<()> {
        self.add_wallpapers(vec![wallpaper], token).await
    }

    pub async fn add_wallpapers(&self, wallpapers: Vec<Wallpaper>, token: &str) -> ClientResult<()> {
        let mut catalog = self.wallpapers().await;
        catalog.extend(wallpapers);
        self.save(catalog, token).await
    }

    /// Replaces the wallpaper with the same id.
    pub async fn update_wallpaper(&self, wallpaper: Wallpaper, token: &str) -> ClientResult<()> {
        let mut catalog = self.wallpapers().await;
        match catalog.iter_mut().find(|w| w.id == wallpaper.id) {
            Some(slot) => *slot = wallpaper,
            None => return Err(ClientError::NotFound(wallpaper.id)),
        }
        self.save(catalog, token).await
    }

    pub async fn delete_wallpaper(&self, id: &str, token: &str) -> ClientResult<()> {
        let mut catalog = self.wallpapers().await;
        catalog.retain(|w| w.id != id);
        self.save(catalog, token).await
    }

    pub async fn replace_all(&self, wallpapers: Vec<Wallpaper>, token: &str) -> ClientResult<()> {
        self.save(wallpapers, token).await
    }

    /// Restores the bundled catalog remotely and locally.
    pub async fn reset(&self, token: &str) -> ClientResult<()> {
        let catalog = match &self.remote {
            Some(remote) => match remote.reset_catalog(token).await {
                Ok(catalog) if !catalog.is_empty() => catalog,
                Ok(_) => default_catalog(),
                Err(e) => {
                    self.state.write().await.fail(&e);
                    return Err(e);
                }
            },
            None => default_catalog(),
        };
        self.accept(catalog).await;
        Ok(())
    }

    /// Re-fetches every `period` while the returned task runs. A successful
    /// fetch overwrites the catalog; a failed one keeps what is there.
    /// Abort the handle when the app goes inactive.
    pub fn spawn_refresh(&self, period: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let Some(remote) = store.remote.clone() else { return };
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match remote.fetch_catalog(store.timeout).await {
                    Ok(items) if !items.is_empty() => {
                        debug!(items = items.len(), "catalog refreshed");
                        store.accept(items).await;
                    }
                    Ok(_) => warn!("background refresh returned an empty catalog; keeping current"),
                    Err(e) => warn!(error = %e, "background catalog refresh failed"),
                }
            }
        })
    }
}
