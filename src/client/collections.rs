//! Featured collections store.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::catalog::LoadSource;
use super::local::{self, LocalCache};
use super::remote::Remote;
use super::{shared, Shared, StoreState};
use crate::config::ClientConfig;
use crate::domain::{default_collections, Collection};
use crate::error::{ClientError, ClientResult};

#[derive(Clone)]
pub struct CollectionsStore {
    remote: Option<Arc<dyn Remote>>,
    cache: LocalCache,
    timeout: Duration,
    admin_token: Option<String>,
    state: Shared<Vec<Collection>>,
}

impl CollectionsStore {
    pub fn new(remote: Option<Arc<dyn Remote>>, cache: LocalCache, config: &ClientConfig) -> Self {
        Self {
            remote,
            cache,
            timeout: config.collections_timeout,
            admin_token: config.admin_token.clone(),
            state: shared(Vec::new()),
        }
    }

    pub async fn snapshot(&self) -> StoreState<Vec<Collection>> {
        self.state.read().await.clone()
    }

    pub async fn collections(&self) -> Vec<Collection> {
        self.state.read().await.data.clone()
    }

    pub async fn load(&self, force_refresh: bool) -> LoadSource {
        self.state.write().await.begin();
        if let Some(remote) = &self.remote {
            match remote.fetch_collections(self.timeout).await {
                Ok(list) if !list.is_empty() => {
                    self.cache.mirror(local::COLLECTIONS, &list).await;
                    self.state.write().await.settle(list);
                    return LoadSource::Remote;
                }
                Ok(_) => warn!("remote collections are empty; falling back"),
                Err(e) => warn!(error = %e, "collections fetch failed; falling back"),
            }
        }
        if !force_refresh {
            if let Some(list) = self.cache.restore::<Vec<Collection>>(local::COLLECTIONS).await.filter(|l| !l.is_empty()) {
                self.state.write().await.settle(list);
                return LoadSource::Cache;
            }
        }
        self.state.write().await.settle(default_collections());
        LoadSource::Defaults
    }

    pub async fn add(&self, collection: Collection, token: Option<&str>) -> ClientResult<()> {
        let mut list = self.collections().await;
        list.push(collection);
        self.save(list, token).await
    }

    pub async fn update(&self, collection: Collection, token: Option<&str>) -> ClientResult<()> {
        let mut list = self.collections().await;
        match list.iter_mut().find(|c| c.id == collection.id) {
            Some(slot) => *slot = collection,
            None => return Err(ClientError::NotFound(collection.id)),
        }
        self.save(list, token).await
    }

    pub async fn delete(&self, id: &str, token: Option<&str>) -> ClientResult<()> {
        let mut list = self.collections().await;
        list.retain(|c| c.id != id);
        self.save(list, token).await
    }

    /// Pushes the whole list with the given admin token, or the configured
    /// one. Local state only changes after the API accepted the list.
    async fn save(&self, list: Vec<Collection>, token: Option<&str>) -> ClientResult<()> {
        let token = token.filter(|t| !t.is_empty()).or(self.admin_token.as_deref()).unwrap_or_default();
        let result = match &self.remote {
            Some(remote) => remote.save_collections(&list, token, self.timeout).await,
            None => Err(ClientError::NoApi),
        };
        match result {
            Ok(()) => {
                info!(collections = list.len(), "collections saved");
                self.cache.mirror(local::COLLECTIONS, &list).await;
                self.state.write().await.settle(list);
                Ok(())
            }
            Err(e) => {
                self.state.write().await.fail(&e);
                Err(e)
            }
        }
    }
}
