//! Orders store. Reads fall back to the local mirror; writes go through the
//! API and surface its errors, so the local list never holds an order the
//! API has not accepted.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{info, warn};

use super::local::{self, LocalCache};
use super::remote::Remote;
use super::{shared, Shared, StoreState};
use crate::domain::{NewOrder, Order, OrderStats, OrderStatus};
use crate::error::{ClientError, ClientResult};

#[derive(Clone)]
pub struct OrdersStore {
    remote: Option<Arc<dyn Remote>>,
    cache: LocalCache,
    state: Shared<Vec<Order>>,
}

impl OrdersStore {
    pub fn new(remote: Option<Arc<dyn Remote>>, cache: LocalCache) -> Self {
        Self { remote, cache, state: shared(Vec::new()) }
    }

    pub async fn snapshot(&self) -> StoreState<Vec<Order>> {
        self.state.read().await.clone()
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.state.read().await.data.clone()
    }

    pub async fn by_status(&self, status: OrderStatus) -> Vec<Order> {
        self.state.read().await.data.iter().filter(|o| o.status == status).cloned().collect()
    }

    pub async fn stats(&self) -> OrderStats {
        OrderStats::from_orders(self.state.read().await.data.iter())
    }

    /// The signed-in user's orders.
    pub async fn load(&self, token: &str) {
        self.load_with(token, false).await
    }

    /// Every order; admin only.
    pub async fn load_all(&self, token: &str) {
        self.load_with(token, true).await
    }

    async fn load_with(&self, token: &str, all: bool) {
        self.state.write().await.begin();
        if let Some(remote) = &self.remote {
            let fetched = if all { remote.list_orders(token).await } else { remote.my_orders(token).await };
            match fetched {
                Ok(orders) => {
                    self.cache.mirror(local::ORDERS, &orders).await;
                    self.state.write().await.settle(orders);
                    return;
                }
                Err(e) => warn!(error = %e, "orders fetch failed; using local mirror"),
            }
        }
        match self.cache.restore::<Vec<Order>>(local::ORDERS).await {
            Some(orders) => self.state.write().await.settle(orders),
            None => self.state.write().await.is_loading = false,
        }
    }

    pub async fn create(&self, order: NewOrder, token: &str) -> ClientResult<Order> {
        let created = self.remote()?.create_order(&order, token).await;
        let created = self.settle(created).await?;
        info!(order_id = %created.id, "order placed");
        let orders = {
            let mut state = self.state.write().await;
            state.data.insert(0, created.clone());
            state.data.clone()
        };
        self.cache.mirror(local::ORDERS, &orders).await;
        Ok(created)
    }

    pub async fn update_status(&self, id: &str, status: OrderStatus, token: &str) -> ClientResult<Order> {
        let mut updates = Map::new();
        updates.insert("status".into(), serde_json::to_value(status)?);
        self.update(id, updates, token).await
    }

    pub async fn update(&self, id: &str, updates: Map<String, Value>, token: &str) -> ClientResult<Order> {
        let updated = self.remote()?.update_order(id, &updates, token).await;
        let updated = self.settle(updated).await?;
        let orders = {
            let mut state = self.state.write().await;
            match state.data.iter_mut().find(|o| o.id == updated.id) {
                Some(slot) => *slot = updated.clone(),
                None => state.data.insert(0, updated.clone()),
            }
            state.data.clone()
        };
        self.cache.mirror(local::ORDERS, &orders).await;
        Ok(updated)
    }

    pub async fn delete(&self, id: &str, token: &str) -> ClientResult<()> {
        let deleted = self.remote()?.delete_order(id, token).await;
        self.settle(deleted).await?;
        let orders = {
            let mut state = self.state.write().await;
            state.data.retain(|o| o.id != id);
            state.data.clone()
        };
        self.cache.mirror(local::ORDERS, &orders).await;
        Ok(())
    }

    fn remote(&self) -> ClientResult<&Arc<dyn Remote>> {
        self.remote.as_ref().ok_or(ClientError::NoApi)
    }

    /// Records a failure in the error slot before handing it back.
    async fn settle<T>(&self, result: ClientResult<T>) -> ClientResult<T> {
        if let Err(e) = &result {
            warn!(error = %e, "order write failed");
            self.state.write().await.fail(e);
        }
        result
    }
}
