//! Order records and their list indexes
//!
//! Each order lives at `order:<id>`. Two newest-first lists point at them:
//! `orders:all` and `orders:user:<userId>`. The record write is the only
//! step that can fail an operation; index maintenance is best effort and
//! [`OrderRepository::reconcile`] rebuilds the lists from the records.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use validator::Validate;

use crate::domain::order::{apply_patch, order_key};
use crate::domain::value_objects::OrderIdGenerator;
use crate::domain::{NewOrder, Order};
use crate::error::{Result, StoreError};
use crate::kv::{KvStore, KvStoreExt};

pub const ALL_INDEX: &str = "orders:all";
const USER_INDEX_PREFIX: &str = "orders:user:";
const RECORD_PATTERN: &str = "order:*";

pub fn user_index(user_id: &str) -> String { format!("{USER_INDEX_PREFIX}{user_id}") }

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderScope { All, User(String) }

impl OrderScope {
    fn index_key(&self) -> String {
        match self {
            Self::All => ALL_INDEX.to_string(),
            Self::User(id) => user_index(id),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Order records found.
    pub orders: usize,
    /// Index entries that pointed at no record.
    pub dangling_removed: usize,
    /// Records that were missing from `orders:all`.
    pub missing_added: usize,
}

pub struct OrderRepository {
    kv: Arc<dyn KvStore>,
    ids: Arc<OrderIdGenerator>,
}

impl OrderRepository {
    pub fn new(kv: Arc<dyn KvStore>, ids: Arc<OrderIdGenerator>) -> Self { Self { kv, ids } }

    pub async fn create(&self, new: NewOrder) -> Result<Order> {
        new.validate()?;
        let user_id = new.user_id.clone();
        let order = Order::place(new, self.ids.next(), Utc::now());

        self.kv.set_json(&order.record_key(), &order).await?;

        let id = [order.id.clone()];
        for index in [ALL_INDEX.to_string(), user_index(&user_id)] {
            if let Err(e) = self.kv.lpush(&index, &id).await {
                warn!(order_id = %order.id, index = %index, error = %e, "order saved but index update failed");
            }
        }
        info!(order_id = %order.id, user_id = %user_id, total = %order.total, "order created");
        Ok(order)
    }

    pub async fn get(&self, id: &str) -> Result<Order> {
        self.kv
            .get_json::<Order>(&order_key(id))
            .await?
            .ok_or_else(|| StoreError::NotFound("Pedido no encontrado".into()))
    }

    /// Read-modify-write; concurrent updates are last-write-wins.
    pub async fn update(&self, id: &str, patch: &Map<String, Value>) -> Result<Order> {
        let key = order_key(id);
        let current = self.kv.get(&key).await?.ok_or_else(|| StoreError::NotFound("Pedido no encontrado".into()))?;
        let (merged, order) = apply_patch(current, patch, Utc::now()).map_err(|e| StoreError::Validation(e.to_string()))?;
        self.kv.set(&key, &merged).await?;
        info!(order_id = %id, fields = patch.len(), "order updated");
        Ok(order)
    }

    /// Deleting an absent order succeeds and reports `false`.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let key = order_key(id);
        let user_id = self
            .kv
            .get(&key)
            .await?
            .and_then(|v| v.get("userId").and_then(Value::as_str).map(str::to_string));
        let removed = self.kv.del(&key).await? > 0;

        let mut indexes = vec![ALL_INDEX.to_string()];
        indexes.extend(user_id.as_deref().map(user_index));
        for index in indexes {
            if let Err(e) = self.kv.lrem(&index, id).await {
                warn!(order_id = %id, index = %index, error = %e, "order deleted but index cleanup failed");
            }
        }
        if removed {
            info!(order_id = %id, "order deleted");
        } else {
            debug!(order_id = %id, "delete of absent order");
        }
        Ok(removed)
    }

    /// Orders named by the scope's index, fetched in one batch. Entries whose
    /// record is gone or unreadable are skipped.
    pub async fn list(&self, scope: OrderScope) -> Result<Vec<Order>> {
        let ids = self.kv.lrange(&scope.index_key(), 0, -1).await?;
        let mut seen = HashSet::new();
        let keys: Vec<String> = ids.iter().filter(|id| seen.insert(id.as_str())).map(|id| order_key(id)).collect();

        let mut orders: Vec<Order> = self
            .kv
            .mget(&keys)
            .await?
            .into_iter()
            .zip(&keys)
            .filter_map(|(value, key)| match serde_json::from_value::<Order>(value?) {
                Ok(order) => Some(order),
                Err(e) => {
                    warn!(key = %key, error = %e, "skipping unreadable order");
                    None
                }
            })
            .collect();

        if scope == OrderScope::All {
            orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        Ok(orders)
    }

    /// Rebuilds every index from the order records themselves.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let keys = self.kv.keys(RECORD_PATTERN).await?;
        let mut orders: Vec<Order> = self
            .kv
            .mget(&keys)
            .await?
            .into_iter()
            .flatten()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        let live: HashSet<&str> = orders.iter().map(|o| o.id.as_str()).collect();

        let mut report = ReconcileReport { orders: orders.len(), ..Default::default() };

        let indexed: Vec<String> = self.kv.lrange(ALL_INDEX, 0, -1).await?;
        let indexed_set: HashSet<&str> = indexed.iter().map(String::as_str).collect();
        report.dangling_removed += indexed.iter().filter(|id| !live.contains(id.as_str())).count();
        report.missing_added = live.iter().filter(|id| !indexed_set.contains(*id)).count();

        let mut by_user: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for order in &orders {
            if let Some(user) = &order.user_id {
                by_user.entry(user_index(user)).or_default().push(order.id.clone());
            }
        }
        for key in self.kv.keys(&format!("{USER_INDEX_PREFIX}*")).await? {
            let ids = self.kv.lrange(&key, 0, -1).await?;
            report.dangling_removed += ids.iter().filter(|id| !live.contains(id.as_str())).count();
            if !by_user.contains_key(&key) {
                self.kv.del(&key).await?;
            }
        }

        // Oldest first, so lpush leaves the newest at the head.
        let all_ids: Vec<String> = orders.iter().map(|o| o.id.clone()).collect();
        self.rewrite_index(ALL_INDEX, &all_ids).await?;
        for (key, ids) in &by_user {
            self.rewrite_index(key, ids).await?;
        }

        info!(
            orders = report.orders,
            dangling_removed = report.dangling_removed,
            missing_added = report.missing_added,
            "order indexes rebuilt"
        );
        Ok(report)
    }

    async fn rewrite_index(&self, key: &str, ids_oldest_first: &[String]) -> Result<()> {
        self.kv.del(key).await?;
        if !ids_oldest_first.is_empty() {
            self.kv.lpush(key, ids_oldest_first).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::tests::new_order;
    use crate::domain::OrderStats;
    use crate::kv::MemoryKv;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn repo() -> (Arc<MemoryKv>, OrderRepository) {
        let kv = Arc::new(MemoryKv::new());
        let repo = OrderRepository::new(kv.clone(), Arc::new(OrderIdGenerator::new()));
        (kv, repo)
    }

    #[tokio::test]
    async fn test_create_then_get_round_trips() {
        let (_, repo) = repo();
        let created = repo.create(new_order("u1", Decimal::new(4599, 2))).await.unwrap();
        let fetched = repo.get(&created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_created_order_is_indexed_once() {
        let (_, repo) = repo();
        let a = repo.create(new_order("u1", Decimal::ONE)).await.unwrap();
        let b = repo.create(new_order("u2", Decimal::ONE)).await.unwrap();

        let all = repo.list(OrderScope::All).await.unwrap();
        assert_eq!(all.iter().filter(|o| o.id == a.id).count(), 1);
        assert_eq!(all[0].id, b.id);

        let mine = repo.list(OrderScope::User("u1".into())).await.unwrap();
        assert_eq!(mine.iter().map(|o| o.id.as_str()).collect::<Vec<_>>(), vec![a.id.as_str()]);
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_index_entries() {
        let (kv, repo) = repo();
        let order = repo.create(new_order("u1", Decimal::ONE)).await.unwrap();
        assert!(repo.delete(&order.id).await.unwrap());

        assert!(matches!(repo.get(&order.id).await, Err(StoreError::NotFound(_))));
        assert!(repo.list(OrderScope::All).await.unwrap().is_empty());
        assert!(kv.lrange(&user_index("u1"), 0, -1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_twice_is_a_no_op() {
        let (_, repo) = repo();
        let order = repo.create(new_order("u1", Decimal::ONE)).await.unwrap();
        assert!(repo.delete(&order.id).await.unwrap());
        assert!(!repo.delete(&order.id).await.unwrap());
        assert!(!repo.delete("never-existed").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_changes_only_patched_fields() {
        let (kv, repo) = repo();
        let order = repo.create(new_order("u1", Decimal::new(4599, 2))).await.unwrap();
        let before = kv.get(&order_key(&order.id)).await.unwrap().unwrap();

        let patch = json!({"status": "confirmed"});
        let updated = repo.update(&order.id, patch.as_object().unwrap()).await.unwrap();
        let after = kv.get(&order_key(&order.id)).await.unwrap().unwrap();

        let (before, after) = (before.as_object().unwrap(), after.as_object().unwrap());
        assert_eq!(before.len(), after.len());
        for (field, value) in before {
            match field.as_str() {
                "status" => assert_eq!(after[field], json!("confirmed")),
                "updatedAt" => assert_ne!(after[field], *value),
                _ => assert_eq!(after[field], *value, "{field} changed"),
            }
        }
        assert_eq!(updated.status, crate::domain::OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_update_missing_and_invalid() {
        let (_, repo) = repo();
        let patch = json!({"status": "confirmed"});
        assert!(matches!(repo.update("nope", patch.as_object().unwrap()).await, Err(StoreError::NotFound(_))));

        let order = repo.create(new_order("u1", Decimal::ONE)).await.unwrap();
        let bad = json!({"total": "lots"});
        assert!(matches!(repo.update(&order.id, bad.as_object().unwrap()).await, Err(StoreError::Validation(_))));
        assert_eq!(repo.get(&order.id).await.unwrap().total, Decimal::ONE);
    }

    #[tokio::test]
    async fn test_lifecycle_stats() {
        let (_, repo) = repo();
        let order = repo.create(new_order("u1", Decimal::new(4599, 2))).await.unwrap();
        let patch = json!({"status": "delivered"});
        repo.update(&order.id, patch.as_object().unwrap()).await.unwrap();

        let stats = OrderStats::from_orders(&repo.list(OrderScope::All).await.unwrap());
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.total_revenue, Decimal::new(4599, 2));
        assert_eq!((stats.pending, stats.confirmed, stats.preparing, stats.ready, stats.cancelled), (0, 0, 0, 0, 0));
    }

    #[tokio::test]
    async fn test_index_failure_still_saves_order() {
        let (kv, repo) = repo();
        kv.fail_writes_to(ALL_INDEX);
        let order = repo.create(new_order("u1", Decimal::ONE)).await.unwrap();

        assert_eq!(repo.get(&order.id).await.unwrap().id, order.id);
        assert!(repo.list(OrderScope::All).await.unwrap().is_empty());
        assert_eq!(repo.list(OrderScope::User("u1".into())).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_record_failure_touches_no_index() {
        let kv = Arc::new(MemoryKv::new());
        // Pin the generator ahead of the clock so the next id is known.
        let ids = OrderIdGenerator::new();
        ids.next_at(9_000_000_000_000);
        let repo = OrderRepository::new(kv.clone(), Arc::new(ids));
        kv.fail_writes_to(order_key("9000000000001"));

        assert!(matches!(repo.create(new_order("u1", Decimal::ONE)).await, Err(StoreError::Kv(_))));
        assert!(!kv.contains(ALL_INDEX));
        assert!(!kv.contains(&user_index("u1")));

        let mut invalid = new_order("u1", Decimal::ONE);
        invalid.items.clear();
        assert!(matches!(repo.create(invalid).await, Err(StoreError::Validation(_))));
        assert!(!kv.contains(ALL_INDEX));
    }

    #[tokio::test]
    async fn test_list_skips_dangling_and_duplicate_entries() {
        let (kv, repo) = repo();
        let order = repo.create(new_order("u1", Decimal::ONE)).await.unwrap();
        kv.lpush(ALL_INDEX, &["ghost".into(), order.id.clone()]).await.unwrap();
        kv.put_raw(&order_key("garbled"), "{not json");
        kv.lpush(ALL_INDEX, &["garbled".into()]).await.unwrap();

        let all = repo.list(OrderScope::All).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, order.id);
    }

    #[tokio::test]
    async fn test_reconcile_rebuilds_indexes() {
        let (kv, repo) = repo();
        kv.fail_writes_to(ALL_INDEX);
        let a = repo.create(new_order("u1", Decimal::ONE)).await.unwrap();
        kv.heal();
        let b = repo.create(new_order("u2", Decimal::ONE)).await.unwrap();
        kv.lpush(ALL_INDEX, &["ghost".into()]).await.unwrap();
        kv.lpush(&user_index("u9"), &["ghost".into()]).await.unwrap();

        let report = repo.reconcile().await.unwrap();
        assert_eq!(report, ReconcileReport { orders: 2, dangling_removed: 2, missing_added: 1 });

        assert_eq!(kv.lrange(ALL_INDEX, 0, -1).await.unwrap(), vec![b.id.clone(), a.id.clone()]);
        assert_eq!(kv.lrange(&user_index("u1"), 0, -1).await.unwrap(), vec![a.id]);
        assert!(!kv.contains(&user_index("u9")));
    }
}
