//! Cart store: the domain [`Cart`] kept in memory and mirrored locally.

use rust_decimal::Decimal;

use super::local::{self, LocalCache};
use super::{shared, Shared, StoreState};
use crate::domain::{Cart, OrderItem, PurchaseType, Wallpaper};

#[derive(Clone)]
pub struct CartStore {
    cache: LocalCache,
    state: Shared<Cart>,
}

impl CartStore {
    pub fn new(cache: LocalCache) -> Self {
        Self { cache, state: shared(Cart::new()) }
    }

    /// Restores the mirrored cart, if any.
    pub async fn load(&self) {
        let cart: Cart = self.cache.restore(local::CART).await.unwrap_or_default();
        self.state.write().await.settle(cart);
    }

    pub async fn snapshot(&self) -> StoreState<Cart> {
        self.state.read().await.clone()
    }

    async fn mutate(&self, change: impl FnOnce(&mut Cart)) {
        let cart = {
            let mut state = self.state.write().await;
            change(&mut state.data);
            state.data.clone()
        };
        self.cache.mirror(local::CART, &cart).await;
    }

    pub async fn add_to_cart(&self, wallpaper: Wallpaper, rolls_needed: Decimal, wall_area: Decimal, purchase_type: PurchaseType) {
        self.mutate(|c| c.add(wallpaper, rolls_needed, wall_area, purchase_type)).await
    }

    pub async fn update_quantity(&self, id: &str, change: i64) {
        self.mutate(|c| c.update_quantity(id, change)).await
    }

    pub async fn remove(&self, id: &str) {
        self.mutate(|c| c.remove(id)).await
    }

    pub async fn clear(&self) {
        self.mutate(Cart::clear).await
    }

    pub async fn is_in_cart(&self, wallpaper_id: &str) -> bool {
        self.state.read().await.data.contains(wallpaper_id)
    }

    pub async fn items_count(&self) -> u32 {
        self.state.read().await.data.items_count()
    }

    pub async fn subtotal(&self) -> Decimal {
        self.state.read().await.data.subtotal()
    }

    pub async fn shipping_cost(&self) -> Decimal {
        self.state.read().await.data.shipping_cost()
    }

    pub async fn grand_total(&self) -> Decimal {
        self.state.read().await.data.grand_total()
    }

    pub async fn to_order_items(&self) -> Vec<OrderItem> {
        self.state.read().await.data.to_order_items()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::DEFAULT_WALL_AREA;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_same_wallpaper_twice_is_one_line_and_survives_restart() {
        let dir = TempDir::new().unwrap();
        let store = CartStore::new(LocalCache::new(dir.path()));
        let paper = Wallpaper::new("w1", "Rodney White Wallpaper", Decimal::new(4599, 2));

        store.add_to_cart(paper.clone(), Decimal::from(2), DEFAULT_WALL_AREA, PurchaseType::Roll).await;
        store.add_to_cart(paper, Decimal::from(2), DEFAULT_WALL_AREA, PurchaseType::Roll).await;

        let cart = store.snapshot().await.data;
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.items()[0].rolls_needed, Decimal::from(4));
        assert_eq!(store.subtotal().await, Decimal::new(18396, 2));

        let restored = CartStore::new(LocalCache::new(dir.path()));
        restored.load().await;
        assert!(restored.is_in_cart("w1").await);
        assert_eq!(restored.items_count().await, 2);

        restored.clear().await;
        assert_eq!(restored.grand_total().await, Decimal::ZERO);
    }
}
