//! Shopping Cart Aggregate

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::order::OrderItem;
use super::wallpaper::Wallpaper;

pub const DEFAULT_ROLLS: Decimal = Decimal::ONE;
/// One standard roll's coverage in m².
pub const DEFAULT_WALL_AREA: Decimal = Decimal::from_parts(533, 0, 0, false, 2);
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(249, 0, 0, false, 0);
pub const ROLL_SHIPPING: Decimal = Decimal::from_parts(15, 0, 0, false, 0);
pub const SAMPLE_SHIPPING: Decimal = Decimal::from_parts(99, 0, 0, false, 2);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseType { #[default] Roll, Measurement, Sample }

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub wallpaper: Wallpaper,
    pub quantity: u32,
    pub rolls_needed: Decimal,
    pub wall_area: Decimal,
    #[serde(default)]
    pub purchase_type: PurchaseType,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart { items: Vec<CartItem> }

impl Cart {
    pub fn new() -> Self { Self::default() }
    pub fn from_items(items: Vec<CartItem>) -> Self { Self { items } }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Adding a wallpaper already in the cart bumps its quantity by one and
    /// accumulates rolls and area on the existing line.
    pub fn add(&mut self, wallpaper: Wallpaper, rolls_needed: Decimal, wall_area: Decimal, purchase_type: PurchaseType) {
        if let Some(item) = self.items.iter_mut().find(|i| i.id == wallpaper.id) {
            item.quantity = item.quantity.saturating_add(1);
            item.rolls_needed += rolls_needed;
            item.wall_area += wall_area;
            return;
        }
        self.items.push(CartItem {
            id: wallpaper.id.clone(), wallpaper, quantity: 1, rolls_needed, wall_area, purchase_type,
        });
    }

    /// Shifts a line's quantity by `change`, scaling rolls and area per unit.
    /// Lines that reach zero are dropped.
    pub fn update_quantity(&mut self, id: &str, change: i64) {
        for item in self.items.iter_mut().filter(|i| i.id == id) {
            let quantity = u32::try_from(i64::from(item.quantity).saturating_add(change).max(0)).unwrap_or(u32::MAX);
            if item.quantity > 0 {
                let per_unit = Decimal::from(item.quantity);
                item.rolls_needed = item.rolls_needed / per_unit * Decimal::from(quantity);
                item.wall_area = item.wall_area / per_unit * Decimal::from(quantity);
            }
            item.quantity = quantity;
        }
        self.items.retain(|i| i.quantity > 0);
    }

    pub fn remove(&mut self, id: &str) { self.items.retain(|i| i.id != id); }
    pub fn clear(&mut self) { self.items.clear(); }
    pub fn contains(&self, wallpaper_id: &str) -> bool { self.items.iter().any(|i| i.id == wallpaper_id) }
    pub fn items_count(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }

    /// Σ price × rolls.
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(|i| i.wallpaper.price * i.rolls_needed).sum()
    }

    pub fn shipping_cost(&self) -> Decimal {
        if self.is_empty() { return Decimal::ZERO; }
        if self.subtotal() >= FREE_SHIPPING_THRESHOLD { return Decimal::ZERO; }
        if self.items.iter().any(|i| i.purchase_type != PurchaseType::Sample) { return ROLL_SHIPPING; }
        let samples: u32 = self.items.iter().map(|i| i.quantity).sum();
        SAMPLE_SHIPPING * Decimal::from(samples)
    }

    pub fn grand_total(&self) -> Decimal { self.subtotal() + self.shipping_cost() }

    /// Order lines snapshotting each wallpaper as it is now.
    pub fn to_order_items(&self) -> Vec<OrderItem> {
        self.items.iter().map(|i| OrderItem {
            wallpaper_id: i.id.clone(), wallpaper_snapshot: i.wallpaper.clone(), quantity: i.quantity,
            rolls_needed: i.rolls_needed, wall_area: i.wall_area, purchase_type: i.purchase_type,
        }).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(id: &str, cents: i64) -> Wallpaper { Wallpaper::new(id, format!("Paper {id}"), Decimal::new(cents, 2)) }

    #[test]
    fn test_same_wallpaper_merges_into_one_line() {
        let mut cart = Cart::new();
        cart.add(paper("w1", 4599), Decimal::from(2), DEFAULT_WALL_AREA, PurchaseType::Roll);
        cart.add(paper("w1", 4599), Decimal::from(2), DEFAULT_WALL_AREA, PurchaseType::Roll);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.items()[0].rolls_needed, Decimal::from(4));
        assert_eq!(cart.items()[0].wall_area, Decimal::new(1066, 2));
    }

    #[test]
    fn test_update_quantity_scales_per_unit() {
        let mut cart = Cart::new();
        cart.add(paper("w1", 1000), Decimal::from(3), Decimal::from(6), PurchaseType::Roll);
        cart.update_quantity("w1", 1);
        assert_eq!(cart.items()[0].rolls_needed, Decimal::from(6));
        assert_eq!(cart.items()[0].wall_area, Decimal::from(12));
        cart.update_quantity("w1", -5);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_extreme_quantity_changes_clamp() {
        let mut cart = Cart::new();
        cart.add(paper("w1", 1000), Decimal::from(3), Decimal::from(6), PurchaseType::Roll);
        cart.update_quantity("w1", i64::MAX);
        assert_eq!(cart.items()[0].quantity, u32::MAX);
        assert_eq!(cart.items()[0].rolls_needed, Decimal::from(3) * Decimal::from(u32::MAX));
        cart.add(paper("w1", 1000), Decimal::ZERO, Decimal::ZERO, PurchaseType::Roll);
        assert_eq!(cart.items()[0].quantity, u32::MAX);
        cart.update_quantity("w1", i64::MIN);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_shipping_rules() {
        let mut cart = Cart::new();
        cart.add(paper("s1", 0), Decimal::ONE, Decimal::ZERO, PurchaseType::Sample);
        cart.add(paper("s2", 0), Decimal::ONE, Decimal::ZERO, PurchaseType::Sample);
        assert_eq!(cart.shipping_cost(), Decimal::new(198, 2));

        cart.add(paper("r1", 5000), Decimal::from(2), DEFAULT_WALL_AREA, PurchaseType::Roll);
        assert_eq!(cart.subtotal(), Decimal::from(100));
        assert_eq!(cart.shipping_cost(), ROLL_SHIPPING);
        assert_eq!(cart.grand_total(), Decimal::from(115));

        cart.add(paper("r2", 14900), DEFAULT_ROLLS, DEFAULT_WALL_AREA, PurchaseType::Measurement);
        assert_eq!(cart.subtotal(), Decimal::from(249));
        assert_eq!(cart.shipping_cost(), Decimal::ZERO);
    }

    #[test]
    fn test_order_items_snapshot_wallpaper() {
        let mut cart = Cart::new();
        cart.add(paper("w1", 4599), DEFAULT_ROLLS, DEFAULT_WALL_AREA, PurchaseType::Roll);
        let items = cart.to_order_items();
        assert_eq!(items[0].wallpaper_id, "w1");
        assert_eq!(items[0].wallpaper_snapshot.price, Decimal::new(4599, 2));
        assert_eq!(cart.items_count(), 1);
    }
}
