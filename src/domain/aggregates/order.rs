//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::{Validate, ValidationError};

use super::cart::PurchaseType;
use super::wallpaper::Wallpaper;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zelle_reference: Option<String>,
    #[serde(default)]
    pub zelle_confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Anything else the checkout flow attached; kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub wallpaper_id: String,
    pub wallpaper_snapshot: Wallpaper,
    #[validate(range(min = 1))]
    pub quantity: u32,
    pub rolls_needed: Decimal,
    pub wall_area: Decimal,
    #[serde(default)]
    pub purchase_type: PurchaseType,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Pending, Confirmed, Preparing, Ready, Delivered, Cancelled }

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [Self::Pending, Self::Confirmed, Self::Preparing, Self::Ready, Self::Delivered, Self::Cancelled];
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod { #[default] Zelle, CreditCard }

/// Checkout payload. `total` is the client's figure; it is checked, not recomputed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    #[validate(length(min = 1, message = "userId requerido"))]
    pub user_id: String,
    #[validate(length(min = 1, message = "El nombre es requerido"))]
    pub customer_name: String,
    #[validate(email(message = "Email inválido"))]
    pub customer_email: String,
    #[validate(length(min = 1, message = "El teléfono es requerido"))]
    pub customer_phone: String,
    #[validate(length(min = 1, message = "La dirección es requerida"))]
    pub customer_address: String,
    #[validate(custom = "validate_items")]
    pub items: Vec<OrderItem>,
    #[validate(custom = "non_negative")]
    pub total: Decimal,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub zelle_reference: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn validate_items(items: &[OrderItem]) -> Result<(), ValidationError> {
    if items.is_empty() {
        let mut e = ValidationError::new("items");
        e.message = Some("Debe haber al menos un item".into());
        return Err(e);
    }
    if items.iter().any(|i| i.validate().is_err()) {
        let mut e = ValidationError::new("items");
        e.message = Some("Cantidad inválida".into());
        return Err(e);
    }
    Ok(())
}

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut e = ValidationError::new("total");
        e.message = Some("El total no puede ser negativo".into());
        return Err(e);
    }
    Ok(())
}

impl Order {
    pub fn place(new: NewOrder, id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: Some(new.user_id),
            customer_name: new.customer_name,
            customer_email: new.customer_email,
            customer_phone: new.customer_phone,
            customer_address: new.customer_address,
            items: new.items,
            total: new.total,
            status: new.status.unwrap_or_default(),
            payment_method: new.payment_method,
            zelle_reference: new.zelle_reference,
            zelle_confirmed: false,
            created_at: now,
            updated_at: now,
            extra: new.extra,
        }
    }

    pub fn record_key(&self) -> String { order_key(&self.id) }
}

pub fn order_key(id: &str) -> String { format!("order:{id}") }

/// Fields a patch can never overwrite.
const IMMUTABLE_FIELDS: [&str; 2] = ["id", "createdAt"];

/// Shallow-merges `patch` over a stored order and stamps `updatedAt`.
/// Returns the merged record alongside its typed form; a merge that no longer
/// describes an order is an error and leaves nothing written.
pub fn apply_patch(current: Value, patch: &Map<String, Value>, now: DateTime<Utc>) -> Result<(Value, Order), serde_json::Error> {
    let mut record = match current {
        Value::Object(map) => map,
        other => return Err(serde::de::Error::custom(format!("stored order is not an object: {other}"))),
    };
    for (field, value) in patch {
        if IMMUTABLE_FIELDS.contains(&field.as_str()) { continue; }
        record.insert(field.clone(), value.clone());
    }
    record.insert("updatedAt".into(), serde_json::to_value(now)?);
    let merged = Value::Object(record);
    let order = serde_json::from_value(merged.clone())?;
    Ok((merged, order))
}

/// Counters over a set of orders. Revenue counts delivered orders only.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total: usize,
    pub total_revenue: Decimal,
    pub pending: usize,
    pub confirmed: usize,
    pub preparing: usize,
    pub ready: usize,
    pub delivered: usize,
    pub cancelled: usize,
}

impl OrderStats {
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
        let mut stats = Self::default();
        for order in orders {
            stats.total += 1;
            match order.status {
                OrderStatus::Pending => stats.pending += 1,
                OrderStatus::Confirmed => stats.confirmed += 1,
                OrderStatus::Preparing => stats.preparing += 1,
                OrderStatus::Ready => stats.ready += 1,
                OrderStatus::Delivered => {
                    stats.delivered += 1;
                    stats.total_revenue += order.total;
                }
                OrderStatus::Cancelled => stats.cancelled += 1,
            }
        }
        stats
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn new_order(user: &str, total: Decimal) -> NewOrder {
        NewOrder {
            user_id: user.into(),
            customer_name: "Ana Pérez".into(),
            customer_email: "ana@example.com".into(),
            customer_phone: "+1 305 555 0100".into(),
            customer_address: "1 Ocean Dr, Miami".into(),
            items: vec![OrderItem {
                wallpaper_id: "1".into(),
                wallpaper_snapshot: Wallpaper::new("1", "Papel Tapiz Floral Elegante", Decimal::new(4599, 2)),
                quantity: 1,
                rolls_needed: Decimal::ONE,
                wall_area: Decimal::new(533, 2),
                purchase_type: PurchaseType::Roll,
            }],
            total,
            status: None,
            payment_method: PaymentMethod::Zelle,
            zelle_reference: Some("ZL-1234".into()),
            extra: Map::new(),
        }
    }

    #[test]
    fn test_new_order_validation() {
        assert!(new_order("u1", Decimal::new(4599, 2)).validate().is_ok());

        let mut bad = new_order("u1", Decimal::new(-1, 0));
        assert!(bad.validate().is_err());
        bad.total = Decimal::ZERO;
        bad.items.clear();
        assert!(bad.validate().is_err());

        let mut bad_email = new_order("u1", Decimal::ONE);
        bad_email.customer_email = "nope".into();
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_patch_ignores_immutable_fields() {
        let now = Utc::now();
        let order = Order::place(new_order("u1", Decimal::ONE), "100".into(), now);
        let stored = serde_json::to_value(&order).unwrap();
        let patch = json!({"id": "hijack", "createdAt": "2000-01-01T00:00:00Z", "status": "confirmed"});
        let later = now + chrono::Duration::seconds(5);
        let (_, merged) = apply_patch(stored, patch.as_object().unwrap(), later).unwrap();
        assert_eq!(merged.id, "100");
        assert_eq!(merged.created_at, order.created_at);
        assert_eq!(merged.status, OrderStatus::Confirmed);
        assert_eq!(merged.updated_at, later);
    }

    #[test]
    fn test_patch_that_breaks_shape_is_rejected() {
        let order = Order::place(new_order("u1", Decimal::ONE), "100".into(), Utc::now());
        let stored = serde_json::to_value(&order).unwrap();
        let patch = json!({"status": "shipped"});
        assert!(apply_patch(stored, patch.as_object().unwrap(), Utc::now()).is_err());
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let mut new = new_order("u1", Decimal::ONE);
        new.extra.insert("notes".into(), json!("leave at door"));
        let order = Order::place(new, "1".into(), Utc::now());
        let back: Order = serde_json::from_value(serde_json::to_value(&order).unwrap()).unwrap();
        assert_eq!(back, order);
        assert_eq!(back.extra.get("notes"), Some(&json!("leave at door")));
    }

    #[test]
    fn test_stats_count_delivered_revenue() {
        let now = Utc::now();
        let mut a = Order::place(new_order("u1", Decimal::new(4599, 2)), "1".into(), now);
        a.status = OrderStatus::Delivered;
        let b = Order::place(new_order("u1", Decimal::new(1000, 2)), "2".into(), now);
        let stats = OrderStats::from_orders([&a, &b]);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.total_revenue, Decimal::new(4599, 2));
    }
}
