//! Wallpaper catalog item

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::domain::grouping::derive_group;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallpaper {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Decimal,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default)]
    pub collection: String,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default, deserialize_with = "lenient_dimensions")]
    pub dimensions: Dimensions,
    #[serde(default)]
    pub specifications: Specifications,
    #[serde(default = "in_stock_default")]
    pub in_stock: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_repeat: Option<Decimal>,
    #[serde(default)]
    pub show_in_home: bool,
    /// Recomputed from `name` on every load; whatever was stored is ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Fields the storefront carries but does not interpret (rating, tags...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimensions { pub width: Decimal, pub height: Decimal, pub coverage: Decimal }

impl Default for Dimensions {
    fn default() -> Self { Self { width: Decimal::new(53, 2), height: Decimal::new(1005, 2), coverage: Decimal::new(533, 2) } }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Specifications { pub material: String, pub washable: bool, pub removable: bool, pub textured: bool }

impl Default for Specifications {
    fn default() -> Self { Self { material: "Vinilo".into(), washable: true, removable: true, textured: false } }
}

/// Ids arrive as strings or numbers; anything else reads as no id.
fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// A missing, null or non-numeric price is zero.
fn lenient_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        value @ Value::Number(_) => serde_json::from_value(value).unwrap_or_default(),
        _ => Decimal::ZERO,
    })
}

/// Free-text dimensions ("10m x 0.53m") fall back to the standard roll.
fn lenient_dimensions<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Dimensions, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
        _ => Dimensions::default(),
    })
}

fn default_category() -> String { "General".into() }
fn default_style() -> String { "Moderno".into() }
fn in_stock_default() -> bool { true }

/// Listing projection served by `?lite=true`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WallpaperSummary {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub image_url: String,
    pub category: String,
    pub collection: String,
    pub group: String,
    pub style: String,
    pub in_stock: bool,
    pub dimensions: Dimensions,
}

impl Wallpaper {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
        let mut w = Self {
            id: id.into(), name: name.into(), description: String::new(), price,
            image_url: String::new(), image_urls: vec![], category: default_category(), style: default_style(),
            collection: String::new(), colors: vec![], dimensions: Dimensions::default(),
            specifications: Specifications::default(), in_stock: true, pattern_repeat: None,
            show_in_home: false, group: None, extra: Map::new(),
        };
        w.regroup();
        w
    }

    pub fn regroup(&mut self) { self.group = Some(derive_group(&self.name)); }

    pub fn group_key(&self) -> String { self.group.clone().unwrap_or_else(|| derive_group(&self.name)) }

    /// First usable image: `imageUrl` when it looks like one, else the first of `imageUrls`.
    pub fn primary_image(&self) -> &str {
        if self.image_url.len() > 5 { return &self.image_url; }
        self.image_urls.first().map(String::as_str).unwrap_or("")
    }

    pub fn summary(&self) -> WallpaperSummary {
        WallpaperSummary {
            id: self.id.clone(), name: self.name.clone(), price: self.price,
            image_url: self.primary_image().to_string(), category: self.category.clone(),
            collection: self.collection.clone(), group: self.group_key(), style: self.style.clone(),
            in_stock: self.in_stock, dimensions: self.dimensions.clone(),
        }
    }

    pub fn in_collection(&self, collection: &str) -> bool {
        !self.collection.is_empty() && self.collection.to_lowercase() == collection.to_lowercase()
    }
}

/// Recomputes every item's group in place.
pub fn regroup_all(items: &mut [Wallpaper]) {
    items.iter_mut().for_each(Wallpaper::regroup);
}

/// Decodes a stored catalog, dropping entries that are not wallpapers.
pub fn decode_catalog(value: Value) -> Vec<Wallpaper> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<Wallpaper>(item) {
                Ok(w) if !w.id.is_empty() && !w.name.is_empty() => Some(w),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed catalog entry");
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// The catalog shipped with the storefront, used when nothing else loads.
pub fn default_catalog() -> Vec<Wallpaper> {
    let img = |code: &str| format!("https://images.unsplash.com/photo-{code}?w=400&h=400&fit=crop&auto=format&q=80");
    let item = |id: &str, name: &str, description: &str, cents: i64, images: &[&str], category: &str, style: &str,
                colors: &[&str], material: &str, washable: bool, textured: bool| {
        let mut w = Wallpaper::new(id, name, Decimal::new(cents, 2));
        w.description = description.into();
        w.image_urls = images.iter().map(|c| img(c)).collect();
        w.image_url = w.image_urls.first().cloned().unwrap_or_default();
        w.category = category.into();
        w.style = style.into();
        w.colors = colors.iter().map(|c| c.to_string()).collect();
        w.specifications = Specifications { material: material.into(), washable, removable: true, textured };
        w
    };

    vec![
        item("1", "Papel Tapiz Floral Elegante", "Diseño floral clásico con toques dorados sobre fondo crema", 4599,
             &["1586023492125-27b2c045efd7", "1558618666-fcd25c85cd64", "1578662996442-48f60103fc96"],
             "Floral", "Clásico", &["Crema", "Dorado", "Verde"], "Vinilo", true, false),
        item("2", "Diseño Geométrico Moderno", "Patrones geométricos contemporáneos en tonos neutros", 5299,
             &["1618221195710-dd6b41faaea6", "1507003211169-0a1dd7228f2d"],
             "Geométrico", "Moderno", &["Gris", "Blanco", "Negro"], "No tejido", true, true),
        item("3", "Textura Minimalista", "Textura sutil y elegante para espacios modernos", 3899,
             &["1615529182904-14819c35db37"],
             "Textura", "Minimalista", &["Beige", "Blanco"], "Papel", false, true),
        item("4", "Rayas Verticales Clásicas", "Rayas verticales elegantes que agrandan visualmente el espacio", 4199,
             &["1507003211169-0a1dd7228f2d", "1615529182904-14819c35db37"],
             "Rayas", "Clásico", &["Azul", "Blanco"], "Vinilo", true, false),
        item("5", "Mármol Luxury", "Efecto mármol sofisticado para espacios de lujo", 6899,
             &["1578662996442-48f60103fc96", "1586023492125-27b2c045efd7", "1618221195710-dd6b41faaea6"],
             "Textura", "Luxury", &["Blanco", "Gris", "Dorado"], "Vinilo Premium", true, true),
    ]
}
