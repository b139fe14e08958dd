//! Featured collections

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Collection {
    fn preset(id: &str, name: &str, photo: &str, colors: &[&str], category: &str, featured: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: format!("https://images.unsplash.com/photo-{photo}?w=800&h=600&fit=crop&auto=format&q=80"),
            colors: colors.iter().map(|c| c.to_string()).collect(),
            category: Some(category.into()),
            featured,
            extra: Map::new(),
        }
    }
}

pub fn default_collections() -> Vec<Collection> {
    vec![
        Collection::preset("blanco-negro", "Blanco & Negro Moderno", "1618221195710-dd6b41faaea6", &["Blanco", "Negro", "Gris"], "Geométrico", true),
        Collection::preset("textura-beige", "Textura Beige Soft", "1615529182904-14819c35db37", &["Beige", "Crema"], "Textura", false),
        Collection::preset("geometria-gold", "Geometría Gold Line", "1578662996442-48f60103fc96", &["Dorado", "Negro"], "Geométrico", false),
    ]
}

/// Decodes a stored collection list; a malformed list decodes as `None`.
pub fn decode_collections(value: Value) -> Option<Vec<Collection>> {
    match serde_json::from_value(value) {
        Ok(list) => Some(list),
        Err(e) => {
            tracing::warn!(error = %e, "stored collections are malformed");
            None
        }
    }
}
