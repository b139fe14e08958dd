//! The catalog is one JSON array under a single key, always read and written whole.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::domain::wallpaper::{decode_catalog, default_catalog, regroup_all};
use crate::domain::Wallpaper;
use crate::error::{Result, StoreError};
use crate::kv::{KvStore, KvStoreExt};

pub const CATALOG_KEY: &str = "wallpapers_catalog";

/// Where a served catalog came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CatalogSource {
    Kv,
    /// The store was empty and has been seeded with the bundled catalog.
    Seeded,
    /// The store failed or held nothing readable; bundled catalog served
    /// without touching it.
    Fallback,
}

pub struct CatalogRepository {
    kv: Arc<dyn KvStore>,
}

impl CatalogRepository {
    pub fn new(kv: Arc<dyn KvStore>) -> Self { Self { kv } }

    /// Stored catalog, `None` when the key is absent.
    pub async fn load(&self) -> Result<Option<Vec<Wallpaper>>> {
        let mut items = match self.kv.get(CATALOG_KEY).await? {
            Some(value) => decode_catalog(value),
            None => return Ok(None),
        };
        regroup_all(&mut items);
        Ok(Some(items))
    }

    /// Catalog for listing. Never fails. The store is seeded only when the
    /// key is absent or holds an empty array; a stored catalog that decodes
    /// to nothing, or a failing store, yields the bundled catalog untouched.
    pub async fn fetch(&self) -> (Vec<Wallpaper>, CatalogSource) {
        let stored = match self.kv.get(CATALOG_KEY).await {
            Ok(Some(Value::Array(items))) if items.is_empty() => None,
            Ok(stored) => stored,
            Err(e) => {
                error!(error = %e, "catalog read failed; serving bundled catalog");
                return (default_catalog(), CatalogSource::Fallback);
            }
        };
        let Some(value) = stored else {
            let defaults = default_catalog();
            match self.kv.set_json(CATALOG_KEY, &defaults).await {
                Ok(()) => info!(items = defaults.len(), "seeded empty catalog"),
                Err(e) => warn!(error = %e, "could not seed empty catalog"),
            }
            return (defaults, CatalogSource::Seeded);
        };
        let mut items = decode_catalog(value);
        if items.is_empty() {
            error!("stored catalog has no readable items; serving bundled catalog");
            return (default_catalog(), CatalogSource::Fallback);
        }
        regroup_all(&mut items);
        (items, CatalogSource::Kv)
    }

    /// Overwrites the whole catalog. Groups are derived data and not stored.
    pub async fn save(&self, mut catalog: Vec<Wallpaper>) -> Result<usize> {
        if catalog.is_empty() {
            return Err(StoreError::Validation("El catálogo debe tener al menos un item".into()));
        }
        if let Some(bad) = catalog.iter().find(|w| w.id.trim().is_empty() || w.name.trim().is_empty()) {
            return Err(StoreError::Validation(format!("Item inválido en el catálogo: '{}'", bad.id)));
        }
        catalog.iter_mut().for_each(|w| w.group = None);
        self.kv.set_json(CATALOG_KEY, &catalog).await?;
        info!(items = catalog.len(), "catalog saved");
        Ok(catalog.len())
    }

    pub async fn reset(&self) -> Result<Vec<Wallpaper>> {
        self.kv.del(CATALOG_KEY).await?;
        let defaults = default_catalog();
        self.kv.set_json(CATALOG_KEY, &defaults).await?;
        warn!(items = defaults.len(), "catalog reset to bundled defaults");
        Ok(defaults)
    }
}
