use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::FavoriteProject;
use crate::error::Result;
use crate::kv::{KvStore, KvStoreExt};

/// Favorites are stored per user, or under one shared key for anonymous use.
pub fn favorites_key(user_id: Option<&str>) -> String {
    match user_id.map(str::trim).filter(|u| !u.is_empty()) {
        Some(user) => format!("favorites_{user}"),
        None => "favorites".to_string(),
    }
}

pub struct FavoritesRepository {
    kv: Arc<dyn KvStore>,
}

impl FavoritesRepository {
    pub fn new(kv: Arc<dyn KvStore>) -> Self { Self { kv } }

    /// Missing or unreadable favorites read as an empty list.
    pub async fn get(&self, user_id: Option<&str>) -> Result<Vec<FavoriteProject>> {
        let key = favorites_key(user_id);
        let Some(value) = self.kv.get(&key).await? else { return Ok(Vec::new()) };
        match serde_json::from_value(value) {
            Ok(projects) => Ok(projects),
            Err(e) => {
                warn!(key = %key, error = %e, "stored favorites are malformed");
                Ok(Vec::new())
            }
        }
    }

    pub async fn save(&self, user_id: Option<&str>, projects: &[FavoriteProject]) -> Result<()> {
        let key = favorites_key(user_id);
        self.kv.set_json(&key, &projects).await?;
        info!(key = %key, projects = projects.len(), "favorites saved");
        Ok(())
    }
}
