use std::sync::Arc;

use tracing::info;

use crate::domain::collection::decode_collections;
use crate::domain::Collection;
use crate::error::Result;
use crate::kv::{KvStore, KvStoreExt};

pub const COLLECTIONS_KEY: &str = "collections";

pub struct CollectionsRepository {
    kv: Arc<dyn KvStore>,
}

impl CollectionsRepository {
    pub fn new(kv: Arc<dyn KvStore>) -> Self { Self { kv } }

    /// `None` when nothing usable is stored.
    pub async fn get(&self) -> Result<Option<Vec<Collection>>> {
        Ok(self.kv.get(COLLECTIONS_KEY).await?.and_then(decode_collections))
    }

    pub async fn save(&self, collections: &[Collection]) -> Result<()> {
        self.kv.set_json(COLLECTIONS_KEY, &collections).await?;
        info!(collections = collections.len(), "collections saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::default_collections;
    use crate::kv::MemoryKv;

    #[tokio::test]
    async fn test_round_trip_and_missing() {
        let repo = CollectionsRepository::new(Arc::new(MemoryKv::new()));
        assert!(repo.get().await.unwrap().is_none());
        repo.save(&default_collections()).await.unwrap();
        assert_eq!(repo.get().await.unwrap(), Some(default_collections()));
    }
}
