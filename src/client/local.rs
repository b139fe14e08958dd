//! On-device mirror: one JSON file per key under the cache directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;

use crate::error::ClientResult;

pub const CATALOG: &str = "wallpapers_catalog";
pub const CATALOG_TIMESTAMP: &str = "wallpapers_catalog_timestamp";
pub const FAVORITES: &str = "favorites";
pub const COLLECTIONS: &str = "collections";
pub const CART: &str = "cart";
pub const ORDERS: &str = "orders";
pub const SESSION: &str = "auth_session";

#[derive(Clone, Debug)]
pub struct LocalCache {
    dir: PathBuf,
}

impl LocalCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// `None` when nothing has been mirrored under `key`.
    pub async fn read<T: DeserializeOwned>(&self, key: &str) -> ClientResult<Option<T>> {
        match fs::read(self.path(key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Replaces the mirrored value; readers never see a half-written file.
    pub async fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> ClientResult<()> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(value)?).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> ClientResult<()> {
        match fs::remove_file(self.path(key)).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    /// Mirrors a value, logging instead of failing. The in-memory state
    /// stays authoritative for the session either way.
    pub(crate) async fn mirror<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.write(key, value).await {
            tracing::warn!(key, error = %e, "local mirror write failed");
        }
    }

    /// Reads a mirrored value, treating an unreadable file as absent.
    pub(crate) async fn restore<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.read(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "local mirror unreadable");
                None
            }
        }
    }
}
