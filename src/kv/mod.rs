//! KV client adapter
//!
//! One seam for every key-value operation the routes perform. Values travel
//! as JSON-encoded strings; [`normalize`] decodes them once at the boundary so
//! repositories never see the "string or already decoded" ambiguity.

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use memory::MemoryKv;
pub use rest::RestKv;

#[derive(Error, Debug)]
pub enum KvError {
    #[error("KV transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("KV returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("KV command failed: {0}")]
    Remote(String),

    #[error("KV value could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("KV write rejected for {0}")]
    Rejected(String),
}

pub type KvResult<T> = std::result::Result<T, KvError>;

#[async_trait]
pub trait KvStore: Send + Sync {
    /// Normalized value at `key`, `None` when absent.
    async fn get(&self, key: &str) -> KvResult<Option<Value>>;

    async fn set(&self, key: &str, value: &Value) -> KvResult<()>;

    /// Number of keys removed (0 when already absent).
    async fn del(&self, key: &str) -> KvResult<u64>;

    /// Prepends `values` in order; the last one ends up at the head.
    async fn lpush(&self, key: &str, values: &[String]) -> KvResult<u64>;

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> KvResult<Vec<String>>;

    /// Raw multi-argument command, e.g. `["MGET", "a", "b"]`.
    async fn command(&self, args: &[String]) -> KvResult<Value>;

    async fn mget(&self, keys: &[String]) -> KvResult<Vec<Option<Value>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut args = Vec::with_capacity(keys.len() + 1);
        args.push("MGET".to_string());
        args.extend(keys.iter().cloned());
        match self.command(&args).await? {
            Value::Array(items) => Ok(items
                .into_iter()
                .map(|v| if v.is_null() { None } else { Some(normalize(v)) })
                .collect()),
            Value::Null => Ok(vec![None; keys.len()]),
            other => Err(KvError::Remote(format!("unexpected MGET result: {other}"))),
        }
    }

    /// Removes every occurrence of `value` from the list at `key`.
    async fn lrem(&self, key: &str, value: &str) -> KvResult<u64> {
        let args = ["LREM".to_string(), key.to_string(), "0".to_string(), value.to_string()];
        Ok(self.command(&args).await?.as_u64().unwrap_or(0))
    }

    async fn keys(&self, pattern: &str) -> KvResult<Vec<String>> {
        let args = ["KEYS".to_string(), pattern.to_string()];
        match self.command(&args).await? {
            Value::Array(items) => Ok(items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()),
            _ => Ok(Vec::new()),
        }
    }
}

/// Typed helpers over any [`KvStore`], including trait objects.
#[async_trait]
pub trait KvStoreExt {
    async fn get_json<T: DeserializeOwned + Send>(&self, key: &str) -> KvResult<Option<T>>;
    async fn set_json<T: Serialize + Sync>(&self, key: &str, value: &T) -> KvResult<()>;
}

#[async_trait]
impl<S: KvStore + ?Sized> KvStoreExt for S {
    async fn get_json<T: DeserializeOwned + Send>(&self, key: &str) -> KvResult<Option<T>> {
        match self.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn set_json<T: Serialize + Sync>(&self, key: &str, value: &T) -> KvResult<()> {
        let value = serde_json::to_value(value)?;
        self.set(key, &value).await
    }
}

/// Decodes a value the store handed back as a JSON string. Anything that is
/// not a string holding valid JSON passes through untouched.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(decoded) => decoded,
            Err(_) => Value::String(raw),
        },
        other => other,
    }
}
