//! In-process KV store with the REST store's semantics. Backs the tests and
//! local development; individual keys can be made to reject writes so
//! partial-failure paths are reachable.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use super::{normalize, KvError, KvResult, KvStore};

#[derive(Debug, Clone)]
enum Entry {
    Str(String),
    List(VecDeque<String>),
}

#[derive(Default)]
pub struct MemoryKv {
    data: Mutex<HashMap<String, Entry>>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent write to `key` fails with [`KvError::Rejected`].
    pub fn fail_writes_to(&self, key: impl Into<String>) {
        lock(&self.failing).insert(key.into());
    }

    pub fn heal(&self) {
        lock(&self.failing).clear();
    }

    pub fn contains(&self, key: &str) -> bool {
        lock(&self.data).contains_key(key)
    }

    /// Raw string stored at `key`, as the REST store would return it.
    pub fn raw(&self, key: &str) -> Option<String> {
        match lock(&self.data).get(key) {
            Some(Entry::Str(s)) => Some(s.clone()),
            _ => None,
        }
    }

    /// Stores `raw` verbatim, bypassing JSON encoding.
    pub fn put_raw(&self, key: &str, raw: &str) {
        lock(&self.data).insert(key.to_string(), Entry::Str(raw.to_string()));
    }

    fn check_write(&self, key: &str) -> KvResult<()> {
        if lock(&self.failing).contains(key) {
            return Err(KvError::Rejected(key.to_string()));
        }
        Ok(())
    }

    fn list_range(list: &VecDeque<String>, start: i64, stop: i64) -> Vec<String> {
        let len = list.len() as i64;
        let resolve = |i: i64| if i < 0 { len + i } else { i };
        let (start, stop) = (resolve(start).max(0), resolve(stop).min(len - 1));
        if len == 0 || start > stop {
            return Vec::new();
        }
        list.iter().skip(start as usize).take((stop - start + 1) as usize).cloned().collect()
    }

    fn wrong_type(key: &str) -> KvError {
        KvError::Remote(format!("WRONGTYPE Operation against a key holding the wrong kind of value: {key}"))
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn glob_match(pattern: &str, key: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == key,
        Some((prefix, rest)) => {
            if !key.starts_with(prefix) {
                return false;
            }
            let tail = &key[prefix.len()..];
            if rest.is_empty() {
                return true;
            }
            (0..=tail.len()).any(|i| tail.is_char_boundary(i) && glob_match(rest, &tail[i..]))
        }
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> KvResult<Option<Value>> {
        match lock(&self.data).get(key) {
            Some(Entry::Str(s)) => Ok(Some(normalize(Value::String(s.clone())))),
            Some(Entry::List(_)) => Err(Self::wrong_type(key)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &Value) -> KvResult<()> {
        self.check_write(key)?;
        let raw = serde_json::to_string(value)?;
        lock(&self.data).insert(key.to_string(), Entry::Str(raw));
        Ok(())
    }

    async fn del(&self, key: &str) -> KvResult<u64> {
        self.check_write(key)?;
        Ok(lock(&self.data).remove(key).map_or(0, |_| 1))
    }

    async fn lpush(&self, key: &str, values: &[String]) -> KvResult<u64> {
        self.check_write(key)?;
        let mut data = lock(&self.data);
        let entry = data.entry(key.to_string()).or_insert_with(|| Entry::List(VecDeque::new()));
        match entry {
            Entry::List(list) => {
                for v in values {
                    list.push_front(v.clone());
                }
                Ok(list.len() as u64)
            }
            Entry::Str(_) => Err(Self::wrong_type(key)),
        }
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> KvResult<Vec<String>> {
        match lock(&self.data).get(key) {
            Some(Entry::List(list)) => Ok(Self::list_range(list, start, stop)),
            Some(Entry::Str(_)) => Err(Self::wrong_type(key)),
            None => Ok(Vec::new()),
        }
    }

    async fn command(&self, args: &[String]) -> KvResult<Value> {
        let (name, rest) = args
            .split_first()
            .ok_or_else(|| KvError::Remote("empty command".into()))?;
        match name.to_ascii_uppercase().as_str() {
            "MGET" => {
                let data = lock(&self.data);
                Ok(Value::Array(
                    rest.iter()
                        .map(|k| match data.get(k) {
                            Some(Entry::Str(s)) => Value::String(s.clone()),
                            _ => Value::Null,
                        })
                        .collect(),
                ))
            }
            "LREM" => {
                let [key, _count, value] = rest else {
                    return Err(KvError::Remote("LREM expects key count value".into()));
                };
                self.check_write(key)?;
                let mut data = lock(&self.data);
                match data.get_mut(key.as_str()) {
                    Some(Entry::List(list)) => {
                        let before = list.len();
                        list.retain(|v| v != value);
                        let removed = before - list.len();
                        if list.is_empty() {
                            data.remove(key.as_str());
                        }
                        Ok(Value::from(removed as u64))
                    }
                    Some(Entry::Str(_)) => Err(Self::wrong_type(key)),
                    None => Ok(Value::from(0u64)),
                }
            }
            "KEYS" => {
                let pattern = rest.first().map(String::as_str).unwrap_or("*");
                let data = lock(&self.data);
                let mut keys: Vec<&String> = data.keys().filter(|k| glob_match(pattern, k)).collect();
                keys.sort();
                Ok(Value::Array(keys.into_iter().map(|k| Value::String(k.clone())).collect()))
            }
            other => Err(KvError::Remote(format!("unsupported command {other}"))),
        }
    }
}
