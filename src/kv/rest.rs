//! KV store over its REST endpoints (`/get`, `/set`, `/del`, `/lpush`,
//! `/lrange`, and the generic command endpoint at the base URL).

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use serde_json::Value;

use super::{normalize, KvError, KvResult, KvStore};

#[derive(Clone)]
pub struct RestKv {
    http: Client,
    base: Url,
    token: String,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

impl RestKv {
    pub fn new(base_url: &str, token: impl Into<String>) -> KvResult<Self> {
        let base = Url::parse(base_url).map_err(|e| KvError::Remote(format!("invalid KV url: {e}")))?;
        Ok(Self { http: Client::new(), base, token: token.into() })
    }

    fn url(&self, segments: &[&str]) -> KvResult<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| KvError::Remote("KV url cannot be a base".into()))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> KvResult<Value> {
        let response = request.bearer_auth(&self.token).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KvError::Status { status: status.as_u16(), body });
        }
        let envelope: Envelope = response.json().await?;
        match envelope.error {
            Some(error) => Err(KvError::Remote(error)),
            None => Ok(envelope.result),
        }
    }
}

#[async_trait]
impl KvStore for RestKv {
    async fn get(&self, key: &str) -> KvResult<Option<Value>> {
        let result = self.send(self.http.get(self.url(&["get", key])?)).await?;
        Ok(if result.is_null() { None } else { Some(normalize(result)) })
    }

    async fn set(&self, key: &str, value: &Value) -> KvResult<()> {
        let body = serde_json::to_string(value)?;
        self.send(self.http.post(self.url(&["set", key])?).body(body)).await?;
        tracing::debug!(key, "kv set");
        Ok(())
    }

    async fn del(&self, key: &str) -> KvResult<u64> {
        let result = self.send(self.http.post(self.url(&["del", key])?)).await?;
        Ok(result.as_u64().unwrap_or(0))
    }

    async fn lpush(&self, key: &str, values: &[String]) -> KvResult<u64> {
        let result = self.send(self.http.post(self.url(&["lpush", key])?).json(values)).await?;
        Ok(result.as_u64().unwrap_or(0))
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> KvResult<Vec<String>> {
        let (start, stop) = (start.to_string(), stop.to_string());
        let result = self.send(self.http.get(self.url(&["lrange", key, &start, &stop])?)).await?;
        Ok(match result {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        })
    }

    async fn command(&self, args: &[String]) -> KvResult<Value> {
        self.send(self.http.post(self.base.clone()).json(args)).await
    }
}
