//! The storefront API as seen from the client stores.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::domain::wallpaper::decode_catalog;
use crate::domain::{Collection, Credentials, FavoriteProject, NewOrder, Order, PublicUser, Registration, Wallpaper};
use crate::error::{ClientError, ClientResult};

/// A signed-in user and the bearer token the API issued for them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: PublicUser,
    pub token: String,
}

#[async_trait]
pub trait Remote: Send + Sync {
    async fn fetch_catalog(&self, timeout: Duration) -> ClientResult<Vec<Wallpaper>>;
    async fn save_catalog(&self, catalog: &[Wallpaper], token: &str) -> ClientResult<usize>;
    async fn reset_catalog(&self, token: &str) -> ClientResult<Vec<Wallpaper>>;

    async fn fetch_favorites(&self, user_id: Option<&str>) -> ClientResult<Vec<FavoriteProject>>;
    async fn save_favorites(&self, projects: &[FavoriteProject], user_id: Option<&str>) -> ClientResult<()>;

    async fn fetch_collections(&self, timeout: Duration) -> ClientResult<Vec<Collection>>;
    async fn save_collections(&self, collections: &[Collection], token: &str, timeout: Duration) -> ClientResult<()>;

    async fn my_orders(&self, token: &str) -> ClientResult<Vec<Order>>;
    async fn list_orders(&self, token: &str) -> ClientResult<Vec<Order>>;
    async fn create_order(&self, order: &NewOrder, token: &str) -> ClientResult<Order>;
    async fn update_order(&self, id: &str, updates: &Map<String, Value>, token: &str) -> ClientResult<Order>;
    async fn delete_order(&self, id: &str, token: &str) -> ClientResult<()>;

    async fn send_verification_code(&self, email: &str, code: &str) -> ClientResult<()>;
    /// Creates the account and signs it in.
    async fn register(&self, registration: &Registration) -> ClientResult<Session>;
    async fn login(&self, credentials: &Credentials) -> ClientResult<Session>;
}

/// [`Remote`] over HTTP against the `/api/...` routes.
#[derive(Clone)]
pub struct HttpRemote {
    http: Client,
    base: String,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base = base_url.into().trim_end_matches('/').to_string();
        Self { http: Client::new(), base }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Sends a request and returns the decoded body of a 2xx response.
    async fn send(&self, request: RequestBuilder) -> ClientResult<Value> {
        let response = request.header(header::ACCEPT, "application/json").send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
        if status.is_success() {
            return Ok(body);
        }
        let message = body["error"]
            .as_str()
            .map(str::to_string)
            .or_else(|| (!text.is_empty()).then(|| text.clone()))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
        tracing::warn!(status = status.as_u16(), error = %message, "api request failed");
        Err(ClientError::from_status(status.as_u16(), message, body["needsConfig"] == true))
    }
}

fn field<T: DeserializeOwned>(mut body: Value, name: &str) -> ClientResult<T> {
    Ok(serde_json::from_value(body[name].take())?)
}

#[async_trait]
impl Remote for HttpRemote {
    async fn fetch_catalog(&self, timeout: Duration) -> ClientResult<Vec<Wallpaper>> {
        let now = chrono::Utc::now().timestamp_millis().to_string();
        let request = self
            .http
            .get(self.url("/api/catalog/get"))
            .query(&[("t", now.as_str())])
            .header(header::CACHE_CONTROL, "no-store, no-cache, must-revalidate")
            .timeout(timeout);
        let mut body = self.send(request).await?;
        Ok(decode_catalog(body["catalog"].take()))
    }

    async fn save_catalog(&self, catalog: &[Wallpaper], token: &str) -> ClientResult<usize> {
        let request = self.http.post(self.url("/api/catalog/update")).bearer_auth(token).json(&json!({ "catalog": catalog }));
        let body = self.send(request).await?;
        Ok(body["count"].as_u64().map_or(catalog.len(), |n| n as usize))
    }

    async fn reset_catalog(&self, token: &str) -> ClientResult<Vec<Wallpaper>> {
        let mut body = self.send(self.http.post(self.url("/api/catalog/reset")).bearer_auth(token)).await?;
        Ok(decode_catalog(body["catalog"].take()))
    }

    async fn fetch_favorites(&self, user_id: Option<&str>) -> ClientResult<Vec<FavoriteProject>> {
        let mut request = self.http.get(self.url("/api/favorites/get"));
        if let Some(user_id) = user_id {
            request = request.query(&[("userId", user_id)]);
        }
        field(self.send(request).await?, "favorites")
    }

    async fn save_favorites(&self, projects: &[FavoriteProject], user_id: Option<&str>) -> ClientResult<()> {
        let body = json!({ "favorites": projects, "userId": user_id });
        self.send(self.http.post(self.url("/api/favorites/update")).json(&body)).await?;
        Ok(())
    }

    async fn fetch_collections(&self, timeout: Duration) -> ClientResult<Vec<Collection>> {
        let request = self.http.get(self.url("/api/collections/get")).timeout(timeout);
        field(self.send(request).await?, "collections")
    }

    async fn save_collections(&self, collections: &[Collection], token: &str, timeout: Duration) -> ClientResult<()> {
        let request = self
            .http
            .post(self.url("/api/collections/update"))
            .bearer_auth(token)
            .timeout(timeout)
            .json(&json!({ "collections": collections }));
        self.send(request).await?;
        Ok(())
    }

    async fn my_orders(&self, token: &str) -> ClientResult<Vec<Order>> {
        field(self.send(self.http.get(self.url("/api/orders/get")).bearer_auth(token)).await?, "orders")
    }

    async fn list_orders(&self, token: &str) -> ClientResult<Vec<Order>> {
        field(self.send(self.http.get(self.url("/api/orders/list")).bearer_auth(token)).await?, "orders")
    }

    async fn create_order(&self, order: &NewOrder, token: &str) -> ClientResult<Order> {
        let request = self.http.post(self.url("/api/orders/create")).bearer_auth(token).json(&json!({ "order": order }));
        field(self.send(request).await?, "order")
    }

    async fn update_order(&self, id: &str, updates: &Map<String, Value>, token: &str) -> ClientResult<Order> {
        let request = self
            .http
            .post(self.url("/api/orders/update"))
            .bearer_auth(token)
            .json(&json!({ "orderId": id, "updates": updates }));
        field(self.send(request).await?, "order")
    }

    async fn delete_order(&self, id: &str, token: &str) -> ClientResult<()> {
        let request = self.http.post(self.url("/api/orders/delete")).bearer_auth(token).json(&json!({ "orderId": id }));
        self.send(request).await?;
        Ok(())
    }

    async fn send_verification_code(&self, email: &str, code: &str) -> ClientResult<()> {
        let request = self.http.post(self.url("/api/verification-send")).json(&json!({ "email": email, "code": code }));
        self.send(request).await?;
        Ok(())
    }

    async fn register(&self, registration: &Registration) -> ClientResult<Session> {
        let body = self.send(self.http.post(self.url("/api/users/register")).json(registration)).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn login(&self, credentials: &Credentials) -> ClientResult<Session> {
        let body = self.send(self.http.post(self.url("/api/users/login")).json(credentials)).await?;
        Ok(serde_json::from_value(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_drop_trailing_slash() {
        let remote = HttpRemote::new("https://shop.example.com/");
        assert_eq!(remote.url("/api/orders/get"), "https://shop.example.com/api/orders/get");
    }

    #[test]
    fn test_field_decoding() {
        let body = json!({ "success": true, "collections": [{"id": "a", "name": "A"}] });
        let list: Vec<Collection> = field(body, "collections").unwrap();
        assert_eq!(list[0].id, "a");
        assert!(field::<Vec<Collection>>(json!({ "collections": 3 }), "collections").is_err());
    }
}
