use axum::{
    extract::{rejection::JsonRejection, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::domain::{FavoriteProject, Favorites};
use crate::error::Result;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/favorites/get", get(get_favorites))
        .route("/api/favorites/update", post(update_favorites))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesQuery { pub user_id: Option<String> }

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFavoritesRequest {
    pub favorites: Vec<FavoriteProject>,
    #[serde(default)]
    pub user_id: Option<String>,
}

async fn get_favorites(State(s): State<AppState>, Query(q): Query<FavoritesQuery>) -> Result<Json<Value>> {
    let Some(repos) = &s.repos else {
        return Ok(Json(json!({ "success": true, "favorites": [], "needsConfig": true })));
    };
    let favorites = repos.favorites.get(q.user_id.as_deref()).await?;
    Ok(Json(json!({ "success": true, "favorites": favorites })))
}

async fn update_favorites(
    State(s): State<AppState>,
    payload: std::result::Result<Json<UpdateFavoritesRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let repos = s.repos()?;
    let Json(req) = payload?;
    let favorites = Favorites::new(req.favorites).into_projects();
    repos.favorites.save(req.user_id.as_deref(), &favorites).await?;
    Ok(Json(json!({ "success": true, "count": favorites.len() })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::*;
    use crate::domain::Wallpaper;
    use axum::http::StatusCode;
    use chrono::Utc;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_update_and_get_per_user() {
        let (_, state) = state();
        let mut favs = Favorites::default();
        favs.create_project("Sala", "living", Wallpaper::new("1", "A", Decimal::ONE), None, None, Utc::now());
        let body = json!({ "favorites": favs.projects(), "userId": "u1" });

        let (status, _) = call(&state, "POST", "/api/favorites/update", None, Some(body)).await;
        assert_eq!(status, StatusCode::OK);

        let (_, res) = call(&state, "GET", "/api/favorites/get?userId=u1", None, None).await;
        assert_eq!(res["favorites"][0]["name"], "Sala");
        let (_, res) = call(&state, "GET", "/api/favorites/get", None, None).await;
        assert_eq!(res["favorites"], json!([]));
    }

    #[tokio::test]
    async fn test_unconfigured() {
        let state = unconfigured();
        let (status, res) = call(&state, "GET", "/api/favorites/get", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(res["needsConfig"], true);

        let (status, _) = call(&state, "POST", "/api/favorites/update", None, Some(json!({"favorites": []}))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
