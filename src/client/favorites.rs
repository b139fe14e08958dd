//! Favorite projects store.
//!
//! Every mutation computes the new project list, mirrors it locally and then
//! pushes the whole list to the API when a user is signed in. The push is
//! best effort; the mirror is what survives a restart.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::local::{self, LocalCache};
use super::remote::Remote;
use super::{shared, Shared, StoreState};
use crate::domain::favorites::{DEFAULT_PROJECT_NAME, DEFAULT_ROOM_TYPE};
use crate::domain::{FavoriteProject, Favorites, ProjectPatch, Removal, Wallpaper};

#[derive(Clone)]
pub struct FavoritesStore {
    remote: Option<Arc<dyn Remote>>,
    cache: LocalCache,
    user_id: Arc<RwLock<Option<String>>>,
    state: Shared<Favorites>,
}

impl FavoritesStore {
    pub fn new(remote: Option<Arc<dyn Remote>>, cache: LocalCache) -> Self {
        Self { remote, cache, user_id: Arc::new(RwLock::new(None)), state: shared(Favorites::default()) }
    }

    /// Signed-in user whose favorites are synced; `None` keeps them local.
    pub async fn set_user(&self, user_id: Option<String>) {
        *self.user_id.write().await = user_id;
    }

    pub async fn snapshot(&self) -> StoreState<Favorites> {
        self.state.read().await.clone()
    }

    pub async fn projects(&self) -> Vec<FavoriteProject> {
        self.state.read().await.data.projects().to_vec()
    }

    pub async fn project(&self, id: &str) -> Option<FavoriteProject> {
        self.state.read().await.data.project(id).cloned()
    }

    pub async fn projects_by_room(&self, room_type: &str) -> Vec<FavoriteProject> {
        self.state.read().await.data.by_room(room_type).into_iter().cloned().collect()
    }

    pub async fn is_favorite(&self, wallpaper_id: &str) -> bool {
        self.state.read().await.data.is_favorite(wallpaper_id)
    }

    /// Remote, then the local mirror, then nothing.
    pub async fn load(&self) {
        self.state.write().await.begin();
        let user_id = self.user_id.read().await.clone();
        if let Some(remote) = &self.remote {
            match remote.fetch_favorites(user_id.as_deref()).await {
                Ok(projects) => {
                    let favorites = Favorites::new(projects);
                    self.cache.mirror(local::FAVORITES, &favorites).await;
                    self.state.write().await.settle(favorites);
                    return;
                }
                Err(e) => warn!(error = %e, "favorites fetch failed; using local mirror"),
            }
        }
        let projects: Vec<FavoriteProject> = self.cache.restore(local::FAVORITES).await.unwrap_or_default();
        self.state.write().await.settle(Favorites::new(projects));
    }

    /// Applies `change` to a copy of the current list and, when it reports a
    /// change, commits the copy.
    async fn mutate<R>(&self, change: impl FnOnce(&mut Favorites) -> (R, bool)) -> R {
        let (result, favorites) = {
            let mut state = self.state.write().await;
            let mut favorites = state.data.clone();
            let (result, changed) = change(&mut favorites);
            if !changed {
                return result;
            }
            state.data = favorites.clone();
            (result, favorites)
        };
        self.cache.mirror(local::FAVORITES, &favorites).await;
        self.sync(&favorites).await;
        result
    }

    async fn sync(&self, favorites: &Favorites) {
        let Some(remote) = &self.remote else { return };
        let Some(user_id) = self.user_id.read().await.clone() else {
            debug!("no signed-in user; favorites kept local");
            return;
        };
        if let Err(e) = remote.save_favorites(favorites.projects(), Some(&user_id)).await {
            warn!(user_id = %user_id, error = %e, "favorites sync failed");
        }
    }

    pub async fn add_to_favorites(
        &self,
        name: &str,
        room_type: &str,
        wallpaper: Wallpaper,
        user_photo: Option<String>,
        notes: Option<String>,
    ) -> FavoriteProject {
        self.mutate(|f| (f.create_project(name, room_type, wallpaper, user_photo, notes, Utc::now()), true)).await
    }

    pub async fn update_project(&self, id: &str, patch: ProjectPatch) -> bool {
        self.mutate(|f| {
            let changed = f.update_project(id, patch, Utc::now());
            (changed, changed)
        })
        .await
    }

    /// `false` when the project is missing or already holds the wallpaper.
    pub async fn add_wallpaper_to_project(&self, project_id: &str, wallpaper: Wallpaper) -> bool {
        self.mutate(|f| {
            let added = f.add_wallpaper(project_id, wallpaper, Utc::now());
            (added, added)
        })
        .await
    }

    /// Removing a project's last wallpaper deletes the project.
    pub async fn remove_wallpaper_from_project(&self, project_id: &str, wallpaper_id: &str) -> Removal {
        self.mutate(|f| {
            let removal = f.remove_wallpaper(project_id, wallpaper_id, Utc::now());
            (removal, removal != Removal::NotFound)
        })
        .await
    }

    pub async fn remove_project(&self, id: &str) -> bool {
        self.mutate(|f| {
            let removed = f.remove_project(id);
            (removed, removed)
        })
        .await
    }

    /// Returns whether the wallpaper is a favorite afterwards. New favorites
    /// go to the default project.
    pub async fn toggle_favorite(&self, wallpaper: Wallpaper) -> bool {
        debug!(project = DEFAULT_PROJECT_NAME, room = DEFAULT_ROOM_TYPE, wallpaper_id = %wallpaper.id, "toggle favorite");
        self.mutate(|f| (f.toggle(wallpaper, Utc::now()), true)).await
    }
}
