//! Favorite projects
//!
//! A project embeds full wallpaper snapshots. A project never holds zero
//! wallpapers: removing the last one deletes the project.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::wallpaper::Wallpaper;

pub const DEFAULT_PROJECT_NAME: &str = "My Favorites";
pub const DEFAULT_ROOM_TYPE: &str = "General";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteProject {
    pub id: String,
    pub name: String,
    pub room_type: String,
    pub wallpapers: Vec<Wallpaper>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub date_created: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

/// Editable project fields; `None` leaves a field as it is.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub room_type: Option<String>,
    pub user_photo: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Removal { WallpaperRemoved, ProjectDeleted, NotFound }

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Favorites { projects: Vec<FavoriteProject> }

impl Favorites {
    pub fn new(projects: Vec<FavoriteProject>) -> Self {
        // Stored data may predate the non-empty rule.
        Self { projects: projects.into_iter().filter(|p| !p.wallpapers.is_empty()).collect() }
    }

    pub fn projects(&self) -> &[FavoriteProject] { &self.projects }
    pub fn into_projects(self) -> Vec<FavoriteProject> { self.projects }
    pub fn project(&self, id: &str) -> Option<&FavoriteProject> { self.projects.iter().find(|p| p.id == id) }

    pub fn by_room(&self, room_type: &str) -> Vec<&FavoriteProject> {
        self.projects.iter().filter(|p| p.room_type == room_type).collect()
    }

    pub fn is_favorite(&self, wallpaper_id: &str) -> bool {
        self.projects.iter().any(|p| p.wallpapers.iter().any(|w| w.id == wallpaper_id))
    }

    pub fn create_project(
        &mut self,
        name: &str,
        room_type: &str,
        wallpaper: Wallpaper,
        user_photo: Option<String>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> FavoriteProject {
        let project = FavoriteProject {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            room_type: room_type.to_string(),
            wallpapers: vec![wallpaper],
            user_photo,
            notes,
            date_created: now,
            date_modified: now,
        };
        self.projects.push(project.clone());
        project
    }

    pub fn update_project(&mut self, id: &str, patch: ProjectPatch, now: DateTime<Utc>) -> bool {
        let Some(project) = self.projects.iter_mut().find(|p| p.id == id) else { return false };
        if let Some(name) = patch.name { project.name = name; }
        if let Some(room_type) = patch.room_type { project.room_type = room_type; }
        if patch.user_photo.is_some() { project.user_photo = patch.user_photo; }
        if patch.notes.is_some() { project.notes = patch.notes; }
        project.date_modified = now;
        true
    }

    /// `false` when the project is missing or already holds this wallpaper.
    pub fn add_wallpaper(&mut self, project_id: &str, wallpaper: Wallpaper, now: DateTime<Utc>) -> bool {
        let Some(project) = self.projects.iter_mut().find(|p| p.id == project_id) else { return false };
        if project.wallpapers.iter().any(|w| w.id == wallpaper.id) { return false; }
        project.wallpapers.push(wallpaper);
        project.date_modified = now;
        true
    }

    pub fn remove_wallpaper(&mut self, project_id: &str, wallpaper_id: &str, now: DateTime<Utc>) -> Removal {
        let Some(pos) = self.projects.iter().position(|p| p.id == project_id) else { return Removal::NotFound };
        let project = &mut self.projects[pos];
        let before = project.wallpapers.len();
        project.wallpapers.retain(|w| w.id != wallpaper_id);
        if project.wallpapers.len() == before { return Removal::NotFound; }
        if project.wallpapers.is_empty() {
            self.projects.remove(pos);
            return Removal::ProjectDeleted;
        }
        project.date_modified = now;
        Removal::WallpaperRemoved
    }

    pub fn remove_project(&mut self, id: &str) -> bool {
        let before = self.projects.len();
        self.projects.retain(|p| p.id != id);
        self.projects.len() != before
    }

    /// Unfavoriting removes the wallpaper from every project; favoriting adds
    /// it to the default project, creating that project when needed.
    /// Returns whether the wallpaper is now a favorite.
    pub fn toggle(&mut self, wallpaper: Wallpaper, now: DateTime<Utc>) -> bool {
        if self.is_favorite(&wallpaper.id) {
            let holding: Vec<String> = self
                .projects
                .iter()
                .filter(|p| p.wallpapers.iter().any(|w| w.id == wallpaper.id))
                .map(|p| p.id.clone())
                .collect();
            for id in holding {
                self.remove_wallpaper(&id, &wallpaper.id, now);
            }
            return false;
        }
        match self.projects.iter().find(|p| p.name == DEFAULT_PROJECT_NAME).map(|p| p.id.clone()) {
            Some(id) => { self.add_wallpaper(&id, wallpaper, now); }
            None => { self.create_project(DEFAULT_PROJECT_NAME, DEFAULT_ROOM_TYPE, wallpaper, None, None, now); }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn paper(id: &str) -> Wallpaper { Wallpaper::new(id, format!("Paper {id}"), Decimal::ONE) }

    #[test]
    fn test_removing_last_wallpaper_deletes_project() {
        let mut favs = Favorites::default();
        let p = favs.create_project("Sala", "living", paper("w1"), None, None, Utc::now());
        assert_eq!(favs.remove_wallpaper(&p.id, "w1", Utc::now()), Removal::ProjectDeleted);
        assert!(favs.project(&p.id).is_none());
        assert!(favs.projects().iter().all(|p| !p.wallpapers.is_empty()));
    }

    #[test]
    fn test_remove_one_of_two_keeps_project() {
        let mut favs = Favorites::default();
        let p = favs.create_project("Sala", "living", paper("w1"), None, None, Utc::now());
        assert!(favs.add_wallpaper(&p.id, paper("w2"), Utc::now()));
        assert!(!favs.add_wallpaper(&p.id, paper("w2"), Utc::now()));
        assert_eq!(favs.remove_wallpaper(&p.id, "w1", Utc::now()), Removal::WallpaperRemoved);
        assert_eq!(favs.project(&p.id).map(|p| p.wallpapers.len()), Some(1));
        assert_eq!(favs.remove_wallpaper(&p.id, "missing", Utc::now()), Removal::NotFound);
    }

    #[test]
    fn test_toggle_uses_default_project_and_same_policy() {
        let mut favs = Favorites::default();
        assert!(favs.toggle(paper("w1"), Utc::now()));
        assert_eq!(favs.projects()[0].name, DEFAULT_PROJECT_NAME);
        assert!(favs.toggle(paper("w2"), Utc::now()));
        assert_eq!(favs.projects().len(), 1);

        assert!(!favs.toggle(paper("w1"), Utc::now()));
        assert_eq!(favs.projects()[0].wallpapers.len(), 1);
        assert!(!favs.toggle(paper("w2"), Utc::now()));
        assert!(favs.projects().is_empty());
    }

    #[test]
    fn test_loaded_empty_projects_are_dropped() {
        let now = Utc::now();
        let empty = FavoriteProject {
            id: "p".into(), name: "x".into(), room_type: "r".into(), wallpapers: vec![],
            user_photo: None, notes: None, date_created: now, date_modified: now,
        };
        assert!(Favorites::new(vec![empty]).projects().is_empty());
    }

    #[test]
    fn test_update_project_patch() {
        let mut favs = Favorites::default();
        let p = favs.create_project("Sala", "living", paper("w1"), None, None, Utc::now());
        let patch = ProjectPatch { notes: Some("azul".into()), ..Default::default() };
        assert!(favs.update_project(&p.id, patch, Utc::now()));
        assert_eq!(favs.project(&p.id).and_then(|p| p.notes.as_deref()), Some("azul"));
        assert_eq!(favs.by_room("living").len(), 1);
        assert!(favs.remove_project(&p.id));
    }
}
