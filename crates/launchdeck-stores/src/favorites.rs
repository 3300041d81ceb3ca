//! Favorite games, persisted inside the settings blob.
//!
//! The backend exposes the settings document as a whole, so every mutation
//! here is a read-merge-write: fetch the current document, replace only the
//! `favoriteGames` list, and save the merged result back. Unknown settings
//! keys ride along untouched through the document's catch-all map.

use std::sync::Arc;

use launchdeck_core::backend::Backend;
use launchdeck_core::error::Result;
use launchdeck_core::settings::FavoriteGame;
use launchdeck_core::store::{Derived, Store};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavoritesState {
    pub favorites: Vec<FavoriteGame>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Manages the favorite-games list within application settings.
pub struct FavoritesService {
    backend: Arc<dyn Backend>,
    state: Store<FavoritesState>,
}

impl FavoritesService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            state: Store::new(FavoritesState::default()),
        }
    }

    pub fn state(&self) -> &Store<FavoritesState> {
        &self.state
    }

    /// Loads favorites from the persisted settings document.
    pub async fn load(&self) -> Result<()> {
        self.state.update(|s| {
            s.loading = true;
            s.error = None;
        });

        match self.backend.settings().await {
            Ok(settings) => {
                tracing::debug!(
                    "[Favorites] Loaded {} favorite games",
                    settings.favorite_games.len()
                );
                self.state.update(|s| {
                    s.favorites = settings.favorite_games;
                    s.loading = false;
                });
                Ok(())
            }
            Err(err) => {
                tracing::warn!("[Favorites] Load failed: {}", err);
                self.state.update(|s| {
                    s.loading = false;
                    s.error = Some(err.to_string());
                });
                Err(err)
            }
        }
    }

    /// Adds a game to the favorites list. Adding a game id that is already
    /// present replaces the old entry.
    pub async fn add(
        &self,
        game_id: u64,
        name: impl Into<String>,
        thumbnail: Option<String>,
    ) -> Result<FavoriteGame> {
        let favorite = FavoriteGame {
            id: uuid::Uuid::new_v4().to_string(),
            game_id,
            name: name.into(),
            thumbnail,
            added_at: chrono::Utc::now().timestamp_millis(),
        };

        let mut next = self.state.read().favorites;
        next.retain(|f| f.game_id != game_id);
        next.push(favorite.clone());

        self.persist(next).await?;
        Ok(favorite)
    }

    /// Removes a game from the favorites list by game id.
    pub async fn remove(&self, game_id: u64) -> Result<()> {
        let mut next = self.state.read().favorites;
        next.retain(|f| f.game_id != game_id);
        self.persist(next).await
    }

    /// Adds the game if absent, removes it if present. Returns whether the
    /// game is a favorite afterwards.
    pub async fn toggle(
        &self,
        game_id: u64,
        name: impl Into<String>,
        thumbnail: Option<String>,
    ) -> Result<bool> {
        if self.is_favorite(game_id) {
            self.remove(game_id).await?;
            Ok(false)
        } else {
            self.add(game_id, name, thumbnail).await?;
            Ok(true)
        }
    }

    pub fn is_favorite(&self, game_id: u64) -> bool {
        self.state
            .read()
            .favorites
            .iter()
            .any(|f| f.game_id == game_id)
    }

    pub fn clear_error(&self) {
        self.state.update(|s| s.error = None);
    }

    /// Count of favorited games as an observable projection.
    pub fn count(&self) -> Derived<usize> {
        self.state.derive(|s| s.favorites.len())
    }

    /// Pessimistic write: local state changes only after the merged settings
    /// document is saved.
    async fn persist(&self, favorites: Vec<FavoriteGame>) -> Result<()> {
        self.state.update(|s| s.error = None);

        let mut settings = match self.backend.settings().await {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!("[Favorites] Settings read failed: {}", err);
                self.state.update(|s| s.error = Some(err.to_string()));
                return Err(err);
            }
        };
        settings.favorite_games = favorites.clone();

        match self.backend.save_settings(&settings).await {
            Ok(()) => {
                self.state.update(|s| s.favorites = favorites);
                Ok(())
            }
            Err(err) => {
                tracing::warn!("[Favorites] Settings write failed: {}", err);
                self.state.update(|s| s.error = Some(err.to_string()));
                Err(err)
            }
        }
    }
}
