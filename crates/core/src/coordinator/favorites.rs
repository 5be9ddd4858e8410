//! Favorites list screen.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::{publish_unless_cancelled, task::TaskSlot};
use crate::{favorites::FavoritesStore, models::FavoriteGame};

/// Everything the favorites screen renders.
#[derive(Debug, Clone, PartialEq)]
pub struct FavoritesViewState {
    /// Most recently saved first.
    pub favorites: Vec<FavoriteGame>,
    /// True until the store emits for the first time.
    pub is_loading: bool,
}

impl Default for FavoritesViewState {
    fn default() -> Self {
        Self {
            favorites: Vec::new(),
            is_loading: true,
        }
    }
}

/// Mirrors the favorites store and forwards deletions to it.
pub struct FavoritesCoordinator {
    store: Arc<dyn FavoritesStore>,
    state: Arc<watch::Sender<FavoritesViewState>>,
    lifetime: CancellationToken,
    observe_task: TaskSlot,
}

impl FavoritesCoordinator {
    /// Create the coordinator and start following the store.
    pub fn new(store: Arc<dyn FavoritesStore>) -> Self {
        let (state, _) = watch::channel(FavoritesViewState::default());
        let coordinator = Self {
            store,
            state: Arc::new(state),
            lifetime: CancellationToken::new(),
            observe_task: TaskSlot::default(),
        };
        coordinator.observe_favorites();
        coordinator
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> FavoritesViewState {
        self.state.borrow().clone()
    }

    /// Follow state changes.
    pub fn subscribe(&self) -> watch::Receiver<FavoritesViewState> {
        self.state.subscribe()
    }

    /// Remove one favorite.
    pub fn delete_favorite(&self, game_id: &str) {
        let store = self.store.clone();
        let game_id = game_id.to_string();
        self.spawn_write(async move {
            if let Err(err) = store.remove(&game_id).await {
                warn!(%game_id, ?err, "Failed to delete favorite");
            }
        });
    }

    /// Remove every favorite.
    pub fn clear_favorites(&self) {
        let store = self.store.clone();
        self.spawn_write(async move {
            if let Err(err) = store.clear_all().await {
                warn!(?err, "Failed to clear favorites");
            }
        });
    }

    fn spawn_write(&self, write: impl std::future::Future<Output = ()> + Send + 'static) {
        let lifetime = self.lifetime.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = lifetime.cancelled() => {}
                _ = write => {}
            }
        });
    }

    fn observe_favorites(&self) {
        let store = self.store.clone();
        let state = self.state.clone();
        self.observe_task.replace(|cancel| async move {
            let mut receiver = store.observe_all();
            loop {
                let favorites = receiver.borrow_and_update().clone();
                if !publish_unless_cancelled(&state, &cancel, |current| {
                    current.favorites = favorites;
                    current.is_loading = false;
                }) {
                    break;
                }
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = receiver.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        });
    }
}

impl Drop for FavoritesCoordinator {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}
