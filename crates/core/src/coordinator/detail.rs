//! Single-game detail screen.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{publish_unless_cancelled, task::TaskSlot};
use crate::{favorites::FavoritesStore, models::Game, repository::GameRepository};

/// Shown when the screen was opened without an id.
pub const MISSING_ID_MESSAGE: &str = "Missing game id";
/// Shown when the API has no record for the id.
pub const NOT_FOUND_MESSAGE: &str = "Game details not available";
/// Shown when a failure carries no message of its own.
pub const LOAD_FAILED_MESSAGE: &str = "Unable to load game details";

/// Where the detail screen is in its load cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailPhase {
    /// Request in flight.
    Loading,
    /// A game is available.
    Loaded,
    /// The last load failed.
    Error,
}

/// Everything the detail screen renders.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailViewState {
    /// Request in flight.
    pub is_loading: bool,
    /// Last successfully loaded game. Kept while retrying.
    pub game: Option<Game>,
    /// Message of the last failed load.
    pub error_message: Option<String>,
    /// Mirror of the favorites store for this id.
    pub is_favorite: bool,
    /// Screenshot currently shown full-screen.
    pub expanded_screenshot_url: Option<String>,
}

impl Default for DetailViewState {
    fn default() -> Self {
        Self {
            is_loading: true,
            game: None,
            error_message: None,
            is_favorite: false,
            expanded_screenshot_url: None,
        }
    }
}

impl DetailViewState {
    /// Current phase derived from the loading flag and error.
    pub fn phase(&self) -> DetailPhase {
        if self.is_loading {
            DetailPhase::Loading
        } else if self.error_message.is_some() {
            DetailPhase::Error
        } else {
            DetailPhase::Loaded
        }
    }
}

struct Shared {
    game_id: String,
    repository: GameRepository,
    favorites: Arc<dyn FavoritesStore>,
    state: watch::Sender<DetailViewState>,
}

/// Drives the detail screen for one game id.
pub struct DetailCoordinator {
    shared: Arc<Shared>,
    lifetime: CancellationToken,
    load_task: TaskSlot,
    favorite_task: TaskSlot,
}

impl DetailCoordinator {
    /// Create the coordinator for `game_id`, start the favorite subscription
    /// and the first load.
    ///
    /// A blank id goes straight to the error state without any request.
    pub fn new(
        game_id: impl Into<String>,
        repository: GameRepository,
        favorites: Arc<dyn FavoritesStore>,
    ) -> Self {
        let (state, _) = watch::channel(DetailViewState::default());
        let coordinator = Self {
            shared: Arc::new(Shared {
                game_id: game_id.into(),
                repository,
                favorites,
                state,
            }),
            lifetime: CancellationToken::new(),
            load_task: TaskSlot::default(),
            favorite_task: TaskSlot::default(),
        };
        coordinator.observe_favorite();
        coordinator.load_details();
        coordinator
    }

    /// Id this screen was opened for.
    pub fn game_id(&self) -> &str {
        &self.shared.game_id
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> DetailViewState {
        self.shared.state.borrow().clone()
    }

    /// Follow state changes.
    pub fn subscribe(&self) -> watch::Receiver<DetailViewState> {
        self.shared.state.subscribe()
    }

    /// Load the details again.
    pub fn retry(&self) {
        self.load_details();
    }

    /// Save or remove the loaded game. Does nothing until a game is loaded.
    pub fn toggle_favorite(&self) {
        let (game, is_favorite) = {
            let state = self.shared.state.borrow();
            match &state.game {
                Some(game) => (game.clone(), state.is_favorite),
                None => return,
            }
        };
        let favorites = self.shared.favorites.clone();
        let lifetime = self.lifetime.clone();
        tokio::spawn(async move {
            let write = async {
                if is_favorite {
                    favorites.remove(&game.id).await
                } else {
                    favorites.save(&game).await
                }
            };
            tokio::select! {
                _ = lifetime.cancelled() => {}
                result = write => {
                    if let Err(err) = result {
                        warn!(game_id = %game.id, ?err, "Favorite update failed");
                    }
                }
            }
        });
    }

    /// Show a screenshot full-screen.
    pub fn on_screenshot_selected(&self, url: &str) {
        let url = url.to_string();
        self.shared
            .state
            .send_modify(|state| state.expanded_screenshot_url = Some(url));
    }

    /// Close the full-screen screenshot.
    pub fn dismiss_screenshot_preview(&self) {
        self.shared
            .state
            .send_modify(|state| state.expanded_screenshot_url = None);
    }

    fn observe_favorite(&self) {
        if self.shared.game_id.trim().is_empty() {
            return;
        }
        let shared = self.shared.clone();
        self.favorite_task.replace(|cancel| async move {
            let mut status = shared.favorites.observe_one(&shared.game_id);
            let mut is_favorite = status.current();
            loop {
                if !publish_unless_cancelled(&shared.state, &cancel, |state| {
                    state.is_favorite = is_favorite;
                }) {
                    break;
                }
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    next = status.changed() => match next {
                        Some(flag) => is_favorite = flag,
                        None => break,
                    },
                }
            }
        });
    }

    fn load_details(&self) {
        if self.shared.game_id.trim().is_empty() {
            self.load_task.cancel();
            self.shared.state.send_modify(|state| {
                state.is_loading = false;
                state.error_message = Some(MISSING_ID_MESSAGE.to_string());
                state.expanded_screenshot_url = None;
            });
            return;
        }

        self.load_task.cancel();
        self.shared.state.send_modify(|state| {
            state.is_loading = true;
            state.error_message = None;
        });

        let shared = self.shared.clone();
        self.load_task.replace(|cancel| async move {
            let outcome = shared
                .repository
                .fetch_game_detail(&shared.game_id, &cancel)
                .await;
            match outcome {
                Err(err) if err.is_cancelled() => {}
                Ok(Some(game)) => {
                    info!(game_id = %shared.game_id, title = %game.title, "Game details loaded");
                    publish_unless_cancelled(&shared.state, &cancel, |state| {
                        state.is_loading = false;
                        state.game = Some(game);
                        state.expanded_screenshot_url = None;
                    });
                }
                Ok(None) => {
                    warn!(game_id = %shared.game_id, "Game not found");
                    publish_unless_cancelled(&shared.state, &cancel, |state| {
                        state.is_loading = false;
                        state.error_message = Some(NOT_FOUND_MESSAGE.to_string());
                        state.expanded_screenshot_url = None;
                    });
                }
                Err(err) => {
                    warn!(game_id = %shared.game_id, %err, "Game details failed");
                    let message = err.to_string();
                    let message = if message.trim().is_empty() {
                        LOAD_FAILED_MESSAGE.to_string()
                    } else {
                        message
                    };
                    publish_unless_cancelled(&shared.state, &cancel, |state| {
                        state.is_loading = false;
                        state.error_message = Some(message);
                        state.expanded_screenshot_url = None;
                    });
                }
            }
        });
    }
}

impl Drop for DetailCoordinator {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        favorites::JsonFavoritesStore,
        testing::{sample_game, wait_for, CountingStore, FakeApi},
    };
    use serde_json::json;

    fn detail(api: &Arc<FakeApi>, id: &str, store: Arc<dyn FavoritesStore>) -> DetailCoordinator {
        DetailCoordinator::new(id, GameRepository::new(api.clone()), store)
    }

    #[tokio::test]
    async fn blank_id_fails_without_request() {
        let api = Arc::new(FakeApi::default());
        let screen = detail(&api, "  ", Arc::new(JsonFavoritesStore::in_memory()));

        let state = screen.state();
        assert_eq!(state.phase(), DetailPhase::Error);
        assert_eq!(state.error_message.as_deref(), Some(MISSING_ID_MESSAGE));

        screen.retry();
        tokio::task::yield_now().await;
        assert_eq!(api.detail_calls(), 0);
    }

    #[tokio::test]
    async fn loads_game_and_clears_overlay() {
        let api = Arc::new(FakeApi::default());
        api.set_detail(json!({"data": {"id": 12345, "name": "Stronghold", "screenshots": ["https://x/1.jpg"]}}));
        let screen = detail(&api, "12345", Arc::new(JsonFavoritesStore::in_memory()));
        let mut rx = screen.subscribe();

        let state = wait_for(&mut rx, |state| state.phase() != DetailPhase::Loading).await;
        assert_eq!(state.phase(), DetailPhase::Loaded);
        assert_eq!(state.game.map(|game| game.title), Some("Stronghold".to_string()));

        screen.on_screenshot_selected("https://x/1.jpg");
        assert_eq!(
            screen.state().expanded_screenshot_url.as_deref(),
            Some("https://x/1.jpg")
        );
        screen.dismiss_screenshot_preview();
        assert_eq!(screen.state().expanded_screenshot_url, None);
        assert_eq!(api.detail_calls(), 1);
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let api = Arc::new(FakeApi::default());
        api.set_detail(json!({"game": []}));
        let screen = detail(&api, "99", Arc::new(JsonFavoritesStore::in_memory()));
        let mut rx = screen.subscribe();

        let state = wait_for(&mut rx, |state| !state.is_loading).await;
        assert_eq!(state.error_message.as_deref(), Some(NOT_FOUND_MESSAGE));
    }

    #[tokio::test]
    async fn failures_surface_and_retry_recovers() {
        let api = Arc::new(FakeApi::default());
        api.fail_detail("gateway timeout");
        let screen = detail(&api, "7", Arc::new(JsonFavoritesStore::in_memory()));
        let mut rx = screen.subscribe();

        let state = wait_for(&mut rx, |state| !state.is_loading).await;
        assert!(state
            .error_message
            .as_deref()
            .is_some_and(|message| message.contains("gateway timeout")));

        api.set_detail(json!({"id": 7, "title": "Recovered"}));
        screen.retry();
        assert!(screen.state().is_loading);
        let state = wait_for(&mut rx, |state| !state.is_loading).await;
        assert_eq!(state.phase(), DetailPhase::Loaded);
        assert_eq!(api.detail_calls(), 2);
    }

    #[tokio::test]
    async fn non_numeric_id_reports_invalid_id() {
        let api = Arc::new(FakeApi::default());
        let screen = detail(&api, "abc", Arc::new(JsonFavoritesStore::in_memory()));
        let mut rx = screen.subscribe();

        let state = wait_for(&mut rx, |state| !state.is_loading).await;
        assert!(state.error_message.is_some());
        assert_eq!(api.detail_calls(), 0);
    }

    #[tokio::test]
    async fn favorite_flag_follows_store() {
        let api = Arc::new(FakeApi::default());
        api.set_detail(json!({"id": 42, "name": "Knights"}));
        let store = Arc::new(CountingStore::default());
        let screen = detail(&api, "42", store.clone());
        let mut rx = screen.subscribe();

        screen.toggle_favorite();
        wait_for(&mut rx, |state| state.game.is_some()).await;
        assert_eq!(store.saves(), 0);

        screen.toggle_favorite();
        wait_for(&mut rx, |state| state.is_favorite).await;
        assert_eq!(store.saves(), 1);

        store.remove("42").await.expect("remove");
        wait_for(&mut rx, |state| !state.is_favorite).await;

        store.save(&sample_game("42")).await.expect("save");
        let state = wait_for(&mut rx, |state| state.is_favorite).await;
        assert_eq!(state.game.map(|game| game.id), Some("42".to_string()));
        assert_eq!(api.detail_calls(), 1);
    }
}
