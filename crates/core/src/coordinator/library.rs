//! Home feed, search and suggestions.

use std::{collections::HashSet, sync::Arc};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{publish_unless_cancelled, task::TaskSlot};
use crate::{
    favorites::FavoritesStore,
    models::{Game, GameCategory, GameSuggestion},
    repository::GameRepository,
};

/// Queries shorter than this never hit the suggestion endpoint.
pub const MIN_SUGGESTION_QUERY_LEN: usize = 3;
/// Heading of the first home category.
pub const MEDIEVAL_CATEGORY_TITLE: &str = "Medieval strategy";
/// Heading of the second home category.
pub const SIMILAR_CATEGORY_TITLE: &str = "Similar to Stronghold";

/// Everything the library screen renders.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryViewState {
    /// Hero game of the home screen.
    pub featured_game: Option<Game>,
    /// First home category.
    pub medieval_strategy_games: Vec<Game>,
    /// Second home category.
    pub similar_games: Vec<Game>,
    /// Suggestions offered while the query is blank.
    pub default_suggestions: Vec<GameSuggestion>,
    /// Suggestions currently shown.
    pub suggestions: Vec<GameSuggestion>,
    /// Results of the latest search.
    pub search_results: Vec<Game>,
    /// Text in the search box, untrimmed.
    pub search_query: String,
    /// Home feed request in flight.
    pub is_home_loading: bool,
    /// Search request in flight.
    pub is_searching: bool,
    /// Suggestion request in flight.
    pub is_suggestions_loading: bool,
    /// First failure of the last home refresh.
    pub home_error: Option<String>,
    /// Failure of the last search or suggestion request.
    pub search_error: Option<String>,
    /// Mirror of the favorites store, updated when the store emits.
    pub favorite_ids: HashSet<String>,
}

impl Default for LibraryViewState {
    fn default() -> Self {
        Self {
            featured_game: None,
            medieval_strategy_games: Vec::new(),
            similar_games: Vec::new(),
            default_suggestions: Vec::new(),
            suggestions: Vec::new(),
            search_results: Vec::new(),
            search_query: String::new(),
            is_home_loading: true,
            is_searching: false,
            is_suggestions_loading: false,
            home_error: None,
            search_error: None,
            favorite_ids: HashSet::new(),
        }
    }
}

impl LibraryViewState {
    /// Home categories in display order.
    pub fn categories(&self) -> Vec<GameCategory> {
        vec![
            GameCategory::new(MEDIEVAL_CATEGORY_TITLE, self.medieval_strategy_games.clone()),
            GameCategory::new(SIMILAR_CATEGORY_TITLE, self.similar_games.clone()),
        ]
    }

    /// Whether `game_id` is currently a favorite.
    pub fn is_favorite(&self, game_id: &str) -> bool {
        self.favorite_ids.contains(game_id)
    }
}

struct Shared {
    repository: GameRepository,
    favorites: Arc<dyn FavoritesStore>,
    state: watch::Sender<LibraryViewState>,
}

/// Drives the library screen.
///
/// Search and suggestion requests each run in their own slot: issuing a new
/// one cancels the previous, and a cancelled request never touches state.
pub struct LibraryCoordinator {
    shared: Arc<Shared>,
    lifetime: CancellationToken,
    refresh_task: TaskSlot,
    search_task: TaskSlot,
    suggestion_task: TaskSlot,
    favorites_task: TaskSlot,
}

impl LibraryCoordinator {
    /// Create the coordinator, start mirroring favorites and load the home feed.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(repository: GameRepository, favorites: Arc<dyn FavoritesStore>) -> Self {
        let (state, _) = watch::channel(LibraryViewState::default());
        let coordinator = Self {
            shared: Arc::new(Shared {
                repository,
                favorites,
                state,
            }),
            lifetime: CancellationToken::new(),
            refresh_task: TaskSlot::default(),
            search_task: TaskSlot::default(),
            suggestion_task: TaskSlot::default(),
            favorites_task: TaskSlot::default(),
        };
        coordinator.observe_favorites();
        coordinator.refresh();
        coordinator
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> LibraryViewState {
        self.shared.state.borrow().clone()
    }

    /// Follow state changes.
    pub fn subscribe(&self) -> watch::Receiver<LibraryViewState> {
        self.shared.state.subscribe()
    }

    /// Reload the featured game, both home categories and default suggestions.
    ///
    /// The four requests run concurrently. `home_error` reports the first
    /// failure among featured, medieval and similar, in that order; a failed
    /// default-suggestion request only leaves the list empty.
    pub fn refresh(&self) {
        self.shared.state.send_modify(|state| {
            state.is_home_loading = true;
            state.home_error = None;
        });

        let shared = self.shared.clone();
        self.refresh_task.replace(|cancel| async move {
            let repository = &shared.repository;
            let (featured, medieval, similar, defaults) = tokio::join!(
                repository.fetch_featured_game(&cancel),
                repository.fetch_medieval_strategy_games(&cancel),
                repository.fetch_similar_stronghold_games(&cancel),
                repository.fetch_default_suggestions(&cancel),
            );
            if cancel.is_cancelled() {
                return;
            }

            let home_error = [featured.as_ref().err(), medieval.as_ref().err(), similar.as_ref().err()]
                .into_iter()
                .flatten()
                .next()
                .map(ToString::to_string);
            if let Some(message) = &home_error {
                warn!(error = %message, "Home feed partially failed");
            }
            if let Err(err) = &defaults {
                warn!(%err, "Default suggestions unavailable");
            }

            let featured = featured.ok().flatten();
            let medieval = medieval.unwrap_or_default();
            let similar = similar.unwrap_or_default();
            let defaults = defaults.unwrap_or_default();
            info!(
                featured = featured.as_ref().map(|game| game.title.as_str()).unwrap_or("none"),
                medieval = medieval.len(),
                similar = similar.len(),
                suggestions = defaults.len(),
                "Home feed refreshed"
            );

            publish_unless_cancelled(&shared.state, &cancel, move |state| {
                if state.search_query.trim().is_empty() {
                    state.suggestions = defaults.clone();
                }
                state.featured_game = featured;
                state.medieval_strategy_games = medieval;
                state.similar_games = similar;
                state.default_suggestions = defaults;
                state.is_home_loading = false;
                state.home_error = home_error;
            });
        });
    }

    /// Update the query text and refresh suggestions for it.
    pub fn on_search_query_change(&self, query: &str) {
        let query = query.to_string();
        self.suggestion_task.cancel();

        if query.chars().count() < MIN_SUGGESTION_QUERY_LEN {
            self.shared.state.send_modify(|state| {
                state.suggestions = if query.trim().is_empty() {
                    state.default_suggestions.clone()
                } else {
                    Vec::new()
                };
                state.search_query = query;
                state.is_suggestions_loading = false;
            });
            return;
        }

        self.shared.state.send_modify(|state| {
            state.search_query = query.clone();
            state.is_suggestions_loading = true;
        });

        let shared = self.shared.clone();
        self.suggestion_task.replace(|cancel| async move {
            debug!(%query, "Fetching suggestions");
            match shared.repository.fetch_suggestions(&query, &cancel).await {
                Ok(suggestions) => {
                    publish_unless_cancelled(&shared.state, &cancel, |state| {
                        state.suggestions = suggestions;
                        state.is_suggestions_loading = false;
                    });
                }
                Err(err) if err.is_cancelled() => {}
                Err(err) => {
                    warn!(%query, %err, "Suggestion request failed");
                    publish_unless_cancelled(&shared.state, &cancel, |state| {
                        state.suggestions = Vec::new();
                        state.is_suggestions_loading = false;
                        state.search_error = Some(err.to_string());
                    });
                }
            }
        });
    }

    /// Search for the current query text.
    pub fn submit_search(&self) {
        let query = self.shared.state.borrow().search_query.clone();
        self.submit_search_with(&query);
    }

    /// Search for `query`. Blank queries are ignored.
    pub fn submit_search_with(&self, query: &str) {
        let query = query.trim().to_string();
        if query.is_empty() {
            return;
        }

        self.search_task.cancel();
        self.shared.state.send_modify(|state| {
            state.is_searching = true;
            state.search_error = None;
        });

        let shared = self.shared.clone();
        self.search_task.replace(|cancel| async move {
            info!(%query, "Searching");
            match shared.repository.search_games(&query, &cancel).await {
                Ok(games) => {
                    publish_unless_cancelled(&shared.state, &cancel, |state| {
                        state.search_results = games;
                        state.is_searching = false;
                    });
                }
                Err(err) if err.is_cancelled() => {}
                Err(err) => {
                    warn!(%query, %err, "Search failed");
                    publish_unless_cancelled(&shared.state, &cancel, |state| {
                        state.search_results = Vec::new();
                        state.is_searching = false;
                        state.search_error = Some(err.to_string());
                    });
                }
            }
        });
    }

    /// Fill the query with the suggestion's title and search for it.
    pub fn on_suggestion_selected(&self, suggestion: &GameSuggestion) {
        self.shared
            .state
            .send_modify(|state| state.search_query = suggestion.title.clone());
        self.submit_search_with(&suggestion.title);
    }

    /// Drop search results and errors, leaving the query text alone.
    pub fn clear_search_results(&self) {
        self.search_task.cancel();
        self.shared.state.send_modify(|state| {
            state.search_results = Vec::new();
            state.search_error = None;
            state.is_searching = false;
        });
    }

    /// Save or remove `game` depending on the mirrored favorite ids.
    ///
    /// `favorite_ids` only changes once the store emits.
    pub fn toggle_favorite(&self, game: &Game) {
        let is_favorite = self.shared.state.borrow().is_favorite(&game.id);
        let favorites = self.shared.favorites.clone();
        let lifetime = self.lifetime.clone();
        let game = game.clone();
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

    fn observe_favorites(&self) {
        let shared = self.shared.clone();
        self.favorites_task.replace(|cancel| async move {
            let mut receiver = shared.favorites.observe_all();
            loop {
                let ids: HashSet<String> = receiver
                    .borrow_and_update()
                    .iter()
                    .map(|favorite| favorite.game.id.clone())
                    .collect();
                if !publish_unless_cancelled(&shared.state, &cancel, |state| {
                    state.favorite_ids = ids;
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

impl Drop for LibraryCoordinator {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}
