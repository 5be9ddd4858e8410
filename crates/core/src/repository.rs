//! Remote fetches mapped into domain records.

use std::{future::Future, sync::Arc};

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    error::{FetchError, FetchResult},
    models::{Game, GameSuggestion},
    normalizer,
    remote::GameApi,
};

/// Id of the game shown in the home screen hero slot.
pub const FEATURED_GAME_ID: u64 = 1_273_796;
/// Id whose similar games fill the second home category.
pub const SIMILAR_BASE_ID: u64 = 33_313;
/// Query behind the first home category.
pub const MEDIEVAL_QUERY: &str = "medieval strategy games";
/// Query used for suggestions shown before the user types.
pub const DEFAULT_SUGGESTION_QUERY: &str = "kingdom co";

/// Issues one API call per operation and normalizes the response.
///
/// Every operation races the call against `cancel`. A cancelled call yields
/// [`FetchError::Cancelled`], which callers must treat as silent.
#[derive(Clone)]
pub struct GameRepository {
    api: Arc<dyn GameApi>,
}

impl GameRepository {
    /// Wrap an API client.
    pub fn new(api: Arc<dyn GameApi>) -> Self {
        Self { api }
    }

    /// Hero game for the home screen.
    pub async fn fetch_featured_game(&self, cancel: &CancellationToken) -> FetchResult<Option<Game>> {
        self.request(cancel, "featured", self.api.get_game_detail(FEATURED_GAME_ID), |json| {
            normalizer::to_game(Some(json))
        })
        .await
    }

    /// First home category.
    pub async fn fetch_medieval_strategy_games(
        &self,
        cancel: &CancellationToken,
    ) -> FetchResult<Vec<Game>> {
        self.request(cancel, "medieval", self.api.get_games(MEDIEVAL_QUERY), |json| {
            normalizer::to_games(Some(json))
        })
        .await
    }

    /// Second home category.
    pub async fn fetch_similar_stronghold_games(
        &self,
        cancel: &CancellationToken,
    ) -> FetchResult<Vec<Game>> {
        self.request(cancel, "similar", self.api.get_similar_games(SIMILAR_BASE_ID), |json| {
            normalizer::to_games(Some(json))
        })
        .await
    }

    /// Suggestions shown while the search box is empty.
    pub async fn fetch_default_suggestions(
        &self,
        cancel: &CancellationToken,
    ) -> FetchResult<Vec<GameSuggestion>> {
        self.request(
            cancel,
            "default_suggestions",
            self.api.get_suggestions(DEFAULT_SUGGESTION_QUERY),
            |json| normalizer::to_suggestions(Some(json)),
        )
        .await
    }

    /// Free-text search.
    pub async fn search_games(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> FetchResult<Vec<Game>> {
        self.request(cancel, "search", self.api.get_games(query), |json| {
            normalizer::to_games(Some(json))
        })
        .await
    }

    /// Autocomplete suggestions for a partial query.
    pub async fn fetch_suggestions(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> FetchResult<Vec<GameSuggestion>> {
        self.request(cancel, "suggestions", self.api.get_suggestions(query), |json| {
            normalizer::to_suggestions(Some(json))
        })
        .await
    }

    /// Detail for a game id. `Ok(None)` means the id is unknown upstream.
    ///
    /// List endpoints hand out string ids but the detail endpoint only takes
    /// numbers, so anything non-numeric fails locally without a request.
    pub async fn fetch_game_detail(
        &self,
        game_id: &str,
        cancel: &CancellationToken,
    ) -> FetchResult<Option<Game>> {
        let numeric_id: u64 = game_id
            .parse()
            .map_err(|_| FetchError::InvalidGameId(game_id.to_string()))?;
        self.request(cancel, "detail", self.api.get_game_detail(numeric_id), |json| {
            normalizer::to_game(Some(json))
        })
        .await
    }

    async fn request<T>(
        &self,
        cancel: &CancellationToken,
        operation: &'static str,
        call: impl Future<Output = FetchResult<Value>>,
        map: impl FnOnce(&Value) -> T,
    ) -> FetchResult<T> {
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(operation, "Request cancelled");
                return Err(FetchError::Cancelled);
            }
            response = call => response,
        };

        match response {
            Ok(json) => Ok(map(&json)),
            Err(err) => {
                debug!(operation, %err, "Request failed");
                Err(err)
            }
        }
    }
}
