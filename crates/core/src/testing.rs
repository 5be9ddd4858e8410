//! Test doubles shared by unit tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::{watch, Notify};

use crate::{
    error::{FetchError, FetchResult},
    favorites::{FavoritesStore, JsonFavoritesStore},
    models::{FavoriteGame, Game},
    remote::GameApi,
};

const WAIT_TIMEOUT: Duration = Duration::from_secs(2);

/// Scriptable [`GameApi`] that records every call.
#[derive(Default)]
pub(crate) struct FakeApi {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    responses: HashMap<String, Result<Value, String>>,
    gates: HashMap<String, Arc<Notify>>,
    calls: Vec<(&'static str, String)>,
}

impl FakeApi {
    fn respond_with(&self, key: String, response: Result<Value, String>) {
        self.state.lock().responses.insert(key, response);
    }

    pub(crate) fn set_games(&self, payload: Value) {
        self.respond_with("games".into(), Ok(payload));
    }

    pub(crate) fn set_games_for(&self, query: &str, payload: Value) {
        self.respond_with(format!("games:{query}"), Ok(payload));
    }

    pub(crate) fn fail_games(&self, message: &str) {
        self.respond_with("games".into(), Err(message.to_string()));
    }

    pub(crate) fn set_suggestions(&self, payload: Value) {
        self.respond_with("suggestions".into(), Ok(payload));
    }

    pub(crate) fn set_suggestions_for(&self, query: &str, payload: Value) {
        self.respond_with(format!("suggestions:{query}"), Ok(payload));
    }

    pub(crate) fn fail_suggestions(&self, message: &str) {
        self.respond_with("suggestions".into(), Err(message.to_string()));
    }

    pub(crate) fn set_detail(&self, payload: Value) {
        self.respond_with("detail".into(), Ok(payload));
    }

    pub(crate) fn fail_detail(&self, message: &str) {
        self.respond_with("detail".into(), Err(message.to_string()));
    }

    pub(crate) fn set_similar(&self, payload: Value) {
        self.respond_with("similar".into(), Ok(payload));
    }

    pub(crate) fn fail_similar(&self, message: &str) {
        self.respond_with("similar".into(), Err(message.to_string()));
    }

    /// Hold calls to `endpoint` with `argument` until the returned gate is notified.
    pub(crate) fn gate(&self, endpoint: &str, argument: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state
            .lock()
            .gates
            .insert(format!("{endpoint}:{argument}"), gate.clone());
        gate
    }

    fn calls_to(&self, endpoint: &str) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|(name, _)| *name == endpoint)
            .map(|(_, argument)| argument.clone())
            .collect()
    }

    pub(crate) fn game_queries(&self) -> Vec<String> {
        self.calls_to("games")
    }

    pub(crate) fn suggestion_queries(&self) -> Vec<String> {
        self.calls_to("suggestions")
    }

    pub(crate) fn requested_detail_ids(&self) -> Vec<u64> {
        self.calls_to("detail")
            .iter()
            .filter_map(|id| id.parse().ok())
            .collect()
    }

    pub(crate) fn detail_calls(&self) -> usize {
        self.calls_to("detail").len()
    }

    async fn respond(&self, endpoint: &'static str, argument: String) -> FetchResult<Value> {
        let key = format!("{endpoint}:{argument}");
        let gate = {
            let mut state = self.state.lock();
            state.calls.push((endpoint, argument));
            state.gates.get(&key).cloned()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let response = {
            let state = self.state.lock();
            state
                .responses
                .get(&key)
                .or_else(|| state.responses.get(endpoint))
                .cloned()
        };
        match response.unwrap_or_else(|| Ok(json!([]))) {
            Ok(payload) => Ok(payload),
            Err(body) => Err(FetchError::Status { status: 503, body }),
        }
    }
}

#[async_trait]
impl GameApi for FakeApi {
    async fn get_games(&self, query: &str) -> FetchResult<Value> {
        self.respond("games", query.to_string()).await
    }

    async fn get_suggestions(&self, query: &str) -> FetchResult<Value> {
        self.respond("suggestions", query.to_string()).await
    }

    async fn get_game_detail(&self, game_id: u64) -> FetchResult<Value> {
        self.respond("detail", game_id.to_string()).await
    }

    async fn get_similar_games(&self, game_id: u64) -> FetchResult<Value> {
        self.respond("similar", game_id.to_string()).await
    }
}

/// In-memory store that counts writes.
pub(crate) struct CountingStore {
    inner: JsonFavoritesStore,
    saves: AtomicUsize,
    removes: AtomicUsize,
}

impl Default for CountingStore {
    fn default() -> Self {
        Self {
            inner: JsonFavoritesStore::in_memory(),
            saves: AtomicUsize::new(0),
            removes: AtomicUsize::new(0),
        }
    }
}

impl CountingStore {
    pub(crate) fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub(crate) fn removes(&self) -> usize {
        self.removes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FavoritesStore for CountingStore {
    fn observe_all(&self) -> watch::Receiver<Vec<FavoriteGame>> {
        self.inner.observe_all()
    }

    async fn save(&self, game: &Game) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(game).await
    }

    async fn remove(&self, game_id: &str) -> Result<()> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(game_id).await
    }

    async fn clear_all(&self) -> Result<()> {
        self.inner.clear_all().await
    }
}

pub(crate) fn sample_game(id: &str) -> Game {
    Game {
        id: id.to_string(),
        title: format!("Game {id}"),
        thumbnail_url: "https://x/cover.jpg".to_string(),
        description: "desc".to_string(),
        developer: "Studio".to_string(),
        release_date: "2024".to_string(),
        screenshots: Vec::new(),
    }
}

/// Wait until the watched state satisfies `predicate` and return it.
pub(crate) async fn wait_for<S: Clone>(
    receiver: &mut watch::Receiver<S>,
    predicate: impl FnMut(&S) -> bool,
) -> S {
    let state = tokio::time::timeout(WAIT_TIMEOUT, receiver.wait_for(predicate))
        .await
        .expect("timed out waiting for state")
        .expect("state channel closed");
    state.clone()
}

/// Poll `condition` until it holds.
pub(crate) async fn wait_until(mut condition: impl FnMut() -> bool) {
    let poll = async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    tokio::time::timeout(WAIT_TIMEOUT, poll)
        .await
        .expect("timed out waiting for condition");
}

