//! Subcommand handlers. Each one drives a coordinator until it settles and
//! prints the resulting state.
//!
//! `search` and `suggest` run on a full `LibraryCoordinator`, so they also
//! issue the four home-feed requests its construction starts.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::sync::watch;

use gameflix_core::{
    coordinator::{
        detail::LOAD_FAILED_MESSAGE, DetailPhase, DetailViewState, FavoritesViewState,
        LibraryViewState,
    },
    DetailCoordinator, FavoritesCoordinator, FavoritesStore, Game, GameRepository, GameSuggestion,
    JsonFavoritesStore, LibraryCoordinator,
};

type Store = Arc<JsonFavoritesStore>;

async fn settle<S: Clone>(
    receiver: &mut watch::Receiver<S>,
    done: impl FnMut(&S) -> bool,
) -> Result<S> {
    let state = receiver
        .wait_for(done)
        .await
        .context("state channel closed")?
        .clone();
    Ok(state)
}

pub async fn home(repository: GameRepository, favorites: Store) -> Result<()> {
    let library = LibraryCoordinator::new(repository, favorites);
    let mut rx = library.subscribe();
    let state = settle(&mut rx, |state| !state.is_home_loading).await?;

    if let Some(error) = &state.home_error {
        eprintln!("warning: {error}");
    }
    match &state.featured_game {
        Some(game) => {
            println!("Featured");
            print_game_line(game, &state);
        }
        None => println!("Featured: none"),
    }
    for category in state.categories() {
        println!();
        println!("{} ({})", category.title, category.games.len());
        for game in &category.games {
            print_game_line(game, &state);
        }
    }
    println!();
    println!("Suggestions");
    print_suggestions(&state.default_suggestions);
    Ok(())
}

pub async fn search(repository: GameRepository, favorites: Store, query: &str) -> Result<()> {
    let library = LibraryCoordinator::new(repository, favorites);
    let mut rx = library.subscribe();
    library.submit_search_with(query);
    let state = settle(&mut rx, |state| !state.is_searching).await?;

    if let Some(error) = &state.search_error {
        bail!("search failed: {error}");
    }
    if state.search_results.is_empty() {
        println!("No results for \"{}\"", query.trim());
    }
    for game in &state.search_results {
        print_game_line(game, &state);
    }
    Ok(())
}

pub async fn suggest(repository: GameRepository, favorites: Store, query: &str) -> Result<()> {
    let suggestions = load_suggestions(repository, favorites, query).await?;
    print_suggestions(&suggestions);
    Ok(())
}

/// Blank queries show the default suggestions, which only exist once the
/// home refresh has finished.
async fn load_suggestions(
    repository: GameRepository,
    favorites: Store,
    query: &str,
) -> Result<Vec<GameSuggestion>> {
    let library = LibraryCoordinator::new(repository, favorites);
    let mut rx = library.subscribe();
    library.on_search_query_change(query);
    let state = settle(&mut rx, |state| {
        !state.is_home_loading && !state.is_suggestions_loading
    })
    .await?;

    if let Some(error) = state.search_error {
        bail!("suggestions failed: {error}");
    }
    Ok(state.suggestions)
}

pub async fn detail(repository: GameRepository, favorites: Store, id: &str) -> Result<()> {
    let screen = DetailCoordinator::new(id, repository, favorites);
    let mut rx = screen.subscribe();
    let state = settle(&mut rx, |state| state.phase() != DetailPhase::Loading).await?;

    match state.phase() {
        DetailPhase::Error => bail!(
            "{}",
            state.error_message.as_deref().unwrap_or(LOAD_FAILED_MESSAGE)
        ),
        _ => print_detail(&state),
    }
    Ok(())
}

pub async fn list_favorites(favorites: Store) -> Result<()> {
    let screen = FavoritesCoordinator::new(favorites);
    let mut rx = screen.subscribe();
    let state = settle(&mut rx, |state| !state.is_loading).await?;
    print_favorites(&state);
    Ok(())
}

pub async fn add_favorite(repository: GameRepository, favorites: Store, id: &str) -> Result<()> {
    let already_saved = favorites.observe_one(id).current();
    let screen = DetailCoordinator::new(id, repository, favorites.clone());
    let mut rx = screen.subscribe();
    let state = settle(&mut rx, |state| state.phase() != DetailPhase::Loading).await?;

    let Some(game) = state.game else {
        bail!(
            "{}",
            state.error_message.as_deref().unwrap_or(LOAD_FAILED_MESSAGE)
        );
    };
    if !already_saved {
        favorites
            .save(&game)
            .await
            .with_context(|| format!("failed to save favorite {}", game.id))?;
    }
    println!("Saved {} ({})", game.title, game.id);
    Ok(())
}

pub async fn remove_favorite(favorites: Store, id: &str) -> Result<()> {
    let screen = FavoritesCoordinator::new(favorites);
    let mut rx = screen.subscribe();
    settle(&mut rx, |state| !state.is_loading).await?;

    screen.delete_favorite(id);
    settle(&mut rx, |state| !contains(state, id)).await?;
    println!("Removed {id}");
    Ok(())
}

pub async fn clear_favorites(favorites: Store) -> Result<()> {
    let screen = FavoritesCoordinator::new(favorites);
    let mut rx = screen.subscribe();
    let state = settle(&mut rx, |state| !state.is_loading).await?;
    let count = state.favorites.len();

    screen.clear_favorites();
    settle(&mut rx, |state| state.favorites.is_empty()).await?;
    println!("Removed {count} favorites");
    Ok(())
}

fn contains(state: &FavoritesViewState, id: &str) -> bool {
    state.favorites.iter().any(|favorite| favorite.game.id == id)
}

fn print_game_line(game: &Game, state: &LibraryViewState) {
    let marker = if state.is_favorite(&game.id) { "*" } else { " " };
    println!(
        "{marker} {:>8}  {}  [{}, {}]",
        game.id, game.title, game.developer, game.release_date
    );
}

fn print_suggestions(suggestions: &[GameSuggestion]) {
    if suggestions.is_empty() {
        println!("  (none)");
    }
    for suggestion in suggestions {
        println!("  {:>8}  {}", suggestion.id, suggestion.title);
    }
}

fn print_detail(state: &DetailViewState) {
    let Some(game) = &state.game else {
        return;
    };
    let marker = if state.is_favorite { " *" } else { "" };
    println!("{}{marker}", game.title);
    println!("Id:        {}", game.id);
    println!("Developer: {}", game.developer);
    println!("Released:  {}", game.release_date);
    println!("Cover:     {}", game.thumbnail_url);
    println!();
    println!("{}", game.description);
    if !game.screenshots.is_empty() {
        println!();
        println!("Screenshots");
        for url in &game.screenshots {
            println!("  {url}");
        }
    }
}

fn print_favorites(state: &FavoritesViewState) {
    if state.favorites.is_empty() {
        println!("No favorites yet");
        return;
    }
    for favorite in &state.favorites {
        let saved = favorite
            .saved_at_utc()
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!("{:>8}  {}  (saved {saved})", favorite.game.id, favorite.game.title);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gameflix_core::{FetchResult, GameApi};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tempfile::tempdir;

    /// Every detail id exists; suggestions echo the query.
    struct StubApi;

    #[async_trait]
    impl GameApi for StubApi {
        async fn get_games(&self, _query: &str) -> FetchResult<Value> {
            Ok(json!([]))
        }

        async fn get_suggestions(&self, query: &str) -> FetchResult<Value> {
            Ok(json!([{"id": 1, "name": format!("{query} one")}]))
        }

        async fn get_game_detail(&self, game_id: u64) -> FetchResult<Value> {
            Ok(json!({"id": game_id, "name": "Stronghold"}))
        }

        async fn get_similar_games(&self, _game_id: u64) -> FetchResult<Value> {
            Ok(json!([]))
        }
    }

    fn repository() -> GameRepository {
        GameRepository::new(Arc::new(StubApi))
    }

    #[tokio::test]
    async fn add_favorite_persists_game() -> Result<()> {
        let dir = tempdir()?;
        let store = Arc::new(JsonFavoritesStore::open(dir.path().join("favorites.json")).await?);

        add_favorite(repository(), store.clone(), "12").await?;
        assert!(store.observe_one("12").current());
        Ok(())
    }

    #[tokio::test]
    async fn add_favorite_reports_write_failure() -> Result<()> {
        let dir = tempdir()?;
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file")?;
        let store = Arc::new(JsonFavoritesStore::open(blocker.join("favorites.json")).await?);

        let outcome = tokio::time::timeout(
            Duration::from_secs(2),
            add_favorite(repository(), store.clone(), "12"),
        )
        .await;
        assert!(matches!(outcome, Ok(Err(_))));
        assert!(!store.observe_one("12").current());
        Ok(())
    }

    #[tokio::test]
    async fn blank_suggest_waits_for_defaults() -> Result<()> {
        let store = Arc::new(JsonFavoritesStore::in_memory());

        let suggestions = load_suggestions(repository(), store.clone(), "").await?;
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].title, "kingdom co one");

        let suggestions = load_suggestions(repository(), store, "halo").await?;
        assert_eq!(suggestions[0].title, "halo one");
        Ok(())
    }
}
