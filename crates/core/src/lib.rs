#![warn(clippy::all, missing_docs)]

//! Core logic for the Gameflix catalog client.
//!
//! This crate hosts the domain models, the normalizer that maps the
//! Gamebrain API's inconsistent JSON into them, the repository and
//! favorites store, and the screen coordinators used by the CLI and any
//! future frontends.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod favorites;
pub mod models;
pub mod normalizer;
pub mod remote;
pub mod repository;

#[cfg(test)]
mod testing;

pub use config::AppConfig;
pub use coordinator::{DetailCoordinator, FavoritesCoordinator, LibraryCoordinator};
pub use error::{FetchError, FetchResult};
pub use favorites::{FavoritesStore, JsonFavoritesStore};
pub use models::{FavoriteGame, Game, GameCategory, GameSuggestion};
pub use remote::{GameApi, GamebrainClient};
pub use repository::GameRepository;
