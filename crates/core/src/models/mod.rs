//! Shared domain models.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Canonical game record produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    /// Upstream identifier. List endpoints may return non-numeric ids.
    pub id: String,
    /// Display title, never blank.
    pub title: String,
    /// Cover image URL, never blank.
    pub thumbnail_url: String,
    /// Long-form description.
    pub description: String,
    /// Developer or studio credit.
    pub developer: String,
    /// Free-text release date as reported upstream.
    pub release_date: String,
    /// Screenshot URLs without duplicates. Order is not meaningful.
    #[serde(default)]
    pub screenshots: Vec<String>,
}

/// Lightweight autocomplete entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSuggestion {
    /// Upstream identifier.
    pub id: String,
    /// Title shown on the suggestion chip.
    pub title: String,
}

/// Display grouping of games under a heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameCategory {
    /// Heading for the group.
    pub title: String,
    /// Games in display order.
    pub games: Vec<Game>,
}

impl GameCategory {
    /// Build a category from a title and its games.
    pub fn new(title: impl Into<String>, games: Vec<Game>) -> Self {
        Self {
            title: title.into(),
            games,
        }
    }

    /// Whether the category has nothing to show.
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

/// A game the user marked as favorite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteGame {
    /// Denormalized copy of the game at the time it was saved.
    pub game: Game,
    /// Epoch milliseconds when the favorite was stored.
    pub saved_at: i64,
}

impl FavoriteGame {
    /// Wrap a game with the current time as its save timestamp.
    pub fn now(game: Game) -> Self {
        Self {
            game,
            saved_at: Utc::now().timestamp_millis(),
        }
    }

    /// Save timestamp as a UTC datetime, if representable.
    pub fn saved_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.saved_at).single()
    }
}
