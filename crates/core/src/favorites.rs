//! Locally persisted favorites.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use crate::models::{FavoriteGame, Game};

/// On-disk layout version. There is no migration path.
pub const STORE_VERSION: u32 = 1;

/// Keyed store of favorite games shared by every screen.
#[async_trait]
pub trait FavoritesStore: Send + Sync {
    /// All favorites, most recently saved first. Emits after every write.
    fn observe_all(&self) -> watch::Receiver<Vec<FavoriteGame>>;

    /// Favorite status of a single game id.
    fn observe_one(&self, game_id: &str) -> FavoriteStatus {
        FavoriteStatus::new(game_id, self.observe_all())
    }

    /// Insert or replace a favorite, stamping it with the current time.
    async fn save(&self, game: &Game) -> Result<()>;

    /// Delete the favorite with this id, if present.
    async fn remove(&self, game_id: &str) -> Result<()>;

    /// Delete every favorite.
    async fn clear_all(&self) -> Result<()>;
}

/// Stream of favorite flags for one game.
pub struct FavoriteStatus {
    game_id: String,
    receiver: watch::Receiver<Vec<FavoriteGame>>,
}

impl FavoriteStatus {
    fn new(game_id: &str, receiver: watch::Receiver<Vec<FavoriteGame>>) -> Self {
        Self {
            game_id: game_id.to_string(),
            receiver,
        }
    }

    /// Whether the game is currently a favorite.
    pub fn current(&self) -> bool {
        contains(&self.receiver.borrow(), &self.game_id)
    }

    /// Wait for the next store write and return the flag after it.
    ///
    /// Returns `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<bool> {
        self.receiver.changed().await.ok()?;
        Some(contains(&self.receiver.borrow_and_update(), &self.game_id))
    }
}

fn contains(favorites: &[FavoriteGame], game_id: &str) -> bool {
    favorites.iter().any(|favorite| favorite.game.id == game_id)
}

#[derive(Debug, Serialize, Deserialize)]
struct FavoritesFile {
    version: u32,
    #[serde(default)]
    favorites: Vec<FavoriteRecord>,
}

/// One persisted favorite. Screenshots are kept as a serialized string list.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FavoriteRecord {
    id: String,
    title: String,
    thumbnail_url: String,
    description: String,
    developer: String,
    release_date: String,
    #[serde(default)]
    screenshots: String,
    saved_at: i64,
}

impl FavoriteRecord {
    fn from_favorite(favorite: FavoriteGame) -> Self {
        let FavoriteGame { game, saved_at } = favorite;
        Self {
            screenshots: encode_screenshots(&game.screenshots),
            id: game.id,
            title: game.title,
            thumbnail_url: game.thumbnail_url,
            description: game.description,
            developer: game.developer,
            release_date: game.release_date,
            saved_at,
        }
    }

    fn to_favorite(&self) -> FavoriteGame {
        FavoriteGame {
            game: Game {
                id: self.id.clone(),
                title: self.title.clone(),
                thumbnail_url: self.thumbnail_url.clone(),
                description: self.description.clone(),
                developer: self.developer.clone(),
                release_date: self.release_date.clone(),
                screenshots: decode_screenshots(&self.screenshots),
            },
            saved_at: self.saved_at,
        }
    }
}

fn encode_screenshots(screenshots: &[String]) -> String {
    serde_json::to_string(screenshots).unwrap_or_else(|_| "[]".to_string())
}

fn decode_screenshots(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    serde_json::from_str(raw).unwrap_or_else(|err| {
        warn!(%err, "Discarding unreadable screenshot list");
        Vec::new()
    })
}

fn snapshot(records: &BTreeMap<String, FavoriteRecord>) -> Vec<FavoriteGame> {
    let mut favorites: Vec<FavoriteGame> = records.values().map(FavoriteRecord::to_favorite).collect();
    favorites.sort_by(|a, b| {
        b.saved_at
            .cmp(&a.saved_at)
            .then_with(|| a.game.id.cmp(&b.game.id))
    });
    favorites
}

/// Favorites store persisted as a single JSON document.
///
/// Writes are serialized behind an async mutex; each one rewrites the file
/// and then broadcasts the new list.
pub struct JsonFavoritesStore {
    path: Option<PathBuf>,
    records: Mutex<BTreeMap<String, FavoriteRecord>>,
    sender: watch::Sender<Vec<FavoriteGame>>,
}

impl JsonFavoritesStore {
    /// Open the store at `path`, loading existing favorites if the file exists.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = read_records(&path).await?;
        debug!(path = %path.display(), count = records.len(), "Opened favorites store");
        Ok(Self::with_records(Some(path), records))
    }

    /// Store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self::with_records(None, BTreeMap::new())
    }

    fn with_records(path: Option<PathBuf>, records: BTreeMap<String, FavoriteRecord>) -> Self {
        let (sender, _) = watch::channel(snapshot(&records));
        Self {
            path,
            records: Mutex::new(records),
            sender,
        }
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Apply `change` to a copy of the records, persist it, then swap it in.
    ///
    /// A failed write leaves both the records and observers untouched.
    async fn update(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, FavoriteRecord>) + Send,
    ) -> Result<()> {
        let mut records = self.records.lock().await;
        let mut next = records.clone();
        change(&mut next);
        if let Some(path) = &self.path {
            write_records(path, &next).await?;
        }
        self.sender.send_replace(snapshot(&next));
        *records = next;
        Ok(())
    }
}

#[async_trait]
impl FavoritesStore for JsonFavoritesStore {
    fn observe_all(&self) -> watch::Receiver<Vec<FavoriteGame>> {
        self.sender.subscribe()
    }

    async fn save(&self, game: &Game) -> Result<()> {
        let record = FavoriteRecord::from_favorite(FavoriteGame::now(game.clone()));
        self.update(|records| {
            records.insert(record.id.clone(), record);
        })
        .await?;
        debug!(game_id = %game.id, "Saved favorite");
        Ok(())
    }

    async fn remove(&self, game_id: &str) -> Result<()> {
        self.update(|records| {
            records.remove(game_id);
        })
        .await?;
        debug!(game_id, "Removed favorite");
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        self.update(BTreeMap::clear).await?;
        debug!("Cleared favorites");
        Ok(())
    }
}

async fn read_records(path: &Path) -> Result<BTreeMap<String, FavoriteRecord>> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Ok(BTreeMap::new());
    }

    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read favorites {}", path.display()))?;
    let file: FavoritesFile = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse favorites {}", path.display()))?;
    if file.version != STORE_VERSION {
        bail!(
            "unsupported favorites version {} in {}",
            file.version,
            path.display()
        );
    }

    Ok(file
        .favorites
        .into_iter()
        .map(|record| (record.id.clone(), record))
        .collect())
}

async fn write_records(path: &Path, records: &BTreeMap<String, FavoriteRecord>) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = FavoritesFile {
        version: STORE_VERSION,
        favorites: records.values().cloned().collect(),
    };
    let serialized = serde_json::to_vec_pretty(&file).context("failed to serialize favorites")?;
    tokio::fs::write(path, serialized)
        .await
        .with_context(|| format!("failed to write favorites {}", path.display()))
}
