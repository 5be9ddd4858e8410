//! gameflix CLI
//!
//! Browse the Gamebrain catalog and manage local favorites from the terminal.

mod commands;

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};
use tracing_subscriber::{prelude::*, EnvFilter};

use gameflix_core::{
    config::{self, AppConfig},
    GameRepository, GamebrainClient, JsonFavoritesStore,
};

#[derive(Parser)]
#[command(name = "gameflix")]
#[command(about = "Browse the game catalog and your favorites", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the featured game, home categories and default suggestions
    Home,

    /// Search the catalog
    Search {
        /// Free-text query
        query: String,
    },

    /// Autocomplete suggestions for a partial query
    Suggest {
        /// Partial query (at least 3 characters)
        query: String,
    },

    /// Show one game in full
    Detail {
        /// Numeric game id
        id: String,
    },

    /// Manage saved favorites
    Favorites {
        #[command(subcommand)]
        action: Option<FavoritesAction>,
    },
}

#[derive(Subcommand, Clone)]
enum FavoritesAction {
    /// List favorites, most recently saved first
    List,
    /// Fetch a game and save it
    Add {
        /// Numeric game id
        id: String,
    },
    /// Remove a saved game
    Remove {
        /// Game id
        id: String,
    },
    /// Remove every favorite
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    init_logging(&config)?;
    tracing::debug!(api = %config.api_base_url, data_dir = %config.data_dir.display(), "Configuration loaded");

    let client = GamebrainClient::new(&config).context("failed to build API client")?;
    let repository = GameRepository::new(Arc::new(client));
    let favorites = Arc::new(JsonFavoritesStore::open(config.favorites_path()).await?);

    match cli.command {
        Commands::Home => commands::home(repository, favorites).await,
        Commands::Search { query } => commands::search(repository, favorites, &query).await,
        Commands::Suggest { query } => commands::suggest(repository, favorites, &query).await,
        Commands::Detail { id } => commands::detail(repository, favorites, &id).await,
        Commands::Favorites { action } => match action.unwrap_or(FavoritesAction::List) {
            FavoritesAction::List => commands::list_favorites(favorites).await,
            FavoritesAction::Add { id } => commands::add_favorite(repository, favorites, &id).await,
            FavoritesAction::Remove { id } => commands::remove_favorite(favorites, &id).await,
            FavoritesAction::Clear => commands::clear_favorites(favorites).await,
        },
    }
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let log_dir = config.log_dir();
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let log_path = log_dir.join("gameflix.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::from_default_env();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
