//! Maps Gamebrain JSON payloads into canonical domain records.
//!
//! The upstream API is inconsistent across its detail, list, similar and
//! suggestion endpoints: the same field shows up under different names and
//! at different nesting depths. Every function here is total. Missing or
//! malformed fields degrade to placeholders, and unusable records are
//! skipped, so one bad entry never hides the rest of a list.

mod fields;
mod images;

use serde_json::Value;

use crate::models::{Game, GameSuggestion};

use fields::{first_from_array, read_first_array_string, read_string, Object};
pub use images::{build_image_url, normalize_image_url, COVER_SIZE, PLACEHOLDER_IMAGE, SCREENSHOT_SIZE};

/// Title used when a record has no name.
pub const UNTITLED: &str = "Untitled";
/// Description used when none is present.
pub const NO_DESCRIPTION: &str = "Description not available.";
/// Developer used when no studio can be resolved.
pub const UNKNOWN_DEVELOPER: &str = "Unknown studio";
/// Release date used when none is present.
pub const UNKNOWN_RELEASE_DATE: &str = "TBD";

const COLLECTION_KEYS: &[&str] = &["games", "results", "data", "items"];
const SINGLE_OBJECT_KEYS: &[&str] = &["game", "data", "result", "item"];

/// Map a list-shaped payload into games.
pub fn to_games(payload: Option<&Value>) -> Vec<Game> {
    match payload {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => extract_objects(value, &[])
            .into_iter()
            .filter_map(to_game_record)
            .collect(),
    }
}

/// Map a detail payload into a single game.
pub fn to_game(payload: Option<&Value>) -> Option<Game> {
    let target = match payload? {
        Value::Object(object) => unwrap_single_object(object)?,
        Value::Array(items) => items.first()?.as_object()?,
        _ => return None,
    };
    to_game_record(target)
}

/// Map a suggestion payload. Entries without an id or a title are dropped.
pub fn to_suggestions(payload: Option<&Value>) -> Vec<GameSuggestion> {
    match payload {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => extract_objects(value, &["suggestions"])
            .into_iter()
            .filter_map(|object| {
                Some(GameSuggestion {
                    id: read_string(object, &["id"])?,
                    title: read_string(object, &["name", "title"])?,
                })
            })
            .collect(),
    }
}

fn to_game_record(object: &Object) -> Option<Game> {
    let id = read_string(object, &["id"])?;
    let title = read_string(object, &["name", "title"]).unwrap_or_else(|| UNTITLED.to_string());
    let description = read_string(object, &["description", "summary", "storyline", "deck"])
        .unwrap_or_else(|| NO_DESCRIPTION.to_string());
    let developer = read_string(object, &["developer", "studio", "company", "publisher"])
        .or_else(|| {
            read_first_array_string(object, &["developers", "companies", "involved_companies"])
        })
        .unwrap_or_else(|| UNKNOWN_DEVELOPER.to_string());
    let release_date = read_string(
        object,
        &["release_date", "released", "releaseDate", "first_release_date"],
    )
    .or_else(|| {
        first_from_array(object, "release_dates").and_then(|entry| read_string(entry, &["human", "date"]))
    })
    .unwrap_or_else(|| UNKNOWN_RELEASE_DATE.to_string());

    Some(Game {
        id,
        title,
        thumbnail_url: images::read_cover_url(object)
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
        description,
        developer,
        release_date,
        screenshots: images::read_screenshots(object),
    })
}

/// Locate the list of entity objects inside a payload.
fn extract_objects<'a>(value: &'a Value, extra_keys: &[&str]) -> Vec<&'a Object> {
    let object = match value {
        Value::Array(items) => return items.iter().filter_map(Value::as_object).collect(),
        Value::Object(object) => object,
        _ => return Vec::new(),
    };

    for key in COLLECTION_KEYS.iter().chain(extra_keys) {
        match object.get(*key) {
            Some(Value::Array(items)) => {
                return items.iter().filter_map(Value::as_object).collect();
            }
            Some(Value::Object(nested)) if nested.values().all(Value::is_array) => {
                let flattened: Vec<&Object> = nested
                    .values()
                    .filter_map(Value::as_array)
                    .find(|items| !items.is_empty())
                    .map(|items| items.iter().filter_map(Value::as_object).collect())
                    .unwrap_or_default();
                if !flattened.is_empty() {
                    return flattened;
                }
            }
            _ => {}
        }
    }

    vec![object]
}

/// Pick the detail record out of a wrapper object.
///
/// A wrapper key holding an empty array means the detail is absent.
fn unwrap_single_object(object: &Object) -> Option<&Object> {
    for key in SINGLE_OBJECT_KEYS {
        match object.get(*key) {
            Some(Value::Object(nested)) => return Some(nested),
            Some(Value::Array(items)) => return items.first().and_then(Value::as_object),
            _ => {}
        }
    }
    Some(object)
}
