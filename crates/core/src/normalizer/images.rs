//! Cover and screenshot URL resolution.

use std::collections::HashSet;

use serde_json::Value;

use super::fields::{array_first_object, primitive_text, read_image_id, read_string, read_string_array, Object};

/// Host serving every image referenced by an identifier.
pub const IMAGE_HOST: &str = "images.igdb.com";
/// Size preset for cover art.
pub const COVER_SIZE: &str = "t_cover_big";
/// Size preset for screenshots and artwork fallbacks.
pub const SCREENSHOT_SIZE: &str = "t_screenshot_big";
/// Shown when a record carries no usable image at all.
pub const PLACEHOLDER_IMAGE: &str = "https://placehold.co/600x800/111111/FFFFFF?text=Gameflix";

const DIRECT_COVER_KEYS: &[&str] = &[
    "image",
    "imageUrl",
    "coverUrl",
    "cover_url",
    "thumbnail",
    "artwork",
    "headerImage",
];
const URL_KEYS: &[&str] = &["url", "image_url"];
const MEDIA_COVER_KEYS: &[&str] = &["cover", "portrait"];
const ASSET_ARRAY_KEYS: &[&str] = &["artworks", "screenshots", "images", "assets"];
const SCREENSHOT_STRING_KEYS: &[&str] = &["screenshots", "images"];
const SCREENSHOT_ARRAY_KEYS: &[&str] = &["screenshots", "images", "artworks"];

/// Turn a raw image reference into an absolute URL.
pub fn normalize_image_url(raw: &str) -> String {
    if raw.starts_with("http") {
        raw.to_string()
    } else if raw.starts_with("//") {
        format!("https:{raw}")
    } else if raw.starts_with('/') {
        format!("https://{IMAGE_HOST}{raw}")
    } else {
        raw.to_string()
    }
}

/// Build a CDN URL for an image identifier at the given size preset.
pub fn build_image_url(image_id: &str, size: &str) -> String {
    format!(
        "https://{IMAGE_HOST}/igdb/image/upload/{size}/{}.jpg",
        image_id.trim()
    )
}

/// Resolve the cover image through the fallback chain, first hit wins.
pub(crate) fn read_cover_url(object: &Object) -> Option<String> {
    if let Some(direct) = read_string(object, DIRECT_COVER_KEYS) {
        return Some(normalize_image_url(&direct));
    }

    if let Some(image_id) = read_image_id(object) {
        return Some(build_image_url(&image_id, COVER_SIZE));
    }

    if let Some(cover) = object.get("cover").and_then(Value::as_object) {
        if let Some(url) = read_string(cover, URL_KEYS) {
            return Some(normalize_image_url(&url));
        }
        if let Some(image_id) = read_image_id(cover) {
            return Some(build_image_url(&image_id, COVER_SIZE));
        }
    }

    if let Some(media) = object.get("media").and_then(Value::as_object) {
        if let Some(url) = read_string(media, MEDIA_COVER_KEYS) {
            return Some(normalize_image_url(&url));
        }
    }

    let asset = array_first_object(object, ASSET_ARRAY_KEYS)?;
    read_string(asset, URL_KEYS)
        .map(|url| normalize_image_url(&url))
        .or_else(|| read_image_id(asset).map(|id| build_image_url(&id, SCREENSHOT_SIZE)))
}

/// Collect every screenshot URL, deduplicated.
pub(crate) fn read_screenshots(object: &Object) -> Vec<String> {
    let mut urls: HashSet<String> = read_string_array(object, SCREENSHOT_STRING_KEYS)
        .iter()
        .map(|raw| normalize_image_url(raw))
        .collect();

    for key in SCREENSHOT_ARRAY_KEYS {
        let Some(items) = object.get(*key).and_then(Value::as_array) else {
            continue;
        };
        for item in items {
            match item {
                Value::Object(nested) => {
                    if let Some(url) = read_string(nested, URL_KEYS) {
                        urls.insert(normalize_image_url(&url));
                    }
                    if let Some(image_id) = read_image_id(nested) {
                        urls.insert(build_image_url(&image_id, SCREENSHOT_SIZE));
                    }
                }
                Value::Array(inner) => {
                    urls.extend(
                        inner
                            .iter()
                            .filter(|value| !value.is_array() && !value.is_object())
                            .filter_map(primitive_text)
                            .map(|raw| normalize_image_url(&raw)),
                    );
                }
                other => {
                    if let Some(raw) = primitive_text(other) {
                        urls.insert(normalize_image_url(&raw));
                    }
                }
            }
        }
    }

    urls.into_iter().collect()
}
