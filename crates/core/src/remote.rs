//! HTTP access to the Gamebrain API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    config::AppConfig,
    error::{FetchError, FetchResult},
};

/// Longest slice of an error body kept in [`FetchError::Status`].
const MAX_ERROR_BODY: usize = 200;

/// Raw JSON endpoints exposed by the catalog API.
#[async_trait]
pub trait GameApi: Send + Sync {
    /// Free-text game search.
    async fn get_games(&self, query: &str) -> FetchResult<Value>;

    /// Autocomplete suggestions for a partial query.
    async fn get_suggestions(&self, query: &str) -> FetchResult<Value>;

    /// Detail record for a numeric game id.
    async fn get_game_detail(&self, game_id: u64) -> FetchResult<Value>;

    /// Games similar to the given numeric id.
    async fn get_similar_games(&self, game_id: u64) -> FetchResult<Value>;
}

/// `reqwest`-backed client for the Gamebrain API.
#[derive(Clone)]
pub struct GamebrainClient {
    http: reqwest::Client,
    base_url: String,
}

impl GamebrainClient {
    /// Build a client from configuration.
    ///
    /// A blank API key is tolerated: requests are sent without an
    /// `Authorization` header.
    pub fn new(config: &AppConfig) -> FetchResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        let api_key = config.api_key.trim();
        if api_key.is_empty() {
            warn!("Missing Gamebrain API key, requests will be unauthenticated");
        } else {
            match header::HeaderValue::from_str(&format!("Bearer {api_key}")) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(header::AUTHORIZATION, value);
                }
                Err(err) => warn!(%err, "API key is not a valid header value, ignoring it"),
            }
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json(&self, path: &str, query: Option<&str>) -> FetchResult<Value> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, query = query.unwrap_or_default(), "GET");

        let mut request = self.http.get(&url);
        if let Some(query) = query {
            request = request.query(&[("query", query)]);
        }
        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

fn status_error(status: StatusCode, body: &str) -> FetchError {
    let body: String = body.chars().take(MAX_ERROR_BODY).collect();
    FetchError::Status {
        status: status.as_u16(),
        body,
    }
}

#[async_trait]
impl GameApi for GamebrainClient {
    async fn get_games(&self, query: &str) -> FetchResult<Value> {
        self.get_json("v1/games", Some(query)).await
    }

    async fn get_suggestions(&self, query: &str) -> FetchResult<Value> {
        self.get_json("v1/games/suggestions", Some(query)).await
    }

    async fn get_game_detail(&self, game_id: u64) -> FetchResult<Value> {
        self.get_json(&format!("v1/games/{game_id}"), None).await
    }

    async fn get_similar_games(&self, game_id: u64) -> FetchResult<Value> {
        self.get_json(&format!("v1/games/{game_id}/similar"), None)
            .await
    }
}
