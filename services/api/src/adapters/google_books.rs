//! services/api/src/adapters/google_books.rs
//!
//! This module contains the adapter for the Google Books volumes API.
//! It implements the `CatalogService` port from the `core` crate.

use async_trait::async_trait;
use datum_core::catalog::{SearchPage, VolumeRecord, PAGE_SIZE};
use datum_core::ports::{CatalogService, PortError, PortResult};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};

const USER_AGENT: &str = concat!("datum/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `CatalogService` port over HTTP.
#[derive(Clone)]
pub struct GoogleBooksAdapter {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleBooksAdapter {
    /// Creates a new `GoogleBooksAdapter` for the API rooted at `base_url`
    /// (e.g. `https://www.googleapis.com/books/v1`).
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn volumes_url(&self) -> PortResult<Url> {
        Url::parse(&format!("{}/volumes", self.base_url))
            .map_err(|e| PortError::Unexpected(format!("Invalid Google Books URL: {}", e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> PortResult<T> {
        debug!(url = %url, "Querying Google Books");

        let response = self.http.get(url).send().await.map_err(|e| {
            error!("Error fetching {}: {}", what, e);
            PortError::Unexpected(e.to_string())
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(PortError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, "Google Books rejected the request for {}", what);
            return Err(PortError::Unexpected(format!(
                "Google Books returned {}: {}",
                status, body
            )));
        }

        response.json::<T>().await.map_err(|e| {
            error!("Malformed Google Books response for {}: {}", what, e);
            PortError::Unexpected(e.to_string())
        })
    }
}

//=========================================================================================
// `CatalogService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CatalogService for GoogleBooksAdapter {
    async fn search(&self, query: &str, start_index: u32) -> PortResult<SearchPage> {
        let mut url = self.volumes_url()?;
        {
            let mut params = url.query_pairs_mut();
            params
                .append_pair("q", query)
                .append_pair("startIndex", &start_index.to_string())
                .append_pair("maxResults", &PAGE_SIZE.to_string())
                .append_pair("projection", "full");
            if let Some(key) = &self.api_key {
                params.append_pair("key", key);
            }
        }

        self.get_json(url, &format!("search '{}'", query)).await
    }

    async fn get_by_id(&self, id: &str) -> PortResult<VolumeRecord> {
        let mut url = self.volumes_url()?;
        url.path_segments_mut()
            .map_err(|_| PortError::Unexpected("Google Books URL cannot have a path".into()))?
            .push(id);
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }

        self.get_json(url, &format!("volume {}", id)).await
    }
}
