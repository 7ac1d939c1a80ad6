//! services/api/src/adapters/supabase_storage.rs
//!
//! This module contains the adapter for Supabase's object storage.
//! It implements the `ObjectStorageService` port from the `core` crate.

use async_trait::async_trait;
use datum_core::ports::{ObjectStorageService, PortError, PortResult};
use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use tracing::{error, info};

use super::supabase_auth::SupabaseAuthAdapter;

/// Uploads into one public bucket. Requests carry the signed-in user's token
/// so the bucket's row-level policies apply; the anon key is used otherwise.
pub struct SupabaseStorageAdapter {
    http: reqwest::Client,
    storage_url: String,
    anon_key: String,
    bucket: String,
    auth: Arc<SupabaseAuthAdapter>,
}

impl SupabaseStorageAdapter {
    pub fn new(
        http: reqwest::Client,
        supabase_url: &str,
        anon_key: impl Into<String>,
        bucket: impl Into<String>,
        auth: Arc<SupabaseAuthAdapter>,
    ) -> Self {
        Self {
            http,
            storage_url: format!("{}/storage/v1", supabase_url.trim_end_matches('/')),
            anon_key: anon_key.into(),
            bucket: bucket.into(),
            auth,
        }
    }

    /// The URL anyone can fetch `object_name` from.
    pub fn public_url(&self, object_name: &str) -> String {
        format!(
            "{}/object/public/{}/{}",
            self.storage_url, self.bucket, object_name
        )
    }
}

#[async_trait]
impl ObjectStorageService for SupabaseStorageAdapter {
    async fn upload(
        &self,
        object_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> PortResult<String> {
        let bearer = self
            .auth
            .access_token()
            .await
            .unwrap_or_else(|| self.anon_key.clone());
        let size = bytes.len();

        let response = self
            .http
            .post(format!(
                "{}/object/{}/{}",
                self.storage_url, self.bucket, object_name
            ))
            .header("apikey", &self.anon_key)
            .header("x-upsert", "false")
            .header(CONTENT_TYPE, content_type)
            .bearer_auth(bearer)
            .body(bytes)
            .send()
            .await
            .map_err(|e| {
                error!("Error uploading {}: {}", object_name, e);
                PortError::Unexpected(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, "Storage refused upload of {}: {}", object_name, body);
            return Err(PortError::Rejected(format!("storage returned {}: {}", status, body)));
        }

        info!(object = object_name, size, "Uploaded profile image");
        Ok(self.public_url(object_name))
    }
}
