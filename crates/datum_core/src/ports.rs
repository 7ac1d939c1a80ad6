//! crates/datum_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, keeping the core
//! independent of the hosted auth backend, object storage, the preferences table,
//! the book metadata API, and wherever the theme flag is persisted.

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::catalog::{SearchPage, VolumeRecord};
use crate::domain::{AuthEvent, Preferences, Session, Theme};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The remote service understood the request and refused it.
    #[error("Rejected: {0}")]
    Rejected(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> PortResult<Session>;

    async fn sign_up(&self, email: &str, password: &str, redirect_to: &str)
        -> PortResult<Session>;

    async fn sign_out(&self) -> PortResult<()>;

    /// The session the provider currently holds, if any.
    async fn current_session(&self) -> PortResult<Option<Session>>;

    async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> PortResult<()>;

    /// Subscribes to session changes (sign in, sign out, refresh).
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

#[async_trait]
pub trait ObjectStorageService: Send + Sync {
    /// Stores `bytes` under `object_name` and returns its public URL.
    async fn upload(
        &self,
        object_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> PortResult<String>;
}

#[async_trait]
pub trait PreferencesService: Send + Sync {
    /// Inserts or replaces the preferences row of `user_id`.
    async fn upsert_preferences(&self, user_id: Uuid, preferences: &Preferences)
        -> PortResult<()>;

    async fn get_preferences(&self, user_id: Uuid) -> PortResult<Option<Preferences>>;
}

#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Runs a volume search starting at `start_index`.
    async fn search(&self, query: &str, start_index: u32) -> PortResult<SearchPage>;

    /// Fetches a single volume in the provider's own shape.
    async fn get_by_id(&self, id: &str) -> PortResult<VolumeRecord>;
}

#[async_trait]
pub trait ThemeService: Send + Sync {
    /// The persisted theme, or the default when nothing was saved yet.
    async fn load(&self) -> PortResult<Theme>;

    async fn save(&self, theme: Theme) -> PortResult<()>;
}
