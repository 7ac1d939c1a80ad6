//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use datum_core::ports::{
    AuthService, CatalogService, ObjectStorageService, PreferencesService, ThemeService,
};
use datum_core::search::BookSearch;
use datum_core::store::AppStore;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// The one session and preferences store of this process.
    pub store: Arc<AppStore>,
    /// The book list screen's listing.
    pub search: Arc<BookSearch>,
    pub auth: Arc<dyn AuthService>,
    pub storage: Arc<dyn ObjectStorageService>,
    pub preferences: Arc<dyn PreferencesService>,
    pub catalog: Arc<dyn CatalogService>,
    pub themes: Arc<dyn ThemeService>,
}
