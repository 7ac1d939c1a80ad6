//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        DbAdapter, FileThemeAdapter, GoogleBooksAdapter, SupabaseAuthAdapter,
        SupabaseStorageAdapter,
    },
    config::Config,
    error::ApiError,
    web::{build_router, state::AppState},
};
use datum_core::auth;
use datum_core::ports::AuthService;
use datum_core::search::BookSearch;
use datum_core::store::AppStore;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let auth_adapter = Arc::new(SupabaseAuthAdapter::new(
        http.clone(),
        &config.supabase_url,
        config.supabase_anon_key.clone(),
    ));
    let storage_adapter = Arc::new(SupabaseStorageAdapter::new(
        http,
        &config.supabase_url,
        config.supabase_anon_key.clone(),
        config.profile_image_bucket.clone(),
        auth_adapter.clone(),
    ));
    let catalog_adapter = Arc::new(GoogleBooksAdapter::new(
        config.google_books_api_url.clone(),
        config.google_books_api_key.clone(),
    )?);
    let theme_adapter = Arc::new(FileThemeAdapter::new(config.theme_file.clone()));

    // --- 4. Restore the Session & Follow Auth Changes ---
    let store = Arc::new(AppStore::new());
    auth::restore_session(&store, auth_adapter.as_ref()).await;

    let shutdown = CancellationToken::new();
    let follower = tokio::spawn({
        let store = store.clone();
        let events = auth_adapter.subscribe();
        let cancel = shutdown.clone();
        async move { auth::follow_auth_changes(&store, events, cancel).await }
    });

    // --- 5. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        store,
        search: Arc::new(BookSearch::new()),
        auth: auth_adapter,
        storage: storage_adapter,
        preferences: db_adapter,
        catalog: catalog_adapter,
        themes: theme_adapter,
    });

    // --- 6. Create the Web Router ---
    let app = build_router(app_state)?;

    // --- 7. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown({
            let shutdown = shutdown.clone();
            async move {
                tokio::signal::ctrl_c().await.ok();
                info!("Shutdown signal received");
                shutdown.cancel();
            }
        })
        .await?;

    shutdown.cancel();
    follower
        .await
        .map_err(|e| ApiError::Internal(format!("Auth follower panicked: {}", e)))?;

    Ok(())
}
