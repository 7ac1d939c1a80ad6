//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub google_books_api_url: String,
    pub google_books_api_key: Option<String>,
    pub profile_image_bucket: String,
    pub theme_file: PathBuf,
    /// Where the UI is served from; used for CORS and auth email redirects.
    pub app_origin: String,
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

fn with_default(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Server and Database Settings ---
        let bind_address_str = with_default("BIND_ADDRESS", "0.0.0.0:3000");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = required("DATABASE_URL")?;

        let log_level_str = with_default("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Hosted Backend ---
        let supabase_url = required("SUPABASE_URL")?.trim_end_matches('/').to_string();
        let supabase_anon_key = required("SUPABASE_ANON_KEY")?;
        let profile_image_bucket = with_default("PROFILE_IMAGE_BUCKET", "profile-images");

        // --- Book Metadata API ---
        let google_books_api_url =
            with_default("GOOGLE_BOOKS_API_URL", "https://www.googleapis.com/books/v1")
                .trim_end_matches('/')
                .to_string();
        let google_books_api_key = std::env::var("GOOGLE_BOOKS_API_KEY").ok();

        // --- Local UI Settings ---
        let theme_file = PathBuf::from(with_default("THEME_FILE", "./theme.json"));
        let app_origin = with_default("APP_ORIGIN", "http://localhost:5173")
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            supabase_url,
            supabase_anon_key,
            google_books_api_url,
            google_books_api_key,
            profile_image_bucket,
            theme_file,
            app_origin,
        })
    }
}
