//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `PreferencesService` port from the `core` crate. It reads and writes the
//! `user_preferences` table of the hosted Postgres database using `sqlx`.

use async_trait::async_trait;
use datum_core::domain::{Gender, Preferences, ReaderType, ReadingLevel};
use datum_core::ports::{PortError, PortResult, PreferencesService};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `PreferencesService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct PreferencesRecord {
    name: Option<String>,
    age: Option<i32>,
    gender: Option<String>,
    reader_type: String,
    reading_level: String,
    genres: Vec<String>,
    favorite_categories: Vec<String>,
    profile_url: Option<String>,
}

fn corrupt(column: &str, err: impl std::fmt::Display) -> PortError {
    PortError::Unexpected(format!("Bad value in user_preferences.{}: {}", column, err))
}

impl PreferencesRecord {
    fn into_domain(self) -> PortResult<Preferences> {
        let gender = self
            .gender
            .filter(|g| !g.is_empty())
            .map(|g| g.parse::<Gender>())
            .transpose()
            .map_err(|e| corrupt("gender", e))?;

        Ok(Preferences {
            genres: self.genres,
            reading_level: self
                .reading_level
                .parse::<ReadingLevel>()
                .map_err(|e| corrupt("reading_level", e))?,
            name: self.name,
            age: self
                .age
                .map(u32::try_from)
                .transpose()
                .map_err(|e| corrupt("age", e))?,
            gender,
            reader_type: self
                .reader_type
                .parse::<ReaderType>()
                .map_err(|e| corrupt("reader_type", e))?,
            favorite_categories: self.favorite_categories,
            profile_image: self.profile_url,
        })
    }
}

//=========================================================================================
// `PreferencesService` Trait Implementation
//=========================================================================================

#[async_trait]
impl PreferencesService for DbAdapter {
    async fn upsert_preferences(&self, user_id: Uuid, preferences: &Preferences) -> PortResult<()> {
        let age = preferences
            .age
            .map(i32::try_from)
            .transpose()
            .map_err(|e| PortError::Unexpected(format!("Age out of range: {}", e)))?;

        sqlx::query(
            "INSERT INTO user_preferences \
                (user_id, name, age, gender, reader_type, reading_level, genres, favorite_categories, profile_url, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now()) \
             ON CONFLICT (user_id) DO UPDATE SET \
                name = EXCLUDED.name, \
                age = EXCLUDED.age, \
                gender = EXCLUDED.gender, \
                reader_type = EXCLUDED.reader_type, \
                reading_level = EXCLUDED.reading_level, \
                genres = EXCLUDED.genres, \
                favorite_categories = EXCLUDED.favorite_categories, \
                profile_url = EXCLUDED.profile_url, \
                updated_at = now()",
        )
        .bind(user_id)
        .bind(&preferences.name)
        .bind(age)
        .bind(preferences.gender.map(Gender::as_str))
        .bind(preferences.reader_type.as_str())
        .bind(preferences.reading_level.as_str())
        .bind(&preferences.genres)
        .bind(&preferences.favorite_categories)
        .bind(&preferences.profile_image)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn get_preferences(&self, user_id: Uuid) -> PortResult<Option<Preferences>> {
        let record = sqlx::query_as::<_, PreferencesRecord>(
            "SELECT name, age, gender, reader_type, reading_level, genres, \
                    favorite_categories, profile_url \
             FROM user_preferences WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        record.map(PreferencesRecord::into_domain).transpose()
    }
}
