//! crates/datum_core/src/onboarding.rs
//!
//! The profile form a new reader fills in: the choices it offers, how its
//! values become `Preferences`, and saving it.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::{Gender, Preferences, ReaderType, ReadingLevel, Session};
use crate::errors::{SaveError, UploadError};
use crate::ports::{ObjectStorageService, PreferencesService};
use crate::routing::Route;
use crate::store::AppStore;

pub const MIN_AGE: u32 = 13;

pub const GENRES: [&str; 14] = [
    "Fiction",
    "Non-Fiction",
    "Mystery",
    "Science Fiction",
    "Fantasy",
    "Romance",
    "Thriller",
    "Horror",
    "Biography",
    "History",
    "Science",
    "Technology",
    "Self-Help",
    "Poetry",
];

pub const CATEGORIES: [&str; 14] = [
    "Bestsellers",
    "Classics",
    "Contemporary",
    "Award Winners",
    "Young Adult",
    "Children",
    "Academic",
    "Religious",
    "Business",
    "Art",
    "Cooking",
    "Travel",
    "Sports",
    "Music",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReaderTypeOption {
    pub id: ReaderType,
    pub label: &'static str,
    pub description: &'static str,
}

pub const READER_TYPES: [ReaderTypeOption; 4] = [
    ReaderTypeOption {
        id: ReaderType::Casual,
        label: "Casual Reader",
        description: "Reading for leisure and entertainment",
    },
    ReaderTypeOption {
        id: ReaderType::Avid,
        label: "Avid Reader",
        description: "Regular reading habit, diverse interests",
    },
    ReaderTypeOption {
        id: ReaderType::Professional,
        label: "Professional",
        description: "Reading for work or specific expertise",
    },
    ReaderTypeOption {
        id: ReaderType::Scholar,
        label: "Scholar",
        description: "Academic or research-focused reading",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadingLevelOption {
    pub id: ReadingLevel,
    pub label: &'static str,
}

pub const READING_LEVELS: [ReadingLevelOption; 3] = [
    ReadingLevelOption {
        id: ReadingLevel::Beginner,
        label: "Beginner",
    },
    ReadingLevelOption {
        id: ReadingLevel::Intermediate,
        label: "Intermediate",
    },
    ReadingLevelOption {
        id: ReadingLevel::Advanced,
        label: "Advanced",
    },
];

/// Every choice the form offers, in display order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingOptions {
    pub genres: &'static [&'static str],
    pub categories: &'static [&'static str],
    pub reader_types: &'static [ReaderTypeOption],
    pub reading_levels: &'static [ReadingLevelOption],
}

pub fn options() -> OnboardingOptions {
    OnboardingOptions {
        genres: &GENRES,
        categories: &CATEGORIES,
        reader_types: &READER_TYPES,
        reading_levels: &READING_LEVELS,
    }
}

/// Removes `item` if it is selected, appends it otherwise.
pub fn toggle_selection(selected: &[String], item: &str) -> Vec<String> {
    if selected.iter().any(|s| s == item) {
        selected.iter().filter(|s| *s != item).cloned().collect()
    } else {
        let mut next = selected.to_vec();
        next.push(item.to_string());
        next
    }
}

/// The avatar used when the reader did not upload a picture.
pub fn default_avatar_url(gender: Gender, age: u32) -> String {
    format!("https://api.dicebear.com/7.x/avataaars/svg?seed={gender}-{age}")
}

//=========================================================================================
// The form
//=========================================================================================

/// The values the form submits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OnboardingForm {
    pub name: String,
    pub age: Option<u32>,
    pub gender: String,
    pub reader_type: ReaderType,
    pub reading_level: ReadingLevel,
    pub selected_genres: Vec<String>,
    pub favorite_categories: Vec<String>,
    pub profile_image: Option<String>,
}

fn checked_selection(
    selected: &[String],
    allowed: &[&str],
    what: &str,
) -> Result<Vec<String>, SaveError> {
    let mut kept: Vec<String> = Vec::with_capacity(selected.len());
    for item in selected {
        if !allowed.contains(&item.as_str()) {
            return Err(SaveError::Invalid(format!("Unknown {what}: {item}")));
        }
        if !kept.contains(item) {
            kept.push(item.clone());
        }
    }
    Ok(kept)
}

impl OnboardingForm {
    /// Checks the required fields and builds the preferences they describe.
    pub fn validate(&self) -> Result<Preferences, SaveError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(SaveError::Invalid("Name is required.".into()));
        }

        let age = match self.age {
            Some(age) if age >= MIN_AGE => age,
            _ => {
                return Err(SaveError::Invalid(format!(
                    "You must be at least {MIN_AGE} years old."
                )))
            }
        };

        let gender: Gender = self
            .gender
            .parse()
            .map_err(|_| SaveError::Invalid("Please select a gender.".into()))?;

        Ok(Preferences {
            genres: checked_selection(&self.selected_genres, &GENRES, "genre")?,
            reading_level: self.reading_level,
            name: Some(name.to_string()),
            age: Some(age),
            gender: Some(gender),
            reader_type: self.reader_type,
            favorite_categories: checked_selection(
                &self.favorite_categories,
                &CATEGORIES,
                "category",
            )?,
            profile_image: self.profile_image.clone().filter(|url| !url.is_empty()),
        })
    }
}

/// Saves the form: persists the row, then replaces the store's preferences and
/// copies the identity fields into the session metadata.
pub async fn submit(
    store: &AppStore,
    repo: &dyn PreferencesService,
    session: &Session,
    form: &OnboardingForm,
) -> Result<Route, SaveError> {
    let preferences = form.validate()?;

    let mut persisted = preferences.clone();
    if persisted.profile_image.is_none() {
        if let (Some(gender), Some(age)) = (persisted.gender, persisted.age) {
            persisted.profile_image = Some(default_avatar_url(gender, age));
        }
    }

    repo.upsert_preferences(session.id, &persisted)
        .await
        .map_err(|e| {
            error!(user_id = %session.id, "Error saving preferences: {}", e);
            SaveError::Persistence(e.to_string())
        })?;

    let mut metadata = Map::new();
    metadata.insert("name".into(), json!(preferences.name));
    metadata.insert("age".into(), json!(preferences.age));
    metadata.insert("gender".into(), json!(preferences.gender));
    if let Some(url) = &preferences.profile_image {
        metadata.insert("profileImage".into(), Value::String(url.clone()));
    }

    store.set_preferences(preferences);
    store.merge_identity_metadata(metadata);
    info!(user_id = %session.id, "Preferences saved");
    Ok(Route::Home)
}

const MAX_EXTENSION_LEN: usize = 8;
const FALLBACK_EXTENSION: &str = "png";

/// The extension of a client-supplied file name, reduced to ASCII
/// alphanumerics. Anything else, including path separators, yields the
/// fallback.
fn image_extension(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((_, ext))
            if !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => FALLBACK_EXTENSION.to_string(),
    }
}

/// Names the stored object `{user_id}-{random}.{extension}`. Only the
/// extension comes from the client, so the name is always one path segment.
pub fn profile_image_object_name(user_id: Uuid, file_name: &str) -> String {
    format!(
        "{}-{}.{}",
        user_id,
        Uuid::new_v4().simple(),
        image_extension(file_name)
    )
}

/// Stores an uploaded profile picture and returns its public URL.
pub async fn upload_profile_image(
    storage: &dyn ObjectStorageService,
    session: &Session,
    file_name: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> Result<String, UploadError> {
    if !content_type.starts_with("image/") {
        return Err(UploadError {
            cause: format!("refusing non-image upload of type '{content_type}'"),
        });
    }

    let object_name = profile_image_object_name(session.id, file_name);
    storage
        .upload(&object_name, content_type, bytes)
        .await
        .map_err(|e| {
            error!(user_id = %session.id, "Error uploading image: {}", e);
            UploadError::from(e)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{PortError, PortResult};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    fn session() -> Session {
        Session {
            id: Uuid::new_v4(),
            email: Some("new@example.com".into()),
            created_at: Utc::now(),
            metadata: Default::default(),
        }
    }

    fn form() -> OnboardingForm {
        OnboardingForm {
            name: " Nia ".into(),
            age: Some(27),
            gender: "female".into(),
            reader_type: ReaderType::Avid,
            reading_level: ReadingLevel::Advanced,
            selected_genres: vec!["Fantasy".into(), "Poetry".into()],
            favorite_categories: vec!["Classics".into()],
            profile_image: None,
        }
    }

    #[derive(Default)]
    struct MemoryPreferences {
        rows: Mutex<Vec<(Uuid, Preferences)>>,
        fail: bool,
    }

    #[async_trait]
    impl PreferencesService for MemoryPreferences {
        async fn upsert_preferences(&self, user_id: Uuid, preferences: &Preferences) -> PortResult<()> {
            if self.fail {
                return Err(PortError::Unexpected("connection refused".into()));
            }
            self.rows
                .lock()
                .expect("rows lock")
                .push((user_id, preferences.clone()));
            Ok(())
        }

        async fn get_preferences(&self, user_id: Uuid) -> PortResult<Option<Preferences>> {
            Ok(self
                .rows
                .lock()
                .expect("rows lock")
                .iter()
                .rev()
                .find(|(id, _)| *id == user_id)
                .map(|(_, p)| p.clone()))
        }
    }

    struct RecordingStorage {
        names: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ObjectStorageService for RecordingStorage {
        async fn upload(&self, object_name: &str, _content_type: &str, _bytes: Vec<u8>) -> PortResult<String> {
            self.names.lock().expect("names lock").push(object_name.to_string());
            Ok(format!("https://cdn.example/{object_name}"))
        }
    }

    #[test]
    fn toggling_adds_then_removes() {
        let once = toggle_selection(&[], "Fantasy");
        assert_eq!(once, vec!["Fantasy".to_string()]);
        let twice = toggle_selection(&once, "Poetry");
        assert_eq!(twice, vec!["Fantasy".to_string(), "Poetry".to_string()]);
        assert_eq!(toggle_selection(&twice, "Fantasy"), vec!["Poetry".to_string()]);
    }

    #[test]
    fn validation_requires_name_age_and_gender() {
        let mut f = form();
        f.name = "  ".into();
        assert_eq!(f.validate(), Err(SaveError::Invalid("Name is required.".into())));

        let mut f = form();
        f.age = Some(12);
        assert!(matches!(f.validate(), Err(SaveError::Invalid(m)) if m.contains("13")));

        let mut f = form();
        f.gender = String::new();
        assert_eq!(f.validate(), Err(SaveError::Invalid("Please select a gender.".into())));
    }

    #[test]
    fn validation_rejects_unknown_genres_and_drops_duplicates() {
        let mut f = form();
        f.selected_genres = vec!["Fantasy".into(), "Fantasy".into()];
        assert_eq!(f.validate().map(|p| p.genres), Ok(vec!["Fantasy".to_string()]));

        f.selected_genres.push("Cyberpunk".into());
        assert_eq!(
            f.validate(),
            Err(SaveError::Invalid("Unknown genre: Cyberpunk".into()))
        );
    }

    #[tokio::test]
    async fn submit_persists_then_replaces_preferences() {
        let store = AppStore::new();
        let s = session();
        store.set_session(Some(s.clone()));
        let repo = MemoryPreferences::default();

        let next = submit(&store, &repo, &s, &form()).await.expect("saved");
        assert_eq!(next, Route::Home);

        let prefs = store.preferences();
        assert_eq!(prefs.name.as_deref(), Some("Nia"));
        assert_eq!(prefs.genres, vec!["Fantasy".to_string(), "Poetry".to_string()]);
        assert!(prefs.profile_image.is_none());

        let stored = repo.get_preferences(s.id).await.expect("read").expect("row");
        assert_eq!(
            stored.profile_image.as_deref(),
            Some("https://api.dicebear.com/7.x/avataaars/svg?seed=female-27")
        );

        let merged = store.session().expect("still signed in");
        assert_eq!(merged.metadata_name(), Some("Nia"));
        assert_eq!(merged.metadata_age(), Some(27));
    }

    #[tokio::test]
    async fn failed_save_leaves_the_store_alone() {
        let store = AppStore::new();
        let s = session();
        let repo = MemoryPreferences {
            fail: true,
            ..Default::default()
        };

        let err = submit(&store, &repo, &s, &form()).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to save preferences. Please try again.");
        assert_eq!(store.preferences(), Preferences::default());
    }

    #[tokio::test]
    async fn upload_names_the_object_after_the_user() {
        let storage = RecordingStorage {
            names: Mutex::new(Vec::new()),
        };
        let s = session();

        let url = upload_profile_image(&storage, &s, "me.final.png", "image/png", vec![1, 2, 3])
            .await
            .expect("uploaded");

        let names = storage.names.lock().expect("names lock").clone();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with(&format!("{}-", s.id)));
        assert!(names[0].ends_with(".png"));
        assert_eq!(url, format!("https://cdn.example/{}", names[0]));
    }

    #[test]
    fn object_names_stay_inside_the_user_namespace() {
        let user = Uuid::nil();
        let prefix = format!("{}-", user);

        for hostile in [
            "x./../../other-bucket/evil",
            "avatar.png/../../x",
            "a.p%2Fng",
            "a.averyveryverylongextension",
            "no-extension",
            "trailing.",
        ] {
            let name = profile_image_object_name(user, hostile);
            assert!(name.starts_with(&prefix), "{hostile} -> {name}");
            assert!(!name.contains('/'), "{hostile} -> {name}");
            assert!(!name.contains(".."), "{hostile} -> {name}");
            assert!(name.ends_with(".png"), "{hostile} -> {name}");
        }

        assert!(profile_image_object_name(user, "Me.JPEG").ends_with(".jpeg"));
        assert!(profile_image_object_name(user, "me.final.webp").ends_with(".webp"));
    }

    #[tokio::test]
    async fn non_images_are_refused() {
        let storage = RecordingStorage {
            names: Mutex::new(Vec::new()),
        };
        let err = upload_profile_image(&storage, &session(), "notes.txt", "text/plain", vec![])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to upload image. Please try again.");
        assert!(storage.names.lock().expect("names lock").is_empty());
    }
}
