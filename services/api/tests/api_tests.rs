//! Integration tests for the HTTP surface, run against the real router with
//! in-memory ports.

use api_lib::config::Config;
use api_lib::web::{build_router, state::AppState};
use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use chrono::Utc;
use datum_core::catalog::{ImageLinks, SearchPage, VolumeInfo, VolumeRecord};
use datum_core::domain::{AuthEvent, Preferences, Session, Theme};
use datum_core::ports::{
    AuthService, CatalogService, ObjectStorageService, PortError, PortResult, PreferencesService,
    ThemeService,
};
use datum_core::search::BookSearch;
use datum_core::store::AppStore;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use uuid::Uuid;

//=========================================================================================
// Fake Ports
//=========================================================================================

struct FakeAuth {
    user_id: Uuid,
    events: broadcast::Sender<AuthEvent>,
    fail_sign_out: bool,
}

impl FakeAuth {
    fn new() -> Self {
        let (events, _) = broadcast::channel(8);
        Self {
            user_id: Uuid::new_v4(),
            events,
            fail_sign_out: false,
        }
    }

    fn session(&self, email: &str) -> Session {
        Session {
            id: self.user_id,
            email: Some(email.to_string()),
            created_at: Utc::now(),
            metadata: Default::default(),
        }
    }
}

#[async_trait]
impl AuthService for FakeAuth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> PortResult<Session> {
        if password == "correct-horse" {
            Ok(self.session(email))
        } else {
            Err(PortError::Rejected("Invalid login credentials".into()))
        }
    }

    async fn sign_up(&self, email: &str, _password: &str, _redirect_to: &str) -> PortResult<Session> {
        if email.ends_with("@taken.example") {
            Err(PortError::Rejected("User already registered".into()))
        } else {
            Ok(self.session(email))
        }
    }

    async fn sign_out(&self) -> PortResult<()> {
        if self.fail_sign_out {
            Err(PortError::Unexpected("network down".into()))
        } else {
            Ok(())
        }
    }

    async fn current_session(&self) -> PortResult<Option<Session>> {
        Ok(None)
    }

    async fn reset_password_for_email(&self, _email: &str, _redirect_to: &str) -> PortResult<()> {
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[derive(Default)]
struct FakeStorage {
    uploads: Mutex<Vec<(String, String, usize)>>,
}

#[async_trait]
impl ObjectStorageService for FakeStorage {
    async fn upload(&self, object_name: &str, content_type: &str, bytes: Vec<u8>) -> PortResult<String> {
        self.uploads
            .lock()
            .unwrap()
            .push((object_name.to_string(), content_type.to_string(), bytes.len()));
        Ok(format!("https://cdn.example/profile-images/{object_name}"))
    }
}

#[derive(Default)]
struct FakePreferences {
    rows: Mutex<HashMap<Uuid, Preferences>>,
}

#[async_trait]
impl PreferencesService for FakePreferences {
    async fn upsert_preferences(&self, user_id: Uuid, preferences: &Preferences) -> PortResult<()> {
        self.rows.lock().unwrap().insert(user_id, preferences.clone());
        Ok(())
    }

    async fn get_preferences(&self, user_id: Uuid) -> PortResult<Option<Preferences>> {
        Ok(self.rows.lock().unwrap().get(&user_id).cloned())
    }
}

#[derive(Default)]
struct FakeCatalog {
    queries: Mutex<Vec<String>>,
}

fn volume(id: &str, title: &str) -> VolumeRecord {
    VolumeRecord {
        id: id.to_string(),
        volume_info: VolumeInfo {
            title: title.to_string(),
            authors: Some(vec!["Octavia Butler".into()]),
            average_rating: Some(4.0),
            image_links: Some(ImageLinks {
                thumbnail: Some("http://books.example/cover.jpg".into()),
                small_thumbnail: None,
            }),
            ..Default::default()
        },
    }
}

#[async_trait]
impl CatalogService for FakeCatalog {
    async fn search(&self, query: &str, _start_index: u32) -> PortResult<SearchPage> {
        self.queries.lock().unwrap().push(query.to_string());
        if query == "award winning fiction" || query == "explode" {
            return Err(PortError::Unexpected("HTTP 500".into()));
        }
        Ok(SearchPage {
            items: vec![volume("kindred", "Kindred")],
            total_items: 1,
        })
    }

    async fn get_by_id(&self, id: &str) -> PortResult<VolumeRecord> {
        match id {
            "kindred" => Ok(volume("kindred", "Kindred")),
            "broken" => Err(PortError::Unexpected("HTTP 503".into())),
            other => Err(PortError::NotFound(other.to_string())),
        }
    }
}

#[derive(Default)]
struct FakeThemes {
    current: Mutex<Theme>,
}

#[async_trait]
impl ThemeService for FakeThemes {
    async fn load(&self) -> PortResult<Theme> {
        Ok(*self.current.lock().unwrap())
    }

    async fn save(&self, theme: Theme) -> PortResult<()> {
        *self.current.lock().unwrap() = theme;
        Ok(())
    }
}

//=========================================================================================
// Test Harness
//=========================================================================================

struct Harness {
    server: TestServer,
    store: Arc<AppStore>,
    storage: Arc<FakeStorage>,
    preferences: Arc<FakePreferences>,
    catalog: Arc<FakeCatalog>,
}

fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://unused".into(),
        log_level: tracing::Level::INFO,
        supabase_url: "http://supabase.invalid".into(),
        supabase_anon_key: "anon".into(),
        google_books_api_url: "http://books.invalid".into(),
        google_books_api_key: None,
        profile_image_bucket: "profile-images".into(),
        theme_file: "theme.json".into(),
        app_origin: "http://localhost:5173".into(),
    }
}

fn harness_with(auth: FakeAuth) -> Harness {
    let store = Arc::new(AppStore::new());
    let storage = Arc::new(FakeStorage::default());
    let preferences = Arc::new(FakePreferences::default());
    let catalog = Arc::new(FakeCatalog::default());

    let state = Arc::new(AppState {
        config: Arc::new(test_config()),
        store: store.clone(),
        search: Arc::new(BookSearch::new()),
        auth: Arc::new(auth),
        storage: storage.clone(),
        preferences: preferences.clone(),
        catalog: catalog.clone(),
        themes: Arc::new(FakeThemes::default()),
    });

    let app = build_router(state).expect("Failed to build router");
    let server = TestServer::new(app).expect("Failed to create test server");
    Harness {
        server,
        store,
        storage,
        preferences,
        catalog,
    }
}

fn harness() -> Harness {
    harness_with(FakeAuth::new())
}

async fn signed_in() -> Harness {
    let h = harness();
    h.server
        .post("/auth/login")
        .json(&json!({ "email": "mira@example.com", "password": "correct-horse" }))
        .await
        .assert_status_ok();
    h
}

//=========================================================================================
// Auth
//=========================================================================================

#[tokio::test]
async fn test_login_sets_session_and_points_home() {
    let h = harness();

    let response = h
        .server
        .post("/auth/login")
        .json(&json!({ "email": "mira@example.com", "password": "correct-horse" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["next"], "/");
    assert_eq!(body["email"], "mira@example.com");
    assert!(h.store.is_signed_in());
}

#[tokio::test]
async fn test_login_with_bad_password_keeps_signed_out() {
    let h = harness();

    let response = h
        .server
        .post("/auth/login")
        .json(&json!({ "email": "mira@example.com", "password": "nope" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid email or password. Please try again.");
    assert!(!h.store.is_signed_in());
}

#[tokio::test]
async fn test_signup_with_short_password_is_rejected_locally() {
    let h = harness();

    let response = h
        .server
        .post("/auth/signup")
        .json(&json!({ "email": "new@example.com", "password": "12345" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Password must be at least 6 characters long.");
    assert!(!h.store.is_signed_in());
}

#[tokio::test]
async fn test_signup_points_to_profile_setup() {
    let h = harness();

    let response = h
        .server
        .post("/auth/signup")
        .json(&json!({ "email": "new@example.com", "password": "123456" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["next"], "/profile");
    assert!(h.store.is_signed_in());
}

#[tokio::test]
async fn test_signup_surfaces_provider_message() {
    let h = harness();

    let response = h
        .server
        .post("/auth/signup")
        .json(&json!({ "email": "old@taken.example", "password": "123456" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "User already registered");
}

#[tokio::test]
async fn test_logout_clears_session_even_when_provider_fails() {
    let mut auth = FakeAuth::new();
    auth.fail_sign_out = true;
    let h = harness_with(auth);
    h.server
        .post("/auth/login")
        .json(&json!({ "email": "mira@example.com", "password": "correct-horse" }))
        .await
        .assert_status_ok();

    let response = h.server.post("/auth/logout").await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    assert!(!h.store.is_signed_in());
}

#[tokio::test]
async fn test_session_endpoint_reports_state() {
    let h = harness();
    let body: Value = h.server.get("/session").await.json();
    assert_eq!(body["signed_in"], false);
    assert!(body["session"].is_null());

    let h = signed_in().await;
    let body: Value = h.server.get("/session").await.json();
    assert_eq!(body["signed_in"], true);
    assert_eq!(body["session"]["email"], "mira@example.com");
}

#[tokio::test]
async fn test_reset_password_confirms() {
    let h = harness();

    let response = h
        .server
        .post("/auth/reset-password")
        .json(&json!({ "email": "mira@example.com" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["message"].as_str().unwrap().contains("reset your password"));
}

//=========================================================================================
// Views and Protection
//=========================================================================================

#[tokio::test]
async fn test_views_follow_signed_in_state() {
    let h = harness();
    let body: Value = h
        .server
        .get("/views")
        .add_query_param("path", "/books")
        .await
        .json();
    assert_eq!(body, json!({ "view": "redirect", "to": "/login" }));

    let h = signed_in().await;
    let body: Value = h
        .server
        .get("/views")
        .add_query_param("path", "/")
        .await
        .json();
    assert_eq!(body, json!({ "view": "redirect", "to": "/dashboard" }));

    let body: Value = h
        .server
        .get("/views")
        .add_query_param("path", "/dashboard")
        .await
        .json();
    assert_eq!(body["greeting"], "Welcome back, mira");
}

#[tokio::test]
async fn test_protected_routes_require_a_session() {
    let h = harness();

    for path in ["/home", "/books", "/profile", "/preferences"] {
        let response = h.server.get(path).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}

//=========================================================================================
// Books
//=========================================================================================

#[tokio::test]
async fn test_home_keeps_other_shelves_when_one_fails() {
    let h = signed_in().await;

    let response = h.server.get("/home").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["greeting"], "Welcome back, mira");
    let shelves = body["shelves"].as_array().unwrap();
    assert_eq!(shelves.len(), 3);
    assert_eq!(shelves[0]["books"][0]["coverUrl"], "https://books.example/cover.jpg");
    assert_eq!(shelves[1]["error"], "Failed to fetch books. Please try again.");
    assert!(shelves[1]["books"].as_array().unwrap().is_empty());
    assert_eq!(shelves[2]["books"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_books_default_listing_and_search() {
    let h = signed_in().await;

    let body: Value = h.server.get("/books").await.json();
    assert_eq!(body["heading"], "Popular Books");
    assert_eq!(body["books"][0]["title"], "Kindred");

    let body: Value = h
        .server
        .get("/books")
        .add_query_param("q", "butler")
        .await
        .json();
    assert_eq!(body["heading"], "Search Results");
    assert_eq!(body["query"], "butler");

    let queries = h.catalog.queries.lock().unwrap().clone();
    assert_eq!(queries, vec!["bestsellers fiction 2024", "butler"]);
}

#[tokio::test]
async fn test_blank_search_leaves_listing_untouched() {
    let h = signed_in().await;
    h.server.get("/books").add_query_param("q", "butler").await;

    let body: Value = h
        .server
        .get("/books")
        .add_query_param("q", "   ")
        .await
        .json();

    assert_eq!(body["query"], "butler");
    assert_eq!(h.catalog.queries.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_search_reports_message() {
    let h = signed_in().await;

    let body: Value = h
        .server
        .get("/books")
        .add_query_param("q", "explode")
        .await
        .json();

    assert_eq!(body["error"], "Failed to fetch books. Please try again.");
    assert!(body["books"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_search_replaces_previous_results() {
    let h = signed_in().await;
    h.server.get("/books").add_query_param("q", "butler").await;

    let body: Value = h
        .server
        .get("/books")
        .add_query_param("q", "explode")
        .await
        .json();

    assert_eq!(body["heading"], "Search Results");
    assert_eq!(body["query"], "explode");
    assert!(body["books"].as_array().unwrap().is_empty());
    assert_eq!(body["error"], "Failed to fetch books. Please try again.");
}

#[tokio::test]
async fn test_book_detail_formats_rating() {
    let h = harness();

    let response = h.server.get("/books/kindred").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["title"], "Kindred");
    assert_eq!(body["ratingLabel"], "4.0");
    assert_eq!(body["description"], "No description available.");
}

#[tokio::test]
async fn test_book_detail_errors() {
    let h = harness();

    h.server
        .get("/books/missing")
        .await
        .assert_status_not_found();
    h.server
        .get("/books/broken")
        .await
        .assert_status(StatusCode::BAD_GATEWAY);
}

//=========================================================================================
// Onboarding, Preferences and Profile
//=========================================================================================

#[tokio::test]
async fn test_onboarding_saves_and_merges_identity() {
    let h = signed_in().await;

    let response = h
        .server
        .post("/onboarding")
        .json(&json!({
            "name": "Mira",
            "age": 29,
            "gender": "female",
            "readerType": "avid",
            "readingLevel": "advanced",
            "selectedGenres": ["Fantasy", "Mystery"],
            "favoriteCategories": ["Classics"]
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["next"], "/");

    let session = h.store.session().unwrap();
    assert_eq!(session.metadata_name(), Some("Mira"));
    assert_eq!(h.store.preferences().genres, vec!["Fantasy", "Mystery"]);

    let rows = h.preferences.rows.lock().unwrap();
    let saved = rows.get(&session.id).unwrap();
    assert!(saved
        .profile_image
        .as_deref()
        .unwrap()
        .starts_with("https://api.dicebear.com/"));
}

#[tokio::test]
async fn test_onboarding_rejects_young_readers() {
    let h = signed_in().await;

    let response = h
        .server
        .post("/onboarding")
        .json(&json!({ "name": "Kid", "age": 12, "gender": "male" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(h.preferences.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_profile_image() {
    let h = signed_in().await;
    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![0x89, b'P', b'N', b'G'])
            .file_name("me.png")
            .mime_type("image/png"),
    );

    let response = h.server.post("/onboarding/image").multipart(form).await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with("https://cdn.example/profile-images/"));
    assert!(url.ends_with(".png"));

    let uploads = h.storage.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].1, "image/png");
    assert_eq!(uploads[0].2, 4);
}

#[tokio::test]
async fn test_upload_ignores_path_segments_in_file_name() {
    let h = signed_in().await;
    let user_id = h.store.session().unwrap().id;
    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![0x89, b'P', b'N', b'G'])
            .file_name("x./../../other-bucket/evil")
            .mime_type("image/png"),
    );

    let response = h.server.post("/onboarding/image").multipart(form).await;

    response.assert_status(StatusCode::CREATED);
    let uploads = h.storage.uploads.lock().unwrap();
    let object_name = &uploads[0].0;
    assert!(object_name.starts_with(&format!("{user_id}-")));
    assert!(!object_name.contains('/'));
    assert!(object_name.ends_with(".png"));
}

#[tokio::test]
async fn test_upload_rejects_non_images() {
    let h = signed_in().await;
    let form = MultipartForm::new().add_part(
        "file",
        Part::text("hello").file_name("notes.txt").mime_type("text/plain"),
    );

    let response = h.server.post("/onboarding/image").multipart(form).await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    assert_eq!(
        response.json::<Value>()["error"],
        "Failed to upload image. Please try again."
    );
    assert!(h.storage.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_preferences_fall_back_to_defaults() {
    let h = signed_in().await;

    let body: Value = h.server.get("/preferences").await.json();

    assert_eq!(body["readingLevel"], "intermediate");
    assert_eq!(body["readerType"], "casual");
    assert!(body["genres"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_profile_shows_achievements() {
    let h = signed_in().await;

    let response = h.server.get("/profile").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["displayName"], "mira");
    assert_eq!(body["achievements"][0]["percentage"], 70.0);
    assert!(body["avatarUrl"]
        .as_str()
        .unwrap()
        .ends_with("seed=mira@example.com"));
}

//=========================================================================================
// Theme
//=========================================================================================

#[tokio::test]
async fn test_theme_toggles() {
    let h = harness();

    let body: Value = h.server.get("/theme").await.json();
    assert_eq!(body["isDark"], false);

    let body: Value = h.server.post("/theme/toggle").await.json();
    assert_eq!(body["theme"], "dark");
    assert_eq!(body["isDark"], true);

    let body: Value = h.server.get("/theme").await.json();
    assert_eq!(body["isDark"], true);
}

#[tokio::test]
async fn test_swagger_document_is_served() {
    let h = harness();

    let response = h.server.get("/api-docs/openapi.json").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["paths"]["/books/{id}"].is_object());
}
