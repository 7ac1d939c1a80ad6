//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the screen endpoints (views, home shelves,
//! book list, book detail, profile, theme) and the master definition for the
//! OpenAPI specification.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use datum_core::catalog::{self, format_rating, ShelfView, HOME_SHELVES};
use datum_core::domain::{BookDetail, Preferences, Session, Theme};
use datum_core::profile::ProfileView;
use datum_core::routing::{select_view, Route, View};
use datum_core::search::SearchListing;
use datum_core::theme;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::web::auth::{
    AuthResponse, LoginRequest, MessageResponse, NextResponse, ResetPasswordRequest, SignupRequest,
};
use crate::web::error::{fail, fetch_failure, ErrorResponse, HandlerResult};
use crate::web::onboarding::{ImageUpload, UploadResponse};
use crate::web::state::AppState;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        crate::web::auth::reset_password_handler,
        crate::web::auth::session_handler,
        view_handler,
        home_handler,
        list_books_handler,
        book_detail_handler,
        profile_handler,
        get_theme_handler,
        toggle_theme_handler,
        crate::web::onboarding::options_handler,
        crate::web::onboarding::submit_handler,
        crate::web::onboarding::upload_image_handler,
        crate::web::onboarding::get_preferences_handler,
    ),
    components(
        schemas(
            SignupRequest,
            LoginRequest,
            ResetPasswordRequest,
            AuthResponse,
            NextResponse,
            MessageResponse,
            ErrorResponse,
            ThemeResponse,
            ImageUpload,
            UploadResponse,
        )
    ),
    tags(
        (name = "Datum API", description = "Screen data and actions for the book discovery app.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ViewQuery {
    /// The path the UI is about to show, e.g. `/books`.
    pub path: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BooksQuery {
    /// Search text. Absent loads the default listing; blank keeps the current one.
    pub q: Option<String>,
}

#[derive(Serialize)]
pub struct HomeResponse {
    pub greeting: String,
    pub shelves: Vec<ShelfView>,
}

#[derive(Serialize)]
pub struct BookListResponse {
    pub heading: &'static str,
    #[serde(flatten)]
    pub listing: SearchListing,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDetailResponse {
    #[serde(flatten)]
    pub book: BookDetail,
    /// The rating as displayed, with one decimal place.
    pub rating_label: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThemeResponse {
    pub theme: String,
    pub is_dark: bool,
}

impl From<Theme> for ThemeResponse {
    fn from(theme: Theme) -> Self {
        Self {
            theme: theme.to_string(),
            is_dark: theme.is_dark(),
        }
    }
}

//=========================================================================================
// Screen Handlers
//=========================================================================================

/// Decide what the UI shows for a path.
#[utoipa::path(
    get,
    path = "/views",
    params(ViewQuery),
    responses((status = 200, description = "The view to render or a redirect"))
)]
pub async fn view_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewQuery>,
) -> Json<View> {
    let session = state.store.session();
    Json(select_view(session.as_ref(), &Route::parse(&query.path)))
}

/// The dashboard: greeting and the home shelves.
#[utoipa::path(
    get,
    path = "/home",
    responses(
        (status = 200, description = "Greeting and shelves; failed shelves carry their own error"),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
pub async fn home_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Json<HomeResponse> {
    let shelves = catalog::load_shelves(state.catalog.as_ref(), &HOME_SHELVES).await;
    Json(HomeResponse {
        greeting: format!("Welcome back, {}", session.display_name()),
        shelves,
    })
}

/// Run a search for the book list screen and return its listing.
#[utoipa::path(
    get,
    path = "/books",
    params(BooksQuery),
    responses(
        (status = 200, description = "The current listing; a fetch failure shows up in its `error`"),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
pub async fn list_books_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BooksQuery>,
) -> Json<BookListResponse> {
    state
        .search
        .run(state.catalog.as_ref(), query.q.as_deref())
        .await;

    let listing = state.search.listing().await;
    Json(BookListResponse {
        heading: listing.heading(),
        listing,
    })
}

/// One book with its details.
#[utoipa::path(
    get,
    path = "/books/{id}",
    params(("id" = String, Path, description = "The volume id")),
    responses(
        (status = 200, description = "The book"),
        (status = 404, description = "No such book", body = ErrorResponse),
        (status = 502, description = "The book API failed", body = ErrorResponse)
    )
)]
pub async fn book_detail_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> HandlerResult<Json<BookDetailResponse>> {
    let book = catalog::fetch_book(state.catalog.as_ref(), &id)
        .await
        .map_err(|e| {
            error!(id = %id, cause = %e.cause, "Error fetching book details");
            fetch_failure(e)
        })?;

    Ok(Json(BookDetailResponse {
        rating_label: format_rating(book.summary.rating),
        book,
    }))
}

/// The profile page.
#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "Profile, achievements and stats"),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
pub async fn profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Json<ProfileView> {
    let preferences: Preferences = state.store.preferences();
    Json(ProfileView::build(&session, &preferences))
}

/// The persisted theme.
#[utoipa::path(
    get,
    path = "/theme",
    responses((status = 200, description = "Current theme", body = ThemeResponse))
)]
pub async fn get_theme_handler(
    State(state): State<Arc<AppState>>,
) -> HandlerResult<Json<ThemeResponse>> {
    let current = state.themes.load().await.map_err(|e| {
        error!("Failed to load theme: {}", e);
        fail(
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load theme.",
        )
    })?;
    Ok(Json(current.into()))
}

/// Switch between light and dark.
#[utoipa::path(
    post,
    path = "/theme/toggle",
    responses((status = 200, description = "The new theme", body = ThemeResponse))
)]
pub async fn toggle_theme_handler(
    State(state): State<Arc<AppState>>,
) -> HandlerResult<Json<ThemeResponse>> {
    let next = theme::toggle(state.themes.as_ref()).await.map_err(|e| {
        error!("Failed to toggle theme: {}", e);
        fail(
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to save theme.",
        )
    })?;
    Ok(Json(next.into()))
}
