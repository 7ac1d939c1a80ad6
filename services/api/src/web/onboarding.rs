//! services/api/src/web/onboarding.rs
//!
//! Onboarding form endpoints: the choices it offers, saving it, and uploading
//! a profile picture.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Extension, Json,
};
use datum_core::domain::{Preferences, Session};
use datum_core::onboarding::{self, OnboardingForm, OnboardingOptions};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::web::auth::NextResponse;
use crate::web::error::{fail, save_failure, upload_failure, ErrorResponse, HandlerResult};
use crate::web::state::AppState;

/// The multipart body of an image upload.
#[derive(ToSchema)]
pub struct ImageUpload {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    /// Public URL of the stored picture.
    pub url: String,
}

/// GET /onboarding/options - Genres, categories, reader types and levels
#[utoipa::path(
    get,
    path = "/onboarding/options",
    responses((status = 200, description = "Every choice the form offers"))
)]
pub async fn options_handler() -> Json<OnboardingOptions> {
    Json(onboarding::options())
}

/// POST /onboarding - Save the onboarding form
#[utoipa::path(
    post,
    path = "/onboarding",
    responses(
        (status = 200, description = "Saved; go to the dashboard", body = NextResponse),
        (status = 400, description = "The form is incomplete or invalid", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 500, description = "Could not persist the preferences", body = ErrorResponse)
    )
)]
pub async fn submit_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(form): Json<OnboardingForm>,
) -> HandlerResult<Json<NextResponse>> {
    let next = onboarding::submit(&state.store, state.preferences.as_ref(), &session, &form)
        .await
        .map_err(save_failure)?;
    Ok(Json(NextResponse { next: next.path() }))
}

/// POST /onboarding/image - Upload a profile picture
#[utoipa::path(
    post,
    path = "/onboarding/image",
    request_body(content = ImageUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Stored", body = UploadResponse),
        (status = 400, description = "Missing file", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 502, description = "Storage rejected the upload", body = ErrorResponse)
    )
)]
pub async fn upload_image_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    mut multipart: Multipart,
) -> HandlerResult<(StatusCode, Json<UploadResponse>)> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        fail(
            StatusCode::BAD_REQUEST,
            format!("Failed to read multipart data: {}", e),
        )
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("avatar.png").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field.bytes().await.map_err(|e| {
            fail(
                StatusCode::BAD_REQUEST,
                format!("Failed to read file bytes: {}", e),
            )
        })?;

        let url = onboarding::upload_profile_image(
            state.storage.as_ref(),
            &session,
            &file_name,
            &content_type,
            data.to_vec(),
        )
        .await
        .map_err(upload_failure)?;

        info!(user_id = %session.id, "Profile image uploaded");
        return Ok((StatusCode::CREATED, Json(UploadResponse { url })));
    }

    Err(fail(
        StatusCode::BAD_REQUEST,
        "Multipart form must include a file",
    ))
}

/// GET /preferences - The signed-in user's saved preferences
///
/// Reads the stored row and refreshes the store with it. A user who never
/// finished onboarding gets the defaults.
#[utoipa::path(
    get,
    path = "/preferences",
    responses(
        (status = 200, description = "Saved preferences or the defaults"),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 500, description = "Could not read preferences", body = ErrorResponse)
    )
)]
pub async fn get_preferences_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> HandlerResult<Json<Preferences>> {
    let stored = state
        .preferences
        .get_preferences(session.id)
        .await
        .map_err(|e| {
            error!(user_id = %session.id, "Failed to read preferences: {}", e);
            fail(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load preferences.",
            )
        })?;

    match stored {
        Some(preferences) => {
            state.store.set_preferences(preferences.clone());
            Ok(Json(preferences))
        }
        None => Ok(Json(state.store.preferences())),
    }
}
