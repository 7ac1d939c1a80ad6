//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for signup, login, logout, password reset, and
//! reading the current session.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use datum_core::auth;
use datum_core::domain::Session;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::error::{auth_failure, ErrorResponse, HandlerResult};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub email: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: Option<String>,
    /// Where the UI should go next.
    pub next: String,
}

#[derive(Serialize, ToSchema)]
pub struct NextResponse {
    pub next: String,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub signed_in: bool,
    pub session: Option<Session>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Weak password or rejected by the provider", body = ErrorResponse),
        (status = 502, description = "Auth provider unavailable", body = ErrorResponse)
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> HandlerResult<impl IntoResponse> {
    let redirect_to = format!("{}/", state.config.app_origin);
    let signed_in = auth::sign_up(
        &state.store,
        state.auth.as_ref(),
        &req.email,
        &req.password,
        &redirect_to,
    )
    .await
    .map_err(auth_failure)?;

    let response = AuthResponse {
        user_id: signed_in.session.id,
        email: signed_in.session.email,
        next: signed_in.next.path(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /auth/login - Sign in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 502, description = "Auth provider unavailable", body = ErrorResponse)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> HandlerResult<Json<AuthResponse>> {
    let signed_in = auth::sign_in(&state.store, state.auth.as_ref(), &req.email, &req.password)
        .await
        .map_err(auth_failure)?;

    Ok(Json(AuthResponse {
        user_id: signed_in.session.id,
        email: signed_in.session.email,
        next: signed_in.next.path(),
    }))
}

/// POST /auth/logout - Sign out
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Signed out", body = NextResponse),
        (status = 502, description = "Provider sign-out failed; the local session is cleared anyway", body = ErrorResponse)
    )
)]
pub async fn logout_handler(State(state): State<Arc<AppState>>) -> HandlerResult<Json<NextResponse>> {
    let next = auth::sign_out(&state.store, state.auth.as_ref())
        .await
        .map_err(auth_failure)?;
    Ok(Json(NextResponse { next: next.path() }))
}

/// POST /auth/reset-password - Email a password reset link
#[utoipa::path(
    post,
    path = "/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Reset link sent", body = MessageResponse),
        (status = 400, description = "Rejected by the provider", body = ErrorResponse)
    )
)]
pub async fn reset_password_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> HandlerResult<Json<MessageResponse>> {
    let redirect_to = format!("{}/reset-password", state.config.app_origin);
    auth::request_password_reset(state.auth.as_ref(), &req.email, &redirect_to)
        .await
        .map_err(auth_failure)?;

    Ok(Json(MessageResponse {
        message: "We've sent you a link to reset your password. Please check your inbox."
            .to_string(),
    }))
}

/// GET /session - The signed-in identity, if any
#[utoipa::path(
    get,
    path = "/session",
    responses((status = 200, description = "Current session"))
)]
pub async fn session_handler(State(state): State<Arc<AppState>>) -> Json<SessionResponse> {
    let session = state.store.session();
    Json(SessionResponse {
        signed_in: session.is_some(),
        session,
    })
}
