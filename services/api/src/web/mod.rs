pub mod auth;
pub mod error;
pub mod middleware;
pub mod onboarding;
pub mod rest;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiError;
use crate::web::rest::ApiDoc;
use crate::web::state::AppState;

pub use middleware::require_session;

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Builds the complete application: public routes, session-protected routes,
/// CORS for the UI origin, request tracing, and the Swagger UI.
pub fn build_router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = app_state
        .config
        .app_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid APP_ORIGIN: {}", e)))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/reset-password", post(auth::reset_password_handler))
        .route("/session", get(auth::session_handler))
        .route("/views", get(rest::view_handler))
        .route("/theme", get(rest::get_theme_handler))
        .route("/theme/toggle", post(rest::toggle_theme_handler));

    // Protected routes (session required)
    let protected_routes = Router::new()
        .route("/home", get(rest::home_handler))
        .route("/books", get(rest::list_books_handler))
        .route("/books/{id}", get(rest::book_detail_handler))
        .route("/profile", get(rest::profile_handler))
        .route("/preferences", get(onboarding::get_preferences_handler))
        .route("/onboarding/options", get(onboarding::options_handler))
        .route("/onboarding", post(onboarding::submit_handler))
        .route("/onboarding/image", post(onboarding::upload_image_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_session,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}
