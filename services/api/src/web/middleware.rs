//! services/api/src/web/middleware.rs
//!
//! Session middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

use crate::web::error::fail;
use crate::web::state::AppState;

/// Middleware that requires a signed-in session in the store.
///
/// If present, inserts the `Session` into request extensions for handlers to use.
/// Otherwise returns 401 Unauthorized and the path the UI should go to instead.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(session) = state.store.session() else {
        debug!(path = %req.uri().path(), "Rejecting request without a session");
        return fail(StatusCode::UNAUTHORIZED, "Please sign in to continue.").into_response();
    };

    req.extensions_mut().insert(session);
    next.run(req).await
}
