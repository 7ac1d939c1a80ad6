//! crates/datum_core/src/auth.rs
//!
//! Sign-in, sign-up and sign-out as the screens drive them, plus keeping the
//! store in step with the auth provider's own session changes.

use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::{AuthEvent, Session};
use crate::errors::AuthError;
use crate::ports::AuthService;
use crate::routing::Route;
use crate::store::AppStore;

/// The provider's minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A successful sign-in or sign-up: who is signed in and where to go next.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedIn {
    pub session: Session,
    pub next: Route,
}

pub async fn sign_in(
    store: &AppStore,
    auth: &dyn AuthService,
    email: &str,
    password: &str,
) -> Result<SignedIn, AuthError> {
    let session = auth
        .sign_in_with_password(email, password)
        .await
        .map_err(|e| {
            warn!("Sign-in rejected: {}", e);
            AuthError::from_sign_in(e)
        })?;

    info!(user_id = %session.id, "Signed in");
    store.set_session(Some(session.clone()));
    Ok(SignedIn {
        session,
        next: Route::Home,
    })
}

pub async fn sign_up(
    store: &AppStore,
    auth: &dyn AuthService,
    email: &str,
    password: &str,
    redirect_to: &str,
) -> Result<SignedIn, AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword);
    }

    let session = auth
        .sign_up(email, password, redirect_to)
        .await
        .map_err(|e| {
            warn!("Sign-up rejected: {}", e);
            AuthError::from_sign_up(e)
        })?;

    info!(user_id = %session.id, "Account created");
    store.set_session(Some(session.clone()));
    Ok(SignedIn {
        session,
        next: Route::Profile,
    })
}

/// Signs out with the provider and clears the local session.
///
/// The local session is cleared even when the provider call fails, so the
/// reader is never stuck signed in on this side.
pub async fn sign_out(store: &AppStore, auth: &dyn AuthService) -> Result<Route, AuthError> {
    let result = auth.sign_out().await;
    store.set_session(None);
    result.map_err(|e| {
        warn!("Sign-out failed at the provider: {}", e);
        AuthError::from_port(e)
    })?;
    Ok(Route::Login)
}

pub async fn request_password_reset(
    auth: &dyn AuthService,
    email: &str,
    redirect_to: &str,
) -> Result<(), AuthError> {
    auth.reset_password_for_email(email, redirect_to)
        .await
        .map_err(|e| {
            warn!("Password reset request failed: {}", e);
            AuthError::from_port(e)
        })
}

/// Loads whatever session the provider already holds into the store.
pub async fn restore_session(store: &AppStore, auth: &dyn AuthService) -> Option<Session> {
    match auth.current_session().await {
        Ok(session) => {
            store.set_session(session.clone());
            session
        }
        Err(e) => {
            warn!("Could not restore session: {}", e);
            store.set_session(None);
            None
        }
    }
}

/// Applies one provider event to the store.
pub fn apply_auth_event(store: &AppStore, event: AuthEvent) {
    info!(kind = ?event.kind, "Auth state changed");
    store.set_session(event.session);
}

/// Follows the provider's session changes until `cancel` fires or the
/// provider goes away.
pub async fn follow_auth_changes(
    store: &AppStore,
    mut events: broadcast::Receiver<AuthEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => match event {
                Ok(event) => apply_auth_event(store, event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Missed auth events; the next event will resync");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
}
