//! services/api/src/adapters/supabase_auth.rs
//!
//! This module contains the adapter for Supabase's hosted auth (GoTrue) REST API.
//! It implements the `AuthService` port from the `core` crate and keeps the
//! tokens of the one signed-in user of this process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use datum_core::domain::{AuthEvent, AuthEventKind, Session};
use datum_core::ports::{AuthService, PortError, PortResult};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const AUTH_EVENT_CAPACITY: usize = 16;

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Deserialize)]
struct UserRecord {
    id: Uuid,
    email: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    user_metadata: Map<String, Value>,
}

impl UserRecord {
    fn into_domain(self) -> Session {
        Session {
            id: self.id,
            email: self.email,
            created_at: self.created_at,
            metadata: self.user_metadata,
        }
    }
}

#[derive(Deserialize)]
struct TokenRecord {
    access_token: String,
    refresh_token: Option<String>,
    user: UserRecord,
}

/// GoTrue has answered errors in a few shapes over time; any of these fields may
/// carry the human-readable message.
#[derive(Deserialize, Default)]
struct ErrorRecord {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ErrorRecord {
    fn into_message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

#[derive(Clone)]
struct Tokens {
    access_token: String,
    refresh_token: Option<String>,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `AuthService` port against `{supabase_url}/auth/v1`.
pub struct SupabaseAuthAdapter {
    http: reqwest::Client,
    auth_url: String,
    anon_key: String,
    tokens: Mutex<Option<Tokens>>,
    events: broadcast::Sender<AuthEvent>,
}

impl SupabaseAuthAdapter {
    /// Creates a new `SupabaseAuthAdapter`.
    pub fn new(http: reqwest::Client, supabase_url: &str, anon_key: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            http,
            auth_url: format!("{}/auth/v1", supabase_url.trim_end_matches('/')),
            anon_key: anon_key.into(),
            tokens: Mutex::new(None),
            events,
        }
    }

    /// The signed-in user's access token, if any.
    pub async fn access_token(&self) -> Option<String> {
        self.tokens
            .lock()
            .await
            .as_ref()
            .map(|t| t.access_token.clone())
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.auth_url, path))
            .header("apikey", &self.anon_key)
    }

    fn emit(&self, kind: AuthEventKind, session: Option<Session>) {
        // No subscribers is fine: nobody is listening yet.
        let _ = self.events.send(AuthEvent { kind, session });
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> PortResult<Response> {
        let response = builder.send().await.map_err(|e| {
            error!("Error calling auth provider for {}: {}", what, e);
            PortError::Unexpected(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let record = response.json::<ErrorRecord>().await.unwrap_or_default();
        let message = record
            .into_message()
            .unwrap_or_else(|| format!("auth provider returned {}", status));
        debug!(status = %status, "Auth provider refused {}: {}", what, message);

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized,
            s if s.is_client_error() => PortError::Rejected(message),
            _ => PortError::Unexpected(message),
        })
    }

    async fn store_tokens(&self, record: TokenRecord) -> Session {
        let session = record.user.into_domain();
        *self.tokens.lock().await = Some(Tokens {
            access_token: record.access_token,
            refresh_token: record.refresh_token,
        });
        session
    }

    async fn refresh(&self, refresh_token: &str) -> PortResult<Session> {
        let builder = self
            .request(reqwest::Method::POST, "/token?grant_type=refresh_token")
            .json(&json!({ "refresh_token": refresh_token }));
        let record: TokenRecord = self
            .send(builder, "token refresh")
            .await?
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let session = self.store_tokens(record).await;
        self.emit(AuthEventKind::TokenRefreshed, Some(session.clone()));
        Ok(session)
    }
}

//=========================================================================================
// `AuthService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthService for SupabaseAuthAdapter {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> PortResult<Session> {
        let builder = self
            .request(reqwest::Method::POST, "/token?grant_type=password")
            .json(&json!({ "email": email, "password": password }));

        // Bad credentials come back as 400, which `send` reports as `Rejected`.
        let record: TokenRecord = self
            .send(builder, "sign-in")
            .await?
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let session = self.store_tokens(record).await;
        info!(user_id = %session.id, "Auth provider accepted sign-in");
        self.emit(AuthEventKind::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str, redirect_to: &str) -> PortResult<Session> {
        let builder = self
            .request(reqwest::Method::POST, "/signup")
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({ "email": email, "password": password }));

        let body: Value = self
            .send(builder, "sign-up")
            .await?
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // With auto-confirm the provider answers with a full token grant; with
        // email confirmation it answers with the bare user.
        let session = if body.get("access_token").is_some() {
            let record: TokenRecord = serde_json::from_value(body)
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
            self.store_tokens(record).await
        } else {
            let user: UserRecord = serde_json::from_value(body)
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
            user.into_domain()
        };

        info!(user_id = %session.id, "Auth provider created account");
        self.emit(AuthEventKind::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> PortResult<()> {
        let tokens = self.tokens.lock().await.take();
        let Some(tokens) = tokens else {
            return Ok(());
        };

        let builder = self
            .request(reqwest::Method::POST, "/logout")
            .bearer_auth(&tokens.access_token);
        let result = self.send(builder, "sign-out").await;
        self.emit(AuthEventKind::SignedOut, None);

        match result {
            Ok(_) | Err(PortError::Unauthorized) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn current_session(&self) -> PortResult<Option<Session>> {
        let tokens = self.tokens.lock().await.clone();
        let Some(tokens) = tokens else {
            return Ok(None);
        };

        let builder = self
            .request(reqwest::Method::GET, "/user")
            .bearer_auth(&tokens.access_token);
        match self.send(builder, "session lookup").await {
            Ok(response) => {
                let user: UserRecord = response
                    .json()
                    .await
                    .map_err(|e| PortError::Unexpected(e.to_string()))?;
                Ok(Some(user.into_domain()))
            }
            Err(PortError::Unauthorized) => match tokens.refresh_token {
                Some(refresh_token) => match self.refresh(&refresh_token).await {
                    Ok(session) => Ok(Some(session)),
                    Err(e) => {
                        warn!("Session expired and could not be refreshed: {}", e);
                        *self.tokens.lock().await = None;
                        self.emit(AuthEventKind::SignedOut, None);
                        Ok(None)
                    }
                },
                None => {
                    *self.tokens.lock().await = None;
                    self.emit(AuthEventKind::SignedOut, None);
                    Ok(None)
                }
            },
            Err(e) => Err(e),
        }
    }

    async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> PortResult<()> {
        let builder = self
            .request(reqwest::Method::POST, "/recover")
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({ "email": email }));
        self.send(builder, "password reset").await?;
        info!("Password reset email requested");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
