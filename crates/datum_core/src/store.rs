//! crates/datum_core/src/store.rs
//!
//! The session and preferences store. It is an ordinary value owned by the
//! application root and handed to whoever needs it; every mutation publishes a
//! fresh snapshot to subscribers through a `watch` channel.

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::watch;

use crate::domain::{Preferences, Session};

/// Everything the store holds at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreSnapshot {
    pub session: Option<Session>,
    pub preferences: Preferences,
}

/// Holds the signed-in identity and the reader's preferences.
///
/// Writes are plain replacements: the last write wins.
#[derive(Debug)]
pub struct AppStore {
    state: watch::Sender<StoreSnapshot>,
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AppStore {
    /// A store with no session and default preferences.
    pub fn new() -> Self {
        let (state, _) = watch::channel(StoreSnapshot::default());
        Self { state }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.state.borrow().clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session.clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.state.borrow().session.is_some()
    }

    pub fn preferences(&self) -> Preferences {
        self.state.borrow().preferences.clone()
    }

    /// A receiver that is notified after every change.
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.state.subscribe()
    }

    pub fn set_session(&self, session: Option<Session>) {
        self.state.send_modify(|state| state.session = session);
    }

    pub fn set_preferences(&self, preferences: Preferences) {
        self.state.send_modify(|state| state.preferences = preferences);
    }

    /// Shallow-merges `partial` into the session's metadata. Without a session
    /// nothing happens and subscribers are not woken.
    pub fn merge_identity_metadata(&self, partial: Map<String, Value>) {
        self.state.send_if_modified(|state| match state.session.as_mut() {
            Some(session) => {
                session.metadata.extend(partial);
                true
            }
            None => false,
        });
    }
}
