//! crates/datum_core/src/routing.rs
//!
//! Decides which screen a path shows, given whether someone is signed in.

use serde::Serialize;
use std::fmt;

use crate::domain::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Dashboard,
    Login,
    Register,
    Onboarding,
    Book(String),
    Books,
    Profile,
    Unknown(String),
}

impl Route {
    /// Parses a request path. The query string and trailing slashes are ignored.
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');

        match trimmed {
            "" => Route::Home,
            "/dashboard" => Route::Dashboard,
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/onboarding" => Route::Onboarding,
            "/books" => Route::Books,
            "/profile" => Route::Profile,
            other => match other.strip_prefix("/book/") {
                Some(id) if !id.is_empty() && !id.contains('/') => Route::Book(id.to_string()),
                _ => Route::Unknown(path.to_string()),
            },
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Onboarding => "/onboarding".to_string(),
            Route::Book(id) => format!("/book/{id}"),
            Route::Books => "/books".to_string(),
            Route::Profile => "/profile".to_string(),
            Route::Unknown(path) => path.clone(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// The screen to render, or where to send the reader instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    Redirect { to: String },
    Landing,
    Dashboard { greeting: String },
    Login,
    Register,
    Onboarding,
    BookDetail { id: String },
    BookList,
    Profile,
    NotFound,
}

fn redirect(route: Route) -> View {
    View::Redirect { to: route.path() }
}

/// Maps the signed-in state and a route to a view.
pub fn select_view(session: Option<&Session>, route: &Route) -> View {
    match (route, session) {
        (Route::Home, Some(_)) => redirect(Route::Dashboard),
        (Route::Home, None) => View::Landing,

        (Route::Dashboard, Some(s)) => View::Dashboard {
            greeting: format!("Welcome back, {}", s.display_name()),
        },
        (Route::Dashboard, None) => redirect(Route::Login),

        (Route::Login, Some(_)) => redirect(Route::Dashboard),
        (Route::Login, None) => View::Login,

        (Route::Register, Some(_)) => redirect(Route::Onboarding),
        (Route::Register, None) => View::Register,

        (Route::Onboarding, Some(_)) => View::Onboarding,
        (Route::Books, Some(_)) => View::BookList,
        (Route::Profile, Some(_)) => View::Profile,
        (Route::Onboarding | Route::Books | Route::Profile, None) => redirect(Route::Login),

        (Route::Book(id), _) => View::BookDetail { id: id.clone() },
        (Route::Unknown(_), _) => View::NotFound,
    }
}
