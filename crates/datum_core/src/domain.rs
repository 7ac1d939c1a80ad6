//! crates/datum_core/src/domain.rs
//!
//! Defines the core data structures for the application: the signed-in
//! identity, the reader's preferences, and the internal book records that
//! every screen renders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Identity
//=========================================================================================

/// The currently authenticated identity, as reported by the hosted auth provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Free-form user metadata. Known keys: `name`, `age`, `gender`, `profileImage`.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Session {
    /// The part of the email before the `@`, used as a display name.
    pub fn display_name(&self) -> &str {
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .unwrap_or_default()
    }

    pub fn metadata_name(&self) -> Option<&str> {
        self.metadata.get("name").and_then(Value::as_str)
    }

    pub fn metadata_age(&self) -> Option<u32> {
        self.metadata
            .get("age")
            .and_then(Value::as_u64)
            .and_then(|age| u32::try_from(age).ok())
    }

    pub fn metadata_gender(&self) -> Option<&str> {
        self.metadata.get("gender").and_then(Value::as_str)
    }

    pub fn profile_image(&self) -> Option<&str> {
        self.metadata.get("profileImage").and_then(Value::as_str)
    }
}

/// What happened on the auth provider's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    UserUpdated,
    TokenRefreshed,
}

/// A session change pushed by the auth provider to its subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub session: Option<Session>,
}

//=========================================================================================
// Preferences
//=========================================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReaderType {
    #[default]
    Casual,
    Avid,
    Professional,
    Scholar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
    PreferNotToSay,
}

/// The reader's taste and profile configuration. Always replaced as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub genres: Vec<String>,
    pub reading_level: ReadingLevel,
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub reader_type: ReaderType,
    pub favorite_categories: Vec<String>,
    pub profile_image: Option<String>,
}

//=========================================================================================
// Books
//=========================================================================================

/// A book as shown in a list or carousel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub id: String,
    pub title: String,
    pub author: String,
    pub cover_url: String,
    pub rating: f64,
}

/// A book as shown on its own page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDetail {
    #[serde(flatten)]
    pub summary: BookSummary,
    pub description: String,
    pub genre: String,
    pub publish_date: String,
    pub page_count: u32,
    pub reviews: Vec<Review>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub reviewer_name: String,
    pub reviewer_avatar_url: String,
    pub rating: f64,
    pub content: String,
    pub helpful_count: u32,
    pub date: String,
}

//=========================================================================================
// Theme
//=========================================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }
}

//=========================================================================================
// String conversions for the enums that travel through forms and the database
//=========================================================================================

/// Returned when a string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! string_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum!(ReadingLevel, "reading level", {
    Beginner => "beginner",
    Intermediate => "intermediate",
    Advanced => "advanced",
});

string_enum!(ReaderType, "reader type", {
    Casual => "casual",
    Avid => "avid",
    Professional => "professional",
    Scholar => "scholar",
});

string_enum!(Gender, "gender", {
    Male => "male",
    Female => "female",
    Other => "other",
    PreferNotToSay => "prefer_not_to_say",
});

string_enum!(Theme, "theme", {
    Light => "light",
    Dark => "dark",
});
