//! crates/datum_core/src/errors.rs
//!
//! User-facing failures. Each one carries the fixed message the screen shows;
//! none of them is retried or fatal.

use crate::ports::PortError;

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password. Please try again.";
pub const WEAK_PASSWORD_MESSAGE: &str = "Password must be at least 6 characters long.";
pub const GENERIC_AUTH_MESSAGE: &str = "An error occurred. Please try again.";
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch books. Please try again.";
pub const UPLOAD_FAILED_MESSAGE: &str = "Failed to upload image. Please try again.";
pub const SAVE_FAILED_MESSAGE: &str = "Failed to save preferences. Please try again.";

/// The provider's wording for a wrong email/password pair.
const PROVIDER_INVALID_CREDENTIALS: &str = "Invalid login credentials";

/// Failures of sign-in, sign-up, sign-out and password reset.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("{}", INVALID_CREDENTIALS_MESSAGE)]
    InvalidCredentials,
    #[error("{}", WEAK_PASSWORD_MESSAGE)]
    WeakPassword,
    /// Any other rejection; the provider's own message is shown as is.
    #[error("{0}")]
    Provider(String),
    #[error("{}", GENERIC_AUTH_MESSAGE)]
    Unexpected,
}

impl AuthError {
    /// Maps a failed sign-in.
    pub fn from_sign_in(err: PortError) -> Self {
        match err {
            PortError::Rejected(message) if message == PROVIDER_INVALID_CREDENTIALS => {
                AuthError::InvalidCredentials
            }
            PortError::Rejected(message) => AuthError::Provider(message),
            _ => AuthError::Unexpected,
        }
    }

    /// Maps a failed sign-up.
    pub fn from_sign_up(err: PortError) -> Self {
        match err {
            PortError::Rejected(message) if message.contains("Password") => {
                AuthError::WeakPassword
            }
            PortError::Rejected(message) => AuthError::Provider(message),
            _ => AuthError::Unexpected,
        }
    }

    /// Maps failures of sign-out and password reset.
    pub fn from_port(err: PortError) -> Self {
        match err {
            PortError::Rejected(message) => AuthError::Provider(message),
            _ => AuthError::Unexpected,
        }
    }
}

/// The book API could not be reached or answered with a non-success status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", FETCH_FAILED_MESSAGE)]
pub struct RemoteFetchError {
    /// What actually went wrong, for the logs.
    pub cause: String,
    pub not_found: bool,
}

impl From<PortError> for RemoteFetchError {
    fn from(err: PortError) -> Self {
        Self {
            not_found: matches!(err, PortError::NotFound(_)),
            cause: err.to_string(),
        }
    }
}

/// A profile image could not be stored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", UPLOAD_FAILED_MESSAGE)]
pub struct UploadError {
    pub cause: String,
}

impl From<PortError> for UploadError {
    fn from(err: PortError) -> Self {
        Self {
            cause: err.to_string(),
        }
    }
}

/// The onboarding form could not be saved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SaveError {
    /// The form itself is incomplete; the message names the field.
    #[error("{0}")]
    Invalid(String),
    #[error("{}", SAVE_FAILED_MESSAGE)]
    Persistence(String),
}
