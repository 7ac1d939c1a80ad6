pub mod auth;
pub mod catalog;
pub mod domain;
pub mod errors;
pub mod markup;
pub mod onboarding;
pub mod ports;
pub mod profile;
pub mod routing;
pub mod search;
pub mod store;
pub mod theme;

pub use domain::{
    AuthEvent, AuthEventKind, BookDetail, BookSummary, Gender, Preferences, ReaderType,
    ReadingLevel, Review, Session, Theme,
};
pub use errors::{AuthError, RemoteFetchError, SaveError, UploadError};
pub use ports::{
    AuthService, CatalogService, ObjectStorageService, PortError, PortResult, PreferencesService,
    ThemeService,
};
pub use routing::{select_view, Route, View};
pub use store::{AppStore, StoreSnapshot};
