//! services/api/src/adapters/theme_file.rs
//!
//! Persists the light/dark flag as a small JSON file on local disk.
//! It implements the `ThemeService` port from the `core` crate.

use async_trait::async_trait;
use datum_core::domain::Theme;
use datum_core::ports::{PortError, PortResult, ThemeService};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::warn;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeRecord {
    is_dark: bool,
}

#[derive(Clone, Debug)]
pub struct FileThemeAdapter {
    path: PathBuf,
}

impl FileThemeAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ThemeService for FileThemeAdapter {
    async fn load(&self) -> PortResult<Theme> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Theme::default()),
            Err(e) => return Err(PortError::Unexpected(e.to_string())),
        };

        match serde_json::from_str::<ThemeRecord>(&contents) {
            Ok(record) if record.is_dark => Ok(Theme::Dark),
            Ok(_) => Ok(Theme::Light),
            Err(e) => {
                warn!(path = %self.path.display(), "Ignoring unreadable theme file: {}", e);
                Ok(Theme::default())
            }
        }
    }

    async fn save(&self, theme: Theme) -> PortResult<()> {
        let record = ThemeRecord {
            is_dark: theme.is_dark(),
        };
        let json = serde_json::to_string(&record).map_err(|e| PortError::Unexpected(e.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_means_light() {
        let dir = tempfile::tempdir().expect("tempdir");
        let adapter = FileThemeAdapter::new(dir.path().join("theme.json"));
        assert_eq!(adapter.load().await, Ok(Theme::Light));
    }

    #[tokio::test]
    async fn saved_theme_is_read_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("theme.json");
        let adapter = FileThemeAdapter::new(&path);

        adapter.save(Theme::Dark).await.expect("save");
        assert_eq!(adapter.load().await, Ok(Theme::Dark));
        assert_eq!(
            std::fs::read_to_string(&path).expect("file written"),
            r#"{"isDark":true}"#
        );
    }

    #[tokio::test]
    async fn garbage_falls_back_to_light() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("theme.json");
        std::fs::write(&path, "not json").expect("write");
        assert_eq!(FileThemeAdapter::new(&path).load().await, Ok(Theme::Light));
    }
}
