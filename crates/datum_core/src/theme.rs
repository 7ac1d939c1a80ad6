//! crates/datum_core/src/theme.rs
//!
//! The light/dark switch in the header.

use tracing::info;

use crate::domain::Theme;
use crate::ports::{PortResult, ThemeService};

/// Flips the persisted theme and returns the new one.
pub async fn toggle(themes: &dyn ThemeService) -> PortResult<Theme> {
    let next = themes.load().await?.toggled();
    themes.save(next).await?;
    info!(theme = %next, "Theme switched");
    Ok(next)
}
