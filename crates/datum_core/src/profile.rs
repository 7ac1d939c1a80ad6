//! crates/datum_core/src/profile.rs
//!
//! The profile page: who the reader is, their tastes, and their achievements.

use serde::Serialize;

use crate::domain::{Preferences, ReadingLevel, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub progress: u32,
    pub total: u32,
}

impl Achievement {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.progress) * 100.0 / f64::from(self.total)
    }
}

// Progress is not tracked anywhere yet; these are the figures the page ships with.
pub const ACHIEVEMENTS: [Achievement; 3] = [
    Achievement {
        id: "bookworm",
        title: "Bookworm",
        description: "Read 10 books",
        progress: 7,
        total: 10,
    },
    Achievement {
        id: "critic",
        title: "Critic",
        description: "Write 20 reviews",
        progress: 15,
        total: 20,
    },
    Achievement {
        id: "expert",
        title: "Genre Expert",
        description: "Read 5 books in one genre",
        progress: 3,
        total: 5,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingStats {
    pub books_read: u32,
    pub reviews_written: u32,
    pub streak_days: u32,
}

pub const READING_STATS: ReadingStats = ReadingStats {
    books_read: 27,
    reviews_written: 15,
    streak_days: 7,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub progress: u32,
    pub total: u32,
    pub percentage: f64,
}

impl From<&Achievement> for AchievementView {
    fn from(a: &Achievement) -> Self {
        Self {
            id: a.id.to_string(),
            title: a.title.to_string(),
            description: a.description.to_string(),
            progress: a.progress,
            total: a.total,
            percentage: a.percentage(),
        }
    }
}

/// Everything the profile page renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub display_name: String,
    pub email: Option<String>,
    pub avatar_url: String,
    /// `YYYY-MM-DD` of account creation.
    pub member_since: String,
    pub favorite_genres: Vec<String>,
    pub reading_level: ReadingLevel,
    pub achievements: Vec<AchievementView>,
    pub stats: ReadingStats,
}

/// The generated avatar for an email address.
pub fn email_avatar_url(email: &str) -> String {
    format!("https://api.dicebear.com/7.x/avataaars/svg?seed={email}")
}

impl ProfileView {
    pub fn build(session: &Session, preferences: &Preferences) -> Self {
        let avatar_url = preferences
            .profile_image
            .clone()
            .or_else(|| session.profile_image().map(str::to_string))
            .unwrap_or_else(|| email_avatar_url(session.email.as_deref().unwrap_or_default()));

        Self {
            display_name: session.display_name().to_string(),
            email: session.email.clone(),
            avatar_url,
            member_since: session.created_at.format("%Y-%m-%d").to_string(),
            favorite_genres: preferences.genres.clone(),
            reading_level: preferences.reading_level,
            achievements: ACHIEVEMENTS.iter().map(AchievementView::from).collect(),
            stats: READING_STATS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use uuid::Uuid;

    fn session() -> Session {
        Session {
            id: Uuid::new_v4(),
            email: Some("omar@example.com".into()),
            created_at: Utc.with_ymd_and_hms(2024, 2, 15, 9, 30, 0).unwrap(),
            metadata: Default::default(),
        }
    }

    #[test]
    fn achievement_percentages() {
        let pct: Vec<f64> = ACHIEVEMENTS.iter().map(Achievement::percentage).collect();
        assert_eq!(pct, vec![70.0, 75.0, 60.0]);
    }

    #[test]
    fn builds_from_session_and_preferences() {
        let prefs = Preferences {
            genres: vec!["History".into()],
            reading_level: ReadingLevel::Beginner,
            ..Default::default()
        };
        let view = ProfileView::build(&session(), &prefs);

        assert_eq!(view.display_name, "omar");
        assert_eq!(view.member_since, "2024-02-15");
        assert_eq!(view.avatar_url, "https://api.dicebear.com/7.x/avataaars/svg?seed=omar@example.com");
        assert_eq!(view.favorite_genres, vec!["History".to_string()]);
        assert_eq!(view.reading_level, ReadingLevel::Beginner);
        assert_eq!(view.achievements.len(), 3);
        assert_eq!(view.stats.books_read, 27);
    }

    #[test]
    fn uploaded_picture_wins_over_generated_avatar() {
        let mut s = session();
        s.metadata = json!({ "profileImage": "https://cdn/meta.png" })
            .as_object()
            .cloned()
            .unwrap_or_default();

        let view = ProfileView::build(&s, &Preferences::default());
        assert_eq!(view.avatar_url, "https://cdn/meta.png");

        let prefs = Preferences {
            profile_image: Some("https://cdn/prefs.png".into()),
            ..Default::default()
        };
        assert_eq!(ProfileView::build(&s, &prefs).avatar_url, "https://cdn/prefs.png");
    }
}
