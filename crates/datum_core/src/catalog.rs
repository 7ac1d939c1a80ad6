//! crates/datum_core/src/catalog.rs
//!
//! The catalog adapter: the book API's record shape, the normalization that
//! turns it into the internal book records, and the home page shelves built
//! on top of the `CatalogService` port.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{BookDetail, BookSummary};
use crate::errors::RemoteFetchError;
use crate::markup::strip_html;
use crate::ports::CatalogService;

/// Number of volumes requested per search.
pub const PAGE_SIZE: u32 = 20;

pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
pub const FALLBACK_COVER_URL: &str =
    "https://images.unsplash.com/photo-1543002588-bfa74002ed7e?auto=format&fit=crop&w=800&q=80";
pub const NO_DESCRIPTION: &str = "No description available.";
pub const UNCATEGORIZED: &str = "Uncategorized";
pub const UNKNOWN_DATE: &str = "Unknown";

//=========================================================================================
// The book API's record shape
//=========================================================================================

/// One volume as the book API returns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeRecord {
    pub id: String,
    #[serde(default)]
    pub volume_info: VolumeInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    #[serde(default)]
    pub title: String,
    pub authors: Option<Vec<String>>,
    pub published_date: Option<String>,
    pub description: Option<String>,
    pub page_count: Option<u32>,
    pub categories: Option<Vec<String>>,
    pub image_links: Option<ImageLinks>,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    pub thumbnail: Option<String>,
    pub small_thumbnail: Option<String>,
}

/// One page of search results. The API omits `items` when nothing matched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub items: Vec<VolumeRecord>,
    #[serde(default)]
    pub total_items: u32,
}

//=========================================================================================
// Normalization
//=========================================================================================

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

fn first_entry(list: Option<&Vec<String>>) -> Option<&str> {
    non_empty(list.and_then(|entries| entries.first()).map(String::as_str))
}

/// Rewrites a plain `http://` URL to `https://`; anything else is returned unchanged.
pub fn upgrade_to_https(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}

/// Maps a raw volume to the internal record. Total: every missing or empty
/// field falls back to its fixed placeholder.
pub fn normalize(raw: &VolumeRecord) -> BookDetail {
    let info = &raw.volume_info;

    let cover_url = non_empty(
        info.image_links
            .as_ref()
            .and_then(|links| links.thumbnail.as_deref()),
    )
    .map(upgrade_to_https)
    .unwrap_or_else(|| FALLBACK_COVER_URL.to_string());

    let description = non_empty(info.description.as_deref())
        .map(strip_html)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| NO_DESCRIPTION.to_string());

    BookDetail {
        summary: BookSummary {
            id: raw.id.clone(),
            title: info.title.clone(),
            author: first_entry(info.authors.as_ref())
                .unwrap_or(UNKNOWN_AUTHOR)
                .to_string(),
            cover_url,
            rating: info.average_rating.unwrap_or(0.0),
        },
        description,
        genre: first_entry(info.categories.as_ref())
            .unwrap_or(UNCATEGORIZED)
            .to_string(),
        publish_date: non_empty(info.published_date.as_deref())
            .unwrap_or(UNKNOWN_DATE)
            .to_string(),
        page_count: info.page_count.unwrap_or(0),
        reviews: Vec::new(),
    }
}

/// Normalizes a raw volume for list and carousel contexts.
pub fn normalize_summary(raw: &VolumeRecord) -> BookSummary {
    normalize(raw).summary
}

/// Renders a rating with exactly one decimal place. Ties round away from zero
/// (`4.25` shows as `4.3`).
pub fn format_rating(rating: f64) -> String {
    let rounded = (rating * 10.0).round() / 10.0;
    format!("{rounded:.1}")
}

//=========================================================================================
// Remote lookups on top of the port
//=========================================================================================

/// Searches and normalizes every returned volume.
pub async fn search_books(
    catalog: &dyn CatalogService,
    query: &str,
    start_index: u32,
) -> Result<Vec<BookDetail>, RemoteFetchError> {
    let page = catalog.search(query, start_index).await?;
    Ok(page.items.iter().map(normalize).collect())
}

/// Fetches and normalizes a single volume.
pub async fn fetch_book(
    catalog: &dyn CatalogService,
    id: &str,
) -> Result<BookDetail, RemoteFetchError> {
    let raw = catalog.get_by_id(id).await?;
    Ok(normalize(&raw))
}

//=========================================================================================
// Home page shelves
//=========================================================================================

/// A carousel on the home page and the query that fills it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shelf {
    pub title: &'static str,
    pub query: &'static str,
}

pub const HOME_SHELVES: [Shelf; 3] = [
    Shelf {
        title: "Popular Books",
        query: "bestsellers 2024",
    },
    Shelf {
        title: "Recommended for You",
        query: "award winning fiction",
    },
    Shelf {
        title: "Your Reading List",
        query: "classic literature",
    },
];

/// A loaded shelf. A shelf that failed carries its message and no books.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShelfView {
    pub title: String,
    pub books: Vec<BookSummary>,
    pub error: Option<String>,
}

/// Loads every home shelf concurrently; one failing shelf leaves the others intact.
pub async fn load_shelves(catalog: &dyn CatalogService, shelves: &[Shelf]) -> Vec<ShelfView> {
    let loads = shelves.iter().map(|shelf| async move {
        match catalog.search(shelf.query, 0).await {
            Ok(page) => ShelfView {
                title: shelf.title.to_string(),
                books: page.items.iter().map(normalize_summary).collect(),
                error: None,
            },
            Err(e) => {
                let err = RemoteFetchError::from(e);
                warn!(shelf = shelf.title, cause = %err.cause, "Failed to load shelf");
                ShelfView {
                    title: shelf.title.to_string(),
                    books: Vec::new(),
                    error: Some(err.to_string()),
                }
            }
        }
    });
    join_all(loads).await
}
