//! crates/datum_core/src/search.rs
//!
//! State of the book list screen. Every search is stamped with a generation
//! number and only the response to the newest search is allowed to replace the
//! listing, so a slow early request can never overwrite a later one.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::catalog::{normalize_summary, SearchPage};
use crate::domain::BookSummary;
use crate::errors::RemoteFetchError;
use crate::ports::CatalogService;

/// Query used when the screen opens without one.
pub const DEFAULT_QUERY: &str = "bestsellers fiction 2024";

/// What the book list screen currently shows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchListing {
    /// The reader's own query; `None` while showing the default listing.
    pub query: Option<String>,
    pub books: Vec<BookSummary>,
    pub error: Option<String>,
    pub loading: bool,
}

impl SearchListing {
    pub fn heading(&self) -> &'static str {
        if self.query.is_some() {
            "Search Results"
        } else {
            "Popular Books"
        }
    }
}

/// Identifies one issued search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub generation: u64,
    pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The query was blank: no request, listing untouched.
    Skipped,
    /// The response replaced the listing.
    Applied,
    /// A newer search was issued meanwhile; the response was dropped.
    Stale,
}

#[derive(Debug, Default)]
pub struct BookSearch {
    latest: AtomicU64,
    listing: Mutex<SearchListing>,
}

impl BookSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn listing(&self) -> SearchListing {
        self.listing.lock().await.clone()
    }

    /// Starts a search. `None` loads the default listing; a blank query yields
    /// no ticket and leaves the listing as it was.
    pub async fn begin(&self, query: Option<&str>) -> Option<SearchTicket> {
        let (shown, sent) = match query.map(str::trim) {
            Some("") => return None,
            Some(q) => (Some(q.to_string()), q.to_string()),
            None => (None, DEFAULT_QUERY.to_string()),
        };

        let mut listing = self.listing.lock().await;
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        listing.query = shown;
        listing.error = None;
        listing.loading = true;

        Some(SearchTicket {
            generation,
            query: sent,
        })
    }

    /// Applies the result of `ticket` if it is still the newest search.
    pub async fn complete(
        &self,
        ticket: &SearchTicket,
        result: Result<SearchPage, RemoteFetchError>,
    ) -> SearchOutcome {
        let mut listing = self.listing.lock().await;
        if ticket.generation != self.latest.load(Ordering::SeqCst) {
            debug!(
                generation = ticket.generation,
                query = %ticket.query,
                "Discarding stale search response"
            );
            return SearchOutcome::Stale;
        }

        listing.loading = false;
        match result {
            Ok(page) => {
                listing.books = page.items.iter().map(normalize_summary).collect();
                listing.error = None;
            }
            Err(err) => {
                warn!(query = %ticket.query, cause = %err.cause, "Book search failed");
                // The listing never shows one query's books under another query's heading.
                listing.books.clear();
                listing.error = Some(err.to_string());
            }
        }
        SearchOutcome::Applied
    }

    /// Issues a search against `catalog` and applies the response.
    pub async fn run(&self, catalog: &dyn CatalogService, query: Option<&str>) -> SearchOutcome {
        let Some(ticket) = self.begin(query).await else {
            return SearchOutcome::Skipped;
        };
        let result = catalog
            .search(&ticket.query, 0)
            .await
            .map_err(RemoteFetchError::from);
        self.complete(&ticket, result).await
    }
}
