//! Tests for the Google Books adapter against a local stub of the volumes API.

use api_lib::adapters::GoogleBooksAdapter;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use datum_core::catalog::{self, format_rating};
use datum_core::ports::{CatalogService, PortError};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

async fn volumes(
    State(seen): State<Seen>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    let query = params.get("q").cloned().unwrap_or_default();
    seen.lock().unwrap().push(params);

    match query.as_str() {
        "fail" => Err(StatusCode::INTERNAL_SERVER_ERROR),
        "nothing" => Ok(Json(json!({ "kind": "books#volumes", "totalItems": 0 }))),
        _ => Ok(Json(json!({
            "kind": "books#volumes",
            "totalItems": 2,
            "items": [
                {
                    "id": "zyTCAlFPjgYC",
                    "volumeInfo": {
                        "title": "The Google Story",
                        "authors": ["David A. Vise", "Mark Malseed"],
                        "averageRating": 3.5,
                        "imageLinks": { "thumbnail": "http://books.google.com/books?id=zyTCAlFPjgYC&img=1" }
                    }
                },
                { "id": "bare", "volumeInfo": { "title": "Untitled Draft" } }
            ]
        }))),
    }
}

async fn volume(Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    if id != "zyTCAlFPjgYC" {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(json!({
        "id": id,
        "volumeInfo": {
            "title": "The Google Story",
            "authors": ["David A. Vise"],
            "publishedDate": "2005-11-15",
            "description": "<p>Here is the story behind one of the most <b>remarkable</b> Internet successes.</p>",
            "pageCount": 207,
            "categories": ["Business & Economics"],
            "averageRating": 4
        }
    })))
}

/// Starts the stub and returns the adapter pointed at it.
async fn stub_adapter(api_key: Option<&str>) -> (GoogleBooksAdapter, Seen) {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/books/v1/volumes", get(volumes))
        .route("/books/v1/volumes/{id}", get(volume))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let adapter = GoogleBooksAdapter::new(
        format!("http://{addr}/books/v1/"),
        api_key.map(str::to_string),
    )
    .unwrap();
    (adapter, seen)
}

#[tokio::test]
async fn test_search_sends_paging_parameters() {
    let (adapter, seen) = stub_adapter(Some("secret")).await;

    let page = adapter.search("google story", 0).await.unwrap();

    assert_eq!(page.total_items, 2);
    assert_eq!(page.items.len(), 2);

    let params = seen.lock().unwrap()[0].clone();
    assert_eq!(params["q"], "google story");
    assert_eq!(params["startIndex"], "0");
    assert_eq!(params["maxResults"], "20");
    assert_eq!(params["projection"], "full");
    assert_eq!(params["key"], "secret");
}

#[tokio::test]
async fn test_search_without_key_omits_it() {
    let (adapter, seen) = stub_adapter(None).await;

    adapter.search("anything", 20).await.unwrap();

    let params = seen.lock().unwrap()[0].clone();
    assert!(!params.contains_key("key"));
    assert_eq!(params["startIndex"], "20");
}

#[tokio::test]
async fn test_search_results_normalize_with_fallbacks() {
    let (adapter, _) = stub_adapter(None).await;

    let books = catalog::search_books(&adapter, "google story", 0).await.unwrap();

    assert_eq!(books[0].summary.author, "David A. Vise");
    assert_eq!(
        books[0].summary.cover_url,
        "https://books.google.com/books?id=zyTCAlFPjgYC&img=1"
    );
    assert_eq!(books[1].summary.author, catalog::UNKNOWN_AUTHOR);
    assert_eq!(books[1].summary.cover_url, catalog::FALLBACK_COVER_URL);
    assert_eq!(books[1].summary.rating, 0.0);
    assert_eq!(books[1].description, catalog::NO_DESCRIPTION);
}

#[tokio::test]
async fn test_empty_result_set_has_no_items() {
    let (adapter, _) = stub_adapter(None).await;

    let page = adapter.search("nothing", 0).await.unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.total_items, 0);
}

#[tokio::test]
async fn test_server_error_is_a_fetch_failure() {
    let (adapter, _) = stub_adapter(None).await;

    let err = catalog::search_books(&adapter, "fail", 0).await.unwrap_err();

    assert!(!err.not_found);
    assert_eq!(err.to_string(), "Failed to fetch books. Please try again.");
}

#[tokio::test]
async fn test_fetch_book_strips_markup() {
    let (adapter, _) = stub_adapter(None).await;

    let book = catalog::fetch_book(&adapter, "zyTCAlFPjgYC").await.unwrap();

    assert_eq!(book.summary.title, "The Google Story");
    assert_eq!(
        book.description,
        "Here is the story behind one of the most remarkable Internet successes."
    );
    assert_eq!(book.genre, "Business & Economics");
    assert_eq!(book.page_count, 207);
    assert_eq!(format_rating(book.summary.rating), "4.0");
}

#[tokio::test]
async fn test_unknown_volume_is_not_found() {
    let (adapter, _) = stub_adapter(None).await;

    let err = adapter.get_by_id("missing").await.unwrap_err();

    assert!(matches!(err, PortError::NotFound(_)));
}
