//! Domain route groups (categories, drive listing, ingestion).

use crate::constants::API_PREFIX;
use crate::handlers;
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// `GET /category/{id}` takes an organization id; `PUT` and `DELETE` take a category id.
/// `/category/all` and `/category/add` win over the capture.
pub fn category_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/category/all", API_PREFIX),
            get(handlers::categories::list_categories_with_usage),
        )
        .route(
            &format!("{}/category/add", API_PREFIX),
            post(handlers::categories::create_category),
        )
        .route(
            &format!("{}/category/{{id}}", API_PREFIX),
            get(handlers::categories::list_categories)
                .put(handlers::categories::rename_category)
                .delete(handlers::categories::delete_category),
        )
}

pub fn drive_listing_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        &format!("{}/google-drive-fetch", API_PREFIX),
        post(handlers::google_drive::fetch_folder),
    )
}

pub fn ingestion_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        &format!("{}/google-drive", API_PREFIX),
        post(handlers::google_drive::ingest_files),
    )
}
