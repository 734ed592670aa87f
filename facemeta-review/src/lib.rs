//! facemeta-review library - read-only browsing of the normalized tables
//!
//! Serves a paginated, searchable view of one flat table plus the face images
//! it references.

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod cache;
pub mod error;
pub mod images;
pub mod pagination;
pub mod table;

use cache::TableCache;
use images::ImageStore;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Lazily loaded flat table
    pub table: Arc<TableCache>,
    /// Image root
    pub images: Arc<ImageStore>,
}

impl AppState {
    pub fn new(table: TableCache, images: ImageStore) -> Self {
        Self {
            table: Arc::new(table),
            images: Arc::new(images),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let data_routes = Router::new()
        .route("/api/unique-names", get(api::unique_names))
        .route("/api/data", get(api::get_data))
        .route("/api/image/*path", get(api::image_status))
        .route("/images/*path", get(api::serve_image));

    let public = Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .merge(api::health_routes());

    Router::new()
        .merge(data_routes)
        .merge(public)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
