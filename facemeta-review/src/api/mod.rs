//! HTTP API handlers for facemeta-review

pub mod data;
pub mod health;
pub mod images;
pub mod names;
pub mod ui;

pub use data::get_data;
pub use health::health_routes;
pub use images::{image_status, serve_image};
pub use names::unique_names;
pub use ui::{serve_app_js, serve_index};
