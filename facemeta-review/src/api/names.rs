//! Distinct identity names

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::warn;

use crate::table::NAME_COLUMN;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct NamesResponse {
    pub names: Vec<String>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /api/unique-names
///
/// A table without a name column yields an empty list plus an `error` field.
pub async fn unique_names(State(state): State<AppState>) -> Json<NamesResponse> {
    let table = state.table.table().await;
    match table.distinct_names() {
        Some(names) => Json(NamesResponse {
            count: names.len(),
            names,
            error: None,
        }),
        None => {
            warn!("Table has no '{}' column", NAME_COLUMN);
            Json(NamesResponse {
                names: Vec::new(),
                count: 0,
                error: Some(format!("Table has no '{}' column", NAME_COLUMN)),
            })
        }
    }
}
