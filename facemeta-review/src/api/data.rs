//! Paginated, searchable table rows

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, DEFAULT_LIMIT, DEFAULT_PAGE};
use crate::AppState;

/// Raw query parameters; parsed by hand so bad values get a JSON 400
#[derive(Debug, Default, Deserialize)]
pub struct DataQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DataResponse {
    pub data: Vec<Value>,
    /// Rows matching the search
    pub total: usize,
    /// Page as requested, even when an out-of-range page fell back to page 1
    pub page: i64,
    pub limit: i64,
    pub total_pages: usize,
}

fn parse_param(name: &str, raw: Option<&str>, default: i64) -> ApiResult<i64> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ApiError::BadRequest(format!("{} must be an integer, got '{}'", name, value))),
    }
}

/// GET /api/data?page&limit&search
pub async fn get_data(
    State(state): State<AppState>,
    query: Result<Query<DataQuery>, QueryRejection>,
) -> ApiResult<Json<DataResponse>> {
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let page = parse_param("page", query.page.as_deref(), DEFAULT_PAGE)?;
    let limit = parse_param("limit", query.limit.as_deref(), DEFAULT_LIMIT as i64)?;
    if limit <= 0 {
        return Err(ApiError::BadRequest(format!("limit must be positive, got {}", limit)));
    }

    let table = state.table.table().await;
    let matches = table.filter_by_name(query.search.as_deref());

    let limit_rows = usize::try_from(limit).unwrap_or(usize::MAX);
    let pagination = calculate_pagination(matches.len(), page, limit_rows);
    if pagination.reset {
        debug!(
            "Page {} out of range for {} rows, serving the first page",
            page,
            matches.len()
        );
    }

    let data = matches
        .iter()
        .skip(pagination.offset)
        .take(limit_rows)
        .filter_map(|&i| table.row_json(i))
        .collect();

    Ok(Json(DataResponse {
        data,
        total: matches.len(),
        page,
        limit,
        total_pages: pagination.total_pages,
    }))
}
