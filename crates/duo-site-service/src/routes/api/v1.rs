use axum::{
    Router,
    extract::{Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::AppState;
use crate::concerts::{Concert, upcoming_concerts};
use crate::errors::ApiError;
use crate::models::ContentRecord;
use crate::repositories::RecordSource;
use crate::view::{ALL_CATEGORIES, ContentView, Phase};

#[derive(Debug, Deserialize)]
struct ListRecordsQuery {
    filter: Option<String>,
    page: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ListRecordsResponse {
    items: Vec<ContentRecord>,
    filter: String,
    page: usize,
    per_page: usize,
    total: usize,
    total_pages: usize,
}

#[derive(Debug, Serialize)]
struct CategoriesResponse {
    categories: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ConcertsResponse {
    concerts: Vec<Concert>,
}

/// Only a loaded view has data to serve.
fn require_loaded<R: RecordSource>(view: &ContentView<R>) -> Result<(), ApiError> {
    match view.phase() {
        Phase::Loaded => Ok(()),
        Phase::Loading => Err(ApiError::ContentUnavailable),
        Phase::Error { detail, .. } => Err(ApiError::LoadFailed(detail.clone())),
    }
}

#[instrument(skip_all, fields(filter = ?query.filter, page = query.page))]
async fn list_records<S: AppState>(
    State(state): State<S>,
    Query(query): Query<ListRecordsQuery>,
) -> Result<ResponseJson<ListRecordsResponse>, ApiError> {
    debug!("Processing list records request");

    let mut view = state.gallery().snapshot().await;
    require_loaded(&view)?;

    if let Some(filter) = query.filter.as_deref() {
        let filter = filter.trim();
        view.filter_by_category(if filter.is_empty() { ALL_CATEGORIES } else { filter });
    }

    let page = query.page.unwrap_or(1);
    if page == 0 {
        return Err(ApiError::BadRequest(
            "Page must be greater than 0".to_string(),
        ));
    }
    if page > 1 && !view.go_to_page(page) {
        return Err(ApiError::BadRequest(format!(
            "Page {page} is out of range (total pages: {})",
            view.total_pages()
        )));
    }

    let response = ListRecordsResponse {
        items: view.page_records().into_iter().cloned().collect(),
        filter: view.current_filter().to_string(),
        page: view.current_page(),
        per_page: view.options().items_per_page,
        total: view.filtered_count(),
        total_pages: view.total_pages(),
    };

    info!(
        returned_count = response.items.len(),
        total = response.total,
        "Successfully retrieved records page"
    );

    Ok(ResponseJson(response))
}

#[instrument(skip_all)]
async fn list_categories<S: AppState>(
    State(state): State<S>,
) -> Result<ResponseJson<CategoriesResponse>, ApiError> {
    let view = state.gallery().snapshot().await;
    require_loaded(&view)?;

    Ok(ResponseJson(CategoriesResponse {
        categories: view.categories().into_iter().collect(),
    }))
}

#[instrument(skip_all)]
async fn list_concerts<S: AppState>(
    State(state): State<S>,
) -> Result<ResponseJson<ConcertsResponse>, ApiError> {
    let view = state.gallery().snapshot().await;
    require_loaded(&view)?;

    let concerts = upcoming_concerts(view.records(), Local::now().date_naive());
    debug!(count = concerts.len(), "Upcoming concerts computed");

    Ok(ResponseJson(ConcertsResponse { concerts }))
}

pub fn create_api_v1_router<S: AppState>() -> Router<S> {
    Router::new()
        .route("/records", get(list_records::<S>))
        .route("/categories", get(list_categories::<S>))
        .route("/concerts", get(list_concerts::<S>))
}
