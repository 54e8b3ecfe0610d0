use axum::{
    Form, Router,
    extract::{Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
};
use chrono::Local;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::AppState;
use crate::concerts::{render_concerts, upcoming_concerts};
use crate::document::{CONCERTS_MOUNT, GALLERY_MOUNT};
use crate::errors::ApiError;
use crate::repositories::RecordSource;
use crate::view::{Action, ContentView, Phase, render::loading_html};

const GALLERY_CSS: &str = include_str!("../../../assets/gallery.css");

/// Filter and page position carried in the URL of every gallery control.
#[derive(Debug, Default, Deserialize)]
pub struct GalleryQuery {
    filter: Option<String>,
    page: Option<String>,
}

impl GalleryQuery {
    /// The interactions this URL stands for, filter first since it resets the page.
    pub fn actions(&self) -> Vec<Action> {
        let mut actions = Vec::new();
        if self.filter.is_some() {
            actions.push(Action::from_filter_attr(self.filter.as_deref()));
        }
        if let Some(action) = self.page.as_deref().and_then(Action::from_page_attr) {
            actions.push(action);
        }
        actions
    }
}

#[derive(Debug, Deserialize)]
struct PageForm {
    action: String,
}

async fn gallery_snapshot<S: AppState>(state: &S, query: &GalleryQuery) -> ContentView<S::Source> {
    let mut view = state.gallery().snapshot().await;
    for action in query.actions() {
        if !view.apply(action.clone()) {
            debug!(?action, "Gallery action had no effect");
        }
    }
    view
}

fn concerts_html<R: RecordSource>(view: &ContentView<R>) -> String {
    match view.phase() {
        Phase::Loading => loading_html(),
        _ => render_concerts(&upcoming_concerts(
            view.records(),
            Local::now().date_naive(),
        )),
    }
}

#[instrument(skip_all, fields(filter = ?query.filter, page = ?query.page))]
async fn index<S: AppState>(
    State(state): State<S>,
    Query(query): Query<GalleryQuery>,
) -> Html<String> {
    let view = gallery_snapshot(&state, &query).await;

    let page = state.document().render_page(&[
        (GALLERY_MOUNT, view.render()),
        (CONCERTS_MOUNT, concerts_html(&view)),
    ]);
    Html(page)
}

#[instrument(skip_all, fields(action = %form.action))]
async fn index_action<S: AppState>(
    State(state): State<S>,
    Form(form): Form<PageForm>,
) -> Result<Redirect, ApiError> {
    if form.action != "retry" {
        return Err(ApiError::BadRequest(format!(
            "Unknown page action: {}",
            form.action
        )));
    }

    let outcome = state.gallery().reload().await;
    info!(?outcome, "Gallery reloaded on request");
    Ok(Redirect::to(&format!("/#{GALLERY_MOUNT}")))
}

#[instrument(skip_all, fields(filter = ?query.filter, page = ?query.page))]
async fn gallery_fragment<S: AppState>(
    State(state): State<S>,
    Query(query): Query<GalleryQuery>,
) -> Html<String> {
    Html(gallery_snapshot(&state, &query).await.render())
}

#[instrument(skip_all)]
async fn gallery_retry<S: AppState>(State(state): State<S>) -> Html<String> {
    let outcome = state.gallery().reload().await;
    info!(?outcome, "Gallery reloaded on request");
    Html(state.gallery().snapshot().await.render())
}

async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], GALLERY_CSS)
}

pub fn create_web_router<S: AppState>() -> Router<S> {
    Router::new()
        .route("/", get(index::<S>).post(index_action::<S>))
        .route("/gallery", get(gallery_fragment::<S>).post(gallery_retry::<S>))
        .route("/gallery/retry", post(gallery_retry::<S>))
        .route("/assets/gallery.css", get(stylesheet))
}
