use axum::Router;
use std::sync::Arc;

pub mod concerts;
pub mod config;
pub mod document;
pub mod errors;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod validation;
pub mod view;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

use document::{Document, GALLERY_MOUNT};
use errors::ConfigurationError;
use repositories::{RecordSource, SheetDbSource};
use view::{ContentView, SharedView, ViewOptions};

pub trait AppState: Clone + Send + Sync + 'static {
    type Source: RecordSource;

    fn document(&self) -> &Document;
    fn gallery(&self) -> &SharedView<Self::Source>;
}

#[derive(Clone)]
pub struct DefaultAppState<S: RecordSource = SheetDbSource> {
    document: Arc<Document>,
    gallery: SharedView<S>,
}

impl<S: RecordSource> DefaultAppState<S> {
    pub fn new(document: Document, gallery: SharedView<S>) -> Self {
        Self {
            document: Arc::new(document),
            gallery,
        }
    }

    /// Site layout with a gallery view bound to the gallery section. The view
    /// starts loading only when [`SharedView::spawn_reload`] is called.
    pub fn for_site(options: ViewOptions, source: S) -> Result<Self, ConfigurationError> {
        let document = Document::site();
        let view = ContentView::new(options, &document, source)?;
        Ok(Self::new(document, SharedView::new(view)))
    }

    pub fn with_source(source: S) -> Result<Self, ConfigurationError> {
        Self::for_site(ViewOptions::new(GALLERY_MOUNT), source)
    }
}

impl<S: RecordSource> AppState for DefaultAppState<S> {
    type Source = S;

    fn document(&self) -> &Document {
        &self.document
    }

    fn gallery(&self) -> &SharedView<S> {
        &self.gallery
    }
}

pub fn create_app<S: AppState>(state: S) -> Router {
    routes::create_router().with_state(state)
}
