//! The gallery view: owns the fetched records and the user's filter/page
//! position, and renders them as HTML.
//!
//! Loads are the only asynchronous step. Filtering and paging are
//! synchronous transitions over the stored list and never hit the network.

use std::cmp::Ordering;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::document::{Document, MountPoint};
use crate::errors::ConfigurationError;
use crate::models::ContentRecord;
use crate::repositories::{FetchError, RecordSource};

pub mod categories;
pub mod pagination;
pub mod render;

pub use categories::{ALL_CATEGORIES, CategorySet, distinct_categories};
pub use pagination::{Pager, page_bounds, total_pages};
pub use render::escape_html;

pub const LOAD_ERROR_MESSAGE: &str = "Errore nel caricamento dei contenuti";

#[derive(Debug, Clone, PartialEq)]
pub struct ViewOptions {
    pub mount_id: String,
    pub items_per_page: usize,
    pub show_categories: bool,
    pub show_dates: bool,
}

impl ViewOptions {
    pub fn new(mount_id: impl Into<String>) -> Self {
        Self {
            mount_id: mount_id.into(),
            items_per_page: 9,
            show_categories: true,
            show_dates: true,
        }
    }

    pub fn items_per_page(mut self, items_per_page: usize) -> Self {
        self.items_per_page = items_per_page;
        self
    }

    pub fn show_categories(mut self, show: bool) -> Self {
        self.show_categories = show;
        self
    }

    pub fn show_dates(mut self, show: bool) -> Self {
        self.show_dates = show;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Loading,
    Loaded,
    /// `message` is shown to visitors, `detail` only goes to the logs.
    Error { message: String, detail: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(usize),
    Failed,
    /// A newer load started, or the mount point went away, before this one finished.
    Discarded,
}

/// Identifies one load; only the latest ticket may complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// A user interaction, as read from a control's `data-filter` / `data-page`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Filter(String),
    Page(usize),
}

impl Action {
    /// A filter control without a value means "all".
    pub fn from_filter_attr(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(token) if !token.is_empty() => Action::Filter(token.to_string()),
            _ => Action::Filter(ALL_CATEGORIES.to_string()),
        }
    }

    /// Reads the leading digits of a page attribute; `None` when there are none.
    pub fn from_page_attr(value: &str) -> Option<Self> {
        let value = value.trim();
        let digits_end = value
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(value.len());
        value[..digits_end].parse().ok().map(Action::Page)
    }
}

/// Sort policy: `order` ascending, then newest `inserted_at` first with
/// undated records last. Callers use a stable sort, so remaining ties keep
/// fetch order.
pub fn compare_records(a: &ContentRecord, b: &ContentRecord) -> Ordering {
    a.order.cmp(&b.order).then_with(|| match (a.inserted_at, b.inserted_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    })
}

#[derive(Clone)]
pub struct ContentView<S> {
    mount: MountPoint,
    options: ViewOptions,
    source: S,
    phase: Phase,
    records: Arc<[ContentRecord]>,
    category_sets: Arc<[CategorySet]>,
    filtered: Vec<usize>,
    current_filter: String,
    current_page: usize,
    generation: u64,
}

impl<S: RecordSource> ContentView<S> {
    /// Binds a view to an attached mount point of `document`. The view starts
    /// in [`Phase::Loading`]; call [`ContentView::refresh`] (or
    /// [`SharedView::reload`]) to fetch.
    pub fn new(
        options: ViewOptions,
        document: &Document,
        source: S,
    ) -> Result<Self, ConfigurationError> {
        if options.items_per_page == 0 {
            return Err(ConfigurationError::InvalidPageSize);
        }
        let mount = document
            .mount(&options.mount_id)
            .ok_or_else(|| ConfigurationError::MountPointMissing(options.mount_id.clone()))?;

        Ok(Self {
            mount,
            options,
            source,
            phase: Phase::Loading,
            records: Arc::from(Vec::new()),
            category_sets: Arc::from(Vec::new()),
            filtered: Vec::new(),
            current_filter: ALL_CATEGORIES.to_string(),
            current_page: 1,
            generation: 0,
        })
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.phase = Phase::Loading;
        LoadTicket(self.generation)
    }

    /// Applies the result of the load identified by `ticket`. Either every
    /// record is shown or none is: a failure clears the list.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<ContentRecord>, FetchError>,
    ) -> LoadOutcome {
        if ticket.0 != self.generation {
            debug!(ticket = ticket.0, current = self.generation, "Discarding superseded load");
            return LoadOutcome::Discarded;
        }
        if !self.mount.is_attached() {
            debug!(mount_id = %self.mount.id(), "Discarding load for detached mount point");
            return LoadOutcome::Discarded;
        }

        match result {
            Ok(mut records) => {
                records.sort_by(compare_records);
                let count = records.len();
                self.category_sets = records.iter().map(CategorySet::of).collect();
                self.records = Arc::from(records);
                self.filtered = (0..count).collect();
                self.current_filter = ALL_CATEGORIES.to_string();
                self.current_page = 1;
                self.phase = Phase::Loaded;
                info!(mount_id = %self.mount.id(), records = count, "Gallery content loaded");
                LoadOutcome::Loaded(count)
            }
            Err(err) => {
                warn!(mount_id = %self.mount.id(), error = %err, "Gallery content failed to load");
                self.records = Arc::from(Vec::new());
                self.category_sets = Arc::from(Vec::new());
                self.filtered.clear();
                self.current_page = 1;
                self.phase = Phase::Error {
                    message: LOAD_ERROR_MESSAGE.to_string(),
                    detail: err.to_string(),
                };
                LoadOutcome::Failed
            }
        }
    }

    /// Re-enters [`Phase::Loading`] and fetches every record again.
    #[instrument(skip_all, fields(mount_id = %self.mount.id()))]
    pub async fn refresh(&mut self) -> LoadOutcome {
        let ticket = self.begin_load();
        let result = self.source.fetch_records().await;
        self.complete_load(ticket, result)
    }

    /// Narrows the list to records tagged `category` ("all" restores the
    /// full list) and returns to page 1. Ignored unless loaded.
    pub fn filter_by_category(&mut self, category: &str) {
        if self.phase != Phase::Loaded {
            return;
        }

        self.current_filter = category.to_string();
        self.current_page = 1;
        self.filtered = if category == ALL_CATEGORIES {
            (0..self.records.len()).collect()
        } else {
            self.category_sets
                .iter()
                .enumerate()
                .filter(|(_, set)| set.contains(category))
                .map(|(index, _)| index)
                .collect()
        };
        debug!(filter = %category, matches = self.filtered.len(), "Filter applied");
    }

    /// Moves to `page` when it exists and differs from the current one.
    /// Returns whether the view moved.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        if self.phase != Phase::Loaded
            || page < 1
            || page > self.total_pages()
            || page == self.current_page
        {
            return false;
        }
        self.current_page = page;
        true
    }

    /// Runs an interaction. Returns whether the rendered output changes.
    pub fn apply(&mut self, action: Action) -> bool {
        match action {
            Action::Filter(category) => {
                let loaded = self.phase == Phase::Loaded;
                self.filter_by_category(&category);
                loaded
            }
            Action::Page(page) => self.go_to_page(page),
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    pub fn mount(&self) -> &MountPoint {
        &self.mount
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn records(&self) -> &[ContentRecord] {
        &self.records
    }

    pub fn filtered_records(&self) -> impl Iterator<Item = &ContentRecord> + '_ {
        self.filtered.iter().map(|&index| &self.records[index])
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered.len()
    }

    pub fn current_filter(&self) -> &str {
        &self.current_filter
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.filtered.len(), self.options.items_per_page)
    }

    /// Records in the current page window.
    pub fn page_records(&self) -> Vec<&ContentRecord> {
        let bounds = page_bounds(
            self.current_page,
            self.options.items_per_page,
            self.filtered.len(),
        );
        self.filtered[bounds]
            .iter()
            .map(|&index| &self.records[index])
            .collect()
    }

    /// Every distinct category across all records, sorted.
    pub fn categories(&self) -> std::collections::BTreeSet<String> {
        distinct_categories(self.category_sets.iter())
    }
}

/// A view shared by concurrent requests. Requests work on cloned snapshots;
/// loads fetch without holding the lock.
pub struct SharedView<S>(Arc<RwLock<ContentView<S>>>);

impl<S> Clone for SharedView<S> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<S: RecordSource> SharedView<S> {
    pub fn new(view: ContentView<S>) -> Self {
        Self(Arc::new(RwLock::new(view)))
    }

    pub async fn snapshot(&self) -> ContentView<S> {
        self.0.read().await.clone()
    }

    pub async fn reload(&self) -> LoadOutcome {
        let (ticket, source) = {
            let mut view = self.0.write().await;
            (view.begin_load(), view.source.clone())
        };

        let result = source.fetch_records().await;

        self.0.write().await.complete_load(ticket, result)
    }

    pub fn spawn_reload(&self) -> tokio::task::JoinHandle<LoadOutcome> {
        let shared = self.clone();
        tokio::spawn(async move { shared.reload().await })
    }
}
