use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::models::{ContentKind, ContentRecord};
use crate::repositories::{FetchError, RecordSource};

/// A record with an image URL, order 0 and no optional fields.
pub fn record(title: &str, kind: ContentKind) -> ContentRecord {
    ContentRecord {
        kind,
        title: title.to_string(),
        description: None,
        url: "https://example.com/foto.jpg".to_string(),
        inserted_at: None,
        categories: None,
        section: None,
        order: 0,
    }
}

/// Serves a fixed list and counts fetches.
#[derive(Clone, Default)]
pub struct StaticSource {
    records: Arc<Vec<ContentRecord>>,
    calls: Arc<AtomicUsize>,
}

impl StaticSource {
    pub fn new(records: Vec<ContentRecord>) -> Self {
        Self {
            records: Arc::new(records),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordSource for StaticSource {
    async fn fetch_records(&self) -> Result<Vec<ContentRecord>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.as_ref().clone())
    }
}

/// Always answers with an HTTP error status.
#[derive(Clone)]
pub struct FailingSource {
    status: u16,
    calls: Arc<AtomicUsize>,
}

impl FailingSource {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordSource for FailingSource {
    async fn fetch_records(&self) -> Result<Vec<ContentRecord>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(FetchError::HttpStatus(self.status))
    }
}
