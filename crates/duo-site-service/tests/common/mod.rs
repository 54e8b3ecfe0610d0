#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use duo_site_service::models::{ContentKind, ContentRecord};
use duo_site_service::repositories::{FetchError, RecordSource};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn record(title: &str, kind: ContentKind, order: i64) -> ContentRecord {
    ContentRecord {
        kind,
        title: title.to_string(),
        description: None,
        url: format!("https://example.com/{}.jpg", title.to_lowercase().replace(' ', "-")),
        inserted_at: None,
        categories: None,
        section: None,
        order,
    }
}

pub fn tagged(title: &str, order: i64, categories: &str) -> ContentRecord {
    ContentRecord {
        categories: Some(categories.to_string()),
        ..record(title, ContentKind::Image, order)
    }
}

pub fn dated(mut record: ContentRecord, y: i32, m: u32, d: u32) -> ContentRecord {
    record.inserted_at = NaiveDate::from_ymd_opt(y, m, d);
    record
}

/// "Foto 1" ... "Foto n", already in display order.
pub fn numbered(count: usize) -> Vec<ContentRecord> {
    (1..=count)
        .map(|i| record(&format!("Foto {i}"), ContentKind::Image, i as i64))
        .collect()
}

/// Answers every fetch from a script of responses; the last one repeats.
#[derive(Clone)]
pub struct ScriptedSource {
    responses: Arc<Vec<Result<Vec<ContentRecord>, u16>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(responses: Vec<Result<Vec<ContentRecord>, u16>>) -> Self {
        assert!(!responses.is_empty(), "script needs at least one response");
        Self {
            responses: Arc::new(responses),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn serving(records: Vec<ContentRecord>) -> Self {
        Self::new(vec![Ok(records)])
    }

    pub fn failing(status: u16) -> Self {
        Self::new(vec![Err(status)])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordSource for ScriptedSource {
    async fn fetch_records(&self) -> Result<Vec<ContentRecord>, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let index = call.min(self.responses.len() - 1);
        match &self.responses[index] {
            Ok(records) => Ok(records.clone()),
            Err(status) => Err(FetchError::HttpStatus(*status)),
        }
    }
}

pub mod server_utils {
    use super::*;
    use axum_test::TestServer;
    use duo_site_service::{AppState, DefaultAppState, routes};

    /// Test server whose gallery has already finished its first load.
    pub async fn create_test_server(source: ScriptedSource) -> TestServer {
        let state = DefaultAppState::with_source(source).expect("gallery mount exists");
        state.gallery().reload().await;

        let app = routes::create_router().with_state(state);
        TestServer::new(app).unwrap()
    }

    /// Same, but the first load has not run yet.
    pub fn create_loading_server(source: ScriptedSource) -> TestServer {
        let state = DefaultAppState::with_source(source).expect("gallery mount exists");
        let app = routes::create_router().with_state(state);
        TestServer::new(app).unwrap()
    }
}
