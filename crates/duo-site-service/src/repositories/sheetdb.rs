use super::traits::{FetchError, RecordSource};
use crate::models::{ContentRecord, MalformedRecordError, parse_row};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://sheetdb.io/api/v1/tg0w3ai1vymki";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Reads the content spreadsheet through the SheetDB JSON API.
#[derive(Clone, Debug)]
pub struct SheetDbSource {
    client: reqwest::Client,
    endpoint: Url,
}

impl SheetDbSource {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, endpoint))
    }

    pub fn with_client(client: reqwest::Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetches the sheet and validates each row on its own, so one bad row
    /// shows up as one `Err` entry instead of failing the whole batch.
    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    pub async fn fetch_rows(
        &self,
    ) -> Result<Vec<Result<ContentRecord, MalformedRecordError>>, FetchError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Sheet API returned an error status");
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().await.map_err(from_reqwest)?;
        let rows: Vec<Value> = serde_json::from_slice(&body)?;
        debug!(rows = rows.len(), "Received sheet rows");

        Ok(rows
            .iter()
            .enumerate()
            .map(|(index, row)| parse_row(index, row))
            .collect())
    }
}

fn from_reqwest(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Request(err)
    }
}

#[async_trait]
impl RecordSource for SheetDbSource {
    async fn fetch_records(&self) -> Result<Vec<ContentRecord>, FetchError> {
        let rows = self.fetch_rows().await?;
        let total = rows.len();

        let records: Vec<ContentRecord> = rows
            .into_iter()
            .filter_map(|row| {
                row.inspect_err(|err| warn!(error = %err, "Skipping malformed sheet row"))
                    .ok()
            })
            .collect();

        debug!(total, kept = records.len(), "Sheet rows validated");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentKind;
    use axum::Router;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone)]
    struct SheetState {
        status: StatusCode,
        body: &'static str,
        delay: Duration,
        request_count: Arc<AtomicUsize>,
    }

    async fn sheet_handler(State(state): State<SheetState>) -> Response {
        state.request_count.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(state.delay).await;
        (
            state.status,
            [(reqwest::header::CONTENT_TYPE, "application/json")],
            state.body,
        )
            .into_response()
    }

    async fn spawn_sheet(
        status: StatusCode,
        body: &'static str,
        delay: Duration,
    ) -> (Url, Arc<AtomicUsize>, tokio::task::JoinHandle<()>) {
        let request_count = Arc::new(AtomicUsize::new(0));
        let state = SheetState {
            status,
            body,
            delay,
            request_count: request_count.clone(),
        };
        let app = Router::new()
            .route("/api/v1/sheet", get(sheet_handler))
            .with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let address = listener.local_addr().expect("local addr should exist");
        let join_handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server should run");
        });
        let url = Url::parse(&format!("http://{address}/api/v1/sheet")).expect("url must parse");
        (url, request_count, join_handle)
    }

    const ROWS: &str = r#"[
        {"TIPO": "IMMAGINE", "TITOLO": "Prova in sala", "DESCRIZIONE": "", "URL": "https://example.com/p.jpg", "DATA_INSERIMENTO": "2025-03-01", "CATEGORIE": "Prove", "ORDINE": "1"},
        {"TIPO": "VIDEO", "TITOLO": "", "URL": "https://example.com/v.mp4"},
        {"TIPO": "URL", "TITOLO": "Intervista", "URL": "https://example.com/x", "ORDINE": "n/a"}
    ]"#;

    #[tokio::test]
    async fn fetch_rows_reports_each_row() {
        let (url, _, server_task) = spawn_sheet(StatusCode::OK, ROWS, Duration::ZERO).await;
        let source = SheetDbSource::new(url, DEFAULT_TIMEOUT).expect("client should build");

        let rows = source.fetch_rows().await.expect("fetch should succeed");
        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_ok());
        assert_eq!(rows[1].as_ref().unwrap_err().row, 1);

        let link = rows[2].as_ref().expect("third row should parse");
        assert_eq!(link.kind, ContentKind::ExternalLink);
        assert_eq!(link.order, 0);

        server_task.abort();
    }

    #[tokio::test]
    async fn fetch_records_drops_malformed_rows() {
        let (url, count, server_task) = spawn_sheet(StatusCode::OK, ROWS, Duration::ZERO).await;
        let source = SheetDbSource::new(url, DEFAULT_TIMEOUT).expect("client should build");

        let records = source.fetch_records().await.expect("fetch should succeed");
        let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Prova in sala", "Intervista"]);
        assert_eq!(records[0].description, None);

        source.fetch_records().await.expect("second fetch should succeed");
        assert_eq!(count.load(Ordering::SeqCst), 2, "every call is a new request");

        server_task.abort();
    }

    #[tokio::test]
    async fn non_success_status_is_a_fetch_error() {
        let (url, _, server_task) =
            spawn_sheet(StatusCode::INTERNAL_SERVER_ERROR, "oops", Duration::ZERO).await;
        let source = SheetDbSource::new(url, DEFAULT_TIMEOUT).expect("client should build");

        let err = source.fetch_records().await.expect_err("fetch should fail");
        assert_eq!(err.status_code(), Some(500));

        server_task.abort();
    }

    #[tokio::test]
    async fn non_array_body_is_a_decode_error() {
        let (url, _, server_task) =
            spawn_sheet(StatusCode::OK, r#"{"error": "quota"}"#, Duration::ZERO).await;
        let source = SheetDbSource::new(url, DEFAULT_TIMEOUT).expect("client should build");

        let err = source.fetch_records().await.expect_err("fetch should fail");
        assert!(matches!(err, FetchError::Decode(_)));

        server_task.abort();
    }

    #[tokio::test]
    async fn slow_sheet_times_out() {
        let (url, _, server_task) =
            spawn_sheet(StatusCode::OK, "[]", Duration::from_millis(500)).await;
        let source =
            SheetDbSource::new(url, Duration::from_millis(50)).expect("client should build");

        let err = source.fetch_records().await.expect_err("fetch should time out");
        assert!(matches!(err, FetchError::Timeout));

        server_task.abort();
    }
}
