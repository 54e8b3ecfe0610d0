use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::validation::{MediaUrl, ValidationError, validate_media_url};

/// Column names of the content spreadsheet.
pub mod columns {
    pub const KIND: &str = "TIPO";
    pub const TITLE: &str = "TITOLO";
    pub const DESCRIPTION: &str = "DESCRIZIONE";
    pub const URL: &str = "URL";
    pub const INSERTED_AT: &str = "DATA_INSERIMENTO";
    pub const CATEGORIES: &str = "CATEGORIE";
    pub const ORDER: &str = "ORDINE";

    /// Single-valued section column (`CONCERTS` marks concert rows). Older
    /// sheets used it in place of `CATEGORIE`.
    pub const SECTION: &str = "CATEGORIA";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Image,
    Video,
    InstagramPost,
    ExternalLink,
    RawData,
}

impl ContentKind {
    /// Maps a `TIPO` cell to a kind. `FOTO` is the legacy spelling of `IMMAGINE`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "IMMAGINE" | "FOTO" => Some(ContentKind::Image),
            "VIDEO" => Some(ContentKind::Video),
            "POST_INSTAGRAM" => Some(ContentKind::InstagramPost),
            "URL" => Some(ContentKind::ExternalLink),
            "DATO" => Some(ContentKind::RawData),
            _ => None,
        }
    }

    /// Canonical spreadsheet tag.
    pub fn tag(self) -> &'static str {
        match self {
            ContentKind::Image => "IMMAGINE",
            ContentKind::Video => "VIDEO",
            ContentKind::InstagramPost => "POST_INSTAGRAM",
            ContentKind::ExternalLink => "URL",
            ContentKind::RawData => "DATO",
        }
    }

    /// CSS modifier used on gallery cards.
    pub fn css_class(self) -> &'static str {
        match self {
            ContentKind::Image => "immagine",
            ContentKind::Video => "video",
            ContentKind::InstagramPost => "post_instagram",
            ContentKind::ExternalLink => "url",
            ContentKind::RawData => "dato",
        }
    }
}

/// One validated row of the content spreadsheet.
///
/// `categories` keeps the raw comma-joined cell; consumers parse it with
/// [`crate::view::CategorySet::parse`]. `section` is the `CATEGORIA` cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentRecord {
    pub kind: ContentKind,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub inserted_at: Option<NaiveDate>,
    pub categories: Option<String>,
    pub section: Option<String>,
    pub order: i64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordIssue {
    #[error("row is not an object")]
    NotAnObject,
    #[error("missing or blank column {0}")]
    MissingColumn(&'static str),
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] ValidationError),
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("row {row}: {issue}")]
pub struct MalformedRecordError {
    pub row: usize,
    pub issue: RecordIssue,
}

/// Reads a loosely typed cell as trimmed text. Numbers and booleans are
/// accepted because the sheet API does not keep column types.
fn cell_text(row: &Map<String, Value>, column: &str) -> Option<String> {
    let text = match row.get(column)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Parses the `ORDINE` cell. `None` for anything that is not a finite number.
pub fn coerce_order(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}

/// Accepts a calendar date or an RFC 3339 timestamp.
pub fn parse_inserted_at(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Validates one spreadsheet row.
///
/// Coercions never reject the row: unknown kinds become [`ContentKind::RawData`],
/// unusable orders become 0 and unreadable dates become unknown. Only a missing
/// title or a missing/unsafe URL makes the row malformed.
pub fn parse_row(index: usize, value: &Value) -> Result<ContentRecord, MalformedRecordError> {
    let malformed = |issue: RecordIssue| MalformedRecordError { row: index, issue };

    let row = value
        .as_object()
        .ok_or_else(|| malformed(RecordIssue::NotAnObject))?;

    let raw_kind = cell_text(row, columns::KIND);
    let kind = match raw_kind.as_deref().and_then(ContentKind::from_tag) {
        Some(kind) => kind,
        None => {
            warn!(row = index, tag = ?raw_kind, "Unrecognized content type, rendering without media");
            ContentKind::RawData
        }
    };

    let title = cell_text(row, columns::TITLE)
        .ok_or_else(|| malformed(RecordIssue::MissingColumn(columns::TITLE)))?;

    let url = match cell_text(row, columns::URL) {
        Some(url) if kind != ContentKind::RawData => {
            match validate_media_url(&url).map_err(|err| malformed(err.into()))? {
                absolute @ MediaUrl::Absolute(_) => absolute.to_string(),
                MediaUrl::SitePath(_) => url,
            }
        }
        Some(url) => url,
        None if kind == ContentKind::RawData => String::new(),
        None => return Err(malformed(RecordIssue::MissingColumn(columns::URL))),
    };

    let inserted_at = cell_text(row, columns::INSERTED_AT).and_then(|raw| {
        let parsed = parse_inserted_at(&raw);
        if parsed.is_none() {
            warn!(row = index, value = %raw, "Unreadable insertion date, treating as unknown");
        }
        parsed
    });

    let order = match row.get(columns::ORDER) {
        None | Some(Value::Null) => 0,
        Some(Value::String(s)) if s.trim().is_empty() => 0,
        Some(cell) => coerce_order(cell).unwrap_or_else(|| {
            warn!(row = index, value = %cell, "Non-numeric order, sorting as 0");
            0
        }),
    };

    let section = cell_text(row, columns::SECTION);

    Ok(ContentRecord {
        kind,
        title,
        description: cell_text(row, columns::DESCRIPTION),
        url,
        inserted_at,
        categories: cell_text(row, columns::CATEGORIES).or_else(|| section.clone()),
        section,
        order,
    })
}

impl ContentRecord {
    /// The validated form of [`ContentRecord::url`], when the kind carries one.
    pub fn media_url(&self) -> Option<MediaUrl> {
        validate_media_url(&self.url).ok()
    }
}
