//! Upcoming concerts, derived from the same sheet rows as the gallery.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::ContentRecord;
use crate::view::{CategorySet, escape_html, render::format_event_date};

/// Section or category tokens that mark a row as a concert.
pub const CONCERT_MARKERS: [&str; 2] = ["concerti", "concerts"];
pub const UNKNOWN_LOCATION: &str = "Luogo da definire";
pub const NO_EVENTS_TEXT: &str =
    "Nessun concerto in programma al momento. Torna presto per aggiornamenti!";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Concert {
    pub title: String,
    pub date: NaiveDate,
    pub location: String,
    pub description: Option<String>,
    pub image: String,
}

impl Concert {
    /// A row is a concert when its `CATEGORIA` section or one of its
    /// categories is a marker. It also needs a date to be listed.
    pub fn from_record(record: &ContentRecord) -> Option<Self> {
        let categories = CategorySet::of(record);
        let in_section = record.section.as_deref().is_some_and(|section| {
            CONCERT_MARKERS
                .iter()
                .any(|marker| section.trim().eq_ignore_ascii_case(marker))
        });
        let tagged = CONCERT_MARKERS
            .iter()
            .any(|marker| categories.contains_ignore_case(marker));
        if !in_section && !tagged {
            return None;
        }

        let location: Vec<&str> = categories
            .iter()
            .filter(|token| {
                !CONCERT_MARKERS
                    .iter()
                    .any(|marker| token.eq_ignore_ascii_case(marker))
            })
            .collect();

        Some(Self {
            title: record.title.clone(),
            date: record.inserted_at?,
            location: if location.is_empty() {
                UNKNOWN_LOCATION.to_string()
            } else {
                location.join(", ")
            },
            description: record.description.clone(),
            image: record.url.clone(),
        })
    }
}

/// Concerts dated strictly after `today`, latest first.
pub fn upcoming_concerts(records: &[ContentRecord], today: NaiveDate) -> Vec<Concert> {
    let mut concerts: Vec<Concert> = records
        .iter()
        .filter_map(Concert::from_record)
        .filter(|concert| concert.date > today)
        .collect();
    concerts.sort_by(|a, b| b.date.cmp(&a.date));
    concerts
}

pub fn render_concerts(concerts: &[Concert]) -> String {
    if concerts.is_empty() {
        return format!(r#"<p class="no-events">{NO_EVENTS_TEXT}</p>"#);
    }

    let cards: String = concerts
        .iter()
        .map(|concert| {
            let image = if concert.image.is_empty() {
                String::new()
            } else {
                format!(
                    r#"<img src="{}" alt="{}" loading="lazy" />"#,
                    escape_html(&concert.image),
                    escape_html(&concert.title),
                )
            };
            format!(
                concat!(
                    r#"<div class="concert-card"><div class="concert-image">{image}"#,
                    r#"<div class="concert-date">{date}</div></div>"#,
                    r#"<div class="concert-info"><h4>{title}</h4>"#,
                    r#"<div class="concert-location"><i class="location-icon">📍</i> {location}</div>"#,
                    r#"{description}</div></div>"#
                ),
                image = image,
                date = format_event_date(concert.date),
                title = escape_html(&concert.title),
                location = escape_html(&concert.location),
                description = concert
                    .description
                    .as_deref()
                    .map(|d| format!("<p>{}</p>", escape_html(d)))
                    .unwrap_or_default(),
            )
        })
        .collect();

    format!(r#"<div class="concerts-grid">{cards}</div>"#)
}
