use chrono::{Locale, NaiveDate, NaiveTime};
use url::form_urlencoded;

use super::{ALL_CATEGORIES, ContentView, Pager, Phase};
use crate::models::{ContentKind, ContentRecord};
use crate::repositories::RecordSource;

pub const LOADING_TEXT: &str = "Caricamento in corso...";
pub const EMPTY_TEXT: &str = "Nessun contenuto disponibile";
pub const EMPTY_FILTER_TEXT: &str = "Nessun contenuto per questa categoria";
pub const RETRY_LABEL: &str = "Riprova";
pub const ALL_LABEL: &str = "Tutti";
pub const VIDEO_FALLBACK_TEXT: &str = "Il tuo browser non supporta il tag video.";

/// Escapes the five HTML-special characters.
pub fn escape_html(unsafe_text: &str) -> String {
    let mut escaped = String::with_capacity(unsafe_text.len());
    for c in unsafe_text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Long Italian date, e.g. "09 settembre 2025".
pub fn format_date(date: NaiveDate) -> String {
    format_italian(date, "%d %B %Y")
}

/// Same without day padding, e.g. "9 settembre 2025".
pub fn format_event_date(date: NaiveDate) -> String {
    format_italian(date, "%-d %B %Y")
}

fn format_italian(date: NaiveDate, pattern: &str) -> String {
    date.and_time(NaiveTime::MIN)
        .and_utc()
        .format_localized(pattern, Locale::it_IT)
        .to_string()
}

/// Link target for a filter/page control. The fragment brings the mount
/// point back into view after navigation.
pub fn control_href(mount_id: &str, filter: &str, page: usize) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if filter != ALL_CATEGORIES {
        query.append_pair("filter", filter);
    }
    if page > 1 {
        query.append_pair("page", &page.to_string());
    }
    let query = query.finish();

    if query.is_empty() {
        format!("?#{mount_id}")
    } else {
        format!("?{query}#{mount_id}")
    }
}

pub fn loading_html() -> String {
    format!(
        r#"<div class="loading"><div class="spinner"></div><p>{LOADING_TEXT}</p></div>"#
    )
}

/// Error placeholder. The retry form posts back to the current URL.
pub fn error_html(message: &str) -> String {
    format!(
        concat!(
            r#"<div class="error"><p>{message}</p>"#,
            r#"<form class="retry-form" method="post">"#,
            r#"<input type="hidden" name="action" value="retry" />"#,
            r#"<button type="submit" class="retry-btn" data-action="retry">{label}</button>"#,
            r#"</form></div>"#
        ),
        message = escape_html(message),
        label = RETRY_LABEL,
    )
}

pub fn media_html(record: &ContentRecord) -> String {
    let url = escape_html(&record.url);
    let title = escape_html(&record.title);

    match record.kind {
        ContentKind::Image => format!(
            concat!(
                r#"<div class="media-wrapper">"#,
                r#"<img src="{url}" alt="{title}" loading="lazy" class="media-content" />"#,
                r#"<div class="media-placeholder"></div>"#,
                r#"</div>"#
            ),
            url = url,
            title = title,
        ),
        ContentKind::Video => format!(
            concat!(
                r#"<div class="media-wrapper video-wrapper">"#,
                r#"<video class="media-content" controls>"#,
                r#"<source src="{url}" type="video/mp4" />{fallback}"#,
                r#"</video><div class="play-icon">▶</div></div>"#
            ),
            url = url,
            fallback = VIDEO_FALLBACK_TEXT,
        ),
        ContentKind::InstagramPost => {
            let Some(post_id) = record.media_url().and_then(|u| u.last_segment().map(str::to_string))
            else {
                return String::new();
            };
            let post_id: String = form_urlencoded::byte_serialize(post_id.as_bytes()).collect();
            format!(
                concat!(
                    r#"<div class="media-wrapper instagram-wrapper">"#,
                    r#"<iframe src="https://www.instagram.com/p/{post_id}/embed" title="{title}" "#,
                    r#"class="media-content" frameborder="0" allowfullscreen></iframe>"#,
                    r#"</div>"#
                ),
                post_id = escape_html(&post_id),
                title = title,
            )
        }
        ContentKind::ExternalLink => format!(
            concat!(
                r#"<a href="{url}" target="_blank" rel="noopener noreferrer" class="external-link">"#,
                r#"<div class="media-wrapper"><div class="media-content url-content">"#,
                r#"<span class="link-icon">🔗</span><span class="link-text">{url}</span>"#,
                r#"</div></div></a>"#
            ),
            url = url,
        ),
        ContentKind::RawData => String::new(),
    }
}

pub fn card_html(record: &ContentRecord, show_dates: bool) -> String {
    let description = record
        .description
        .as_deref()
        .map(|d| format!(r#"<p class="item-description">{}</p>"#, escape_html(d)))
        .unwrap_or_default();

    let date = match record.inserted_at {
        Some(date) if show_dates => format!(
            r#"<div class="card-footer"><time class="date" datetime="{iso}">{label}</time></div>"#,
            iso = date.format("%Y-%m-%d"),
            label = format_date(date),
        ),
        _ => String::new(),
    };

    let kind = record.kind.css_class();
    format!(
        concat!(
            r#"<div class="gallery-item {kind}" data-type="{kind}">"#,
            r#"<div class="gallery-item-inner"><div class="media-container">"#,
            r#"{media}<div class="overlay"><h3 class="item-title">{title}</h3>{description}{date}</div>"#,
            r#"</div></div></div>"#
        ),
        kind = kind,
        media = media_html(record),
        title = escape_html(&record.title),
        description = description,
        date = date,
    )
}

impl<S: RecordSource> ContentView<S> {
    /// Markup for the current phase, ready to place inside the mount point.
    pub fn render(&self) -> String {
        match self.phase() {
            Phase::Loading => loading_html(),
            Phase::Error { message, .. } => error_html(message),
            Phase::Loaded if self.records().is_empty() => {
                format!(r#"<div class="no-content">{EMPTY_TEXT}</div>"#)
            }
            Phase::Loaded => self.render_gallery(),
        }
    }

    fn render_gallery(&self) -> String {
        let cards: String = self
            .page_records()
            .into_iter()
            .map(|record| card_html(record, self.options().show_dates))
            .collect();

        let grid = if cards.is_empty() {
            format!(r#"<div class="no-content">{EMPTY_FILTER_TEXT}</div>"#)
        } else {
            format!(r#"<div class="gallery-grid">{cards}</div>"#)
        };

        format!(
            r#"<div class="gallery-container" data-mount="{mount}"><div class="gallery-filters">{filters}</div>{grid}{pagination}</div>"#,
            mount = escape_html(self.mount().id()),
            filters = self.filters_html(),
            grid = grid,
            pagination = self.pagination_html(),
        )
    }

    pub fn filters_html(&self) -> String {
        if !self.options().show_categories {
            return String::new();
        }
        let categories = self.categories();
        if categories.is_empty() {
            return String::new();
        }

        let mount_id = self.mount().id();
        let chip = |token: &str, label: &str| {
            let active = if self.current_filter() == token { " active" } else { "" };
            format!(
                r#"<a class="filter-btn{active}" data-filter="{token}" href="{href}">{label}</a>"#,
                token = escape_html(token),
                href = escape_html(&control_href(mount_id, token, 1)),
                label = escape_html(label),
            )
        };

        let mut html = String::from(r#"<div class="filters">"#);
        html.push_str(&chip(ALL_CATEGORIES, ALL_LABEL));
        for category in &categories {
            html.push_str(&chip(category.as_str(), category.as_str()));
        }
        html.push_str("</div>");
        html
    }

    pub fn pagination_html(&self) -> String {
        let Some(pager) = Pager::new(self.current_page(), self.total_pages()) else {
            return String::new();
        };

        let mount_id = self.mount().id();
        let filter = self.current_filter();
        let button = |page: usize, class: &str, label: &str| {
            format!(
                r#"<a class="{class}" data-page="{page}" href="{href}">{label}</a>"#,
                href = escape_html(&control_href(mount_id, filter, page)),
            )
        };

        let mut html = String::from(r#"<nav class="pagination">"#);
        if let Some(previous) = pager.previous() {
            html.push_str(&button(previous, "page-btn page-prev", "&laquo; Precedente"));
        }
        for page in pager.numbers() {
            let class = if page == pager.current {
                "page-btn active"
            } else {
                "page-btn"
            };
            html.push_str(&button(page, class, &page.to_string()));
        }
        if let Some(next) = pager.next() {
            html.push_str(&button(next, "page-btn page-next", "Successivo &raquo;"));
        }
        html.push_str("</nav>");
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::test_helpers::{FailingSource, StaticSource, record};
    use crate::view::ViewOptions;

    async fn loaded(records: Vec<ContentRecord>, options: ViewOptions) -> ContentView<StaticSource> {
        let document = Document::site();
        let mut view = ContentView::new(options, &document, StaticSource::new(records)).unwrap();
        view.refresh().await;
        view
    }

    #[test]
    fn test_escape_html_covers_special_characters() {
        assert_eq!(
            escape_html(r#"<script>&"'"#),
            "&lt;script&gt;&amp;&quot;&#039;"
        );
        assert_eq!(escape_html("Duo Mazzola"), "Duo Mazzola");
    }

    #[test]
    fn test_format_date_is_italian() {
        let date = NaiveDate::from_ymd_opt(2025, 9, 9).unwrap();
        assert_eq!(format_date(date), "09 settembre 2025");
        assert_eq!(format_event_date(date), "9 settembre 2025");
    }

    #[test]
    fn test_control_href() {
        assert_eq!(control_href("galleria", ALL_CATEGORIES, 1), "?#galleria");
        assert_eq!(control_href("galleria", ALL_CATEGORIES, 2), "?page=2#galleria");
        assert_eq!(
            control_href("galleria", "Teatro & Co", 3),
            "?filter=Teatro+%26+Co&page=3#galleria"
        );
    }

    #[test]
    fn test_image_is_lazy() {
        let html = media_html(&record("Foto", ContentKind::Image));
        assert!(html.contains(r#"<img src="https://example.com/foto.jpg""#));
        assert!(html.contains(r#"loading="lazy""#));
    }

    #[test]
    fn test_video_has_single_source_and_fallback() {
        let mut video = record("Live", ContentKind::Video);
        video.url = "https://example.com/live.mp4".to_string();
        let html = media_html(&video);
        assert_eq!(html.matches("<source").count(), 1);
        assert!(html.contains(VIDEO_FALLBACK_TEXT));
    }

    #[test]
    fn test_instagram_embed_uses_last_segment() {
        let mut post = record("Post", ContentKind::InstagramPost);
        post.url = "https://www.instagram.com/p/C9xYz/".to_string();
        let html = media_html(&post);
        assert!(html.contains(r#"src="https://www.instagram.com/p/C9xYz/embed""#));
    }

    #[test]
    fn test_external_link_opens_new_context() {
        let mut link = record("Link", ContentKind::ExternalLink);
        link.url = "https://example.com/x".to_string();
        let html = media_html(&link);
        assert!(html.contains(r#"href="https://example.com/x""#));
        assert!(html.contains(r#"target="_blank""#));
        assert!(html.contains(r#"rel="noopener noreferrer""#));
        assert!(html.contains(r#"<span class="link-text">https://example.com/x</span>"#));
    }

    #[test]
    fn test_raw_data_has_no_media_but_keeps_text() {
        let mut data = record("Nota", ContentKind::RawData);
        data.description = Some("Solo testo".to_string());
        assert_eq!(media_html(&data), "");

        let card = card_html(&data, true);
        assert!(card.contains(r#"<h3 class="item-title">Nota</h3>"#));
        assert!(card.contains("Solo testo"));
    }

    #[test]
    fn test_card_escapes_user_text() {
        let mut hostile = record("<script>alert('x')</script>", ContentKind::RawData);
        hostile.description = Some(r#"a & "b""#.to_string());
        let card = card_html(&hostile, true);
        assert!(!card.contains("<script>"));
        assert!(card.contains("&lt;script&gt;alert(&#039;x&#039;)&lt;/script&gt;"));
        assert!(card.contains("a &amp; &quot;b&quot;"));
    }

    #[test]
    fn test_dates_follow_option() {
        let mut dated = record("Con data", ContentKind::RawData);
        dated.inserted_at = NaiveDate::from_ymd_opt(2024, 12, 1);
        assert!(card_html(&dated, true).contains("01 dicembre 2024"));
        assert!(!card_html(&dated, false).contains("card-footer"));
    }

    #[tokio::test]
    async fn test_first_page_of_ten_records() {
        let records: Vec<_> = (1..=10)
            .map(|i| {
                let mut r = record(&format!("Record {i}"), ContentKind::Image);
                r.order = i;
                r
            })
            .collect();
        let view = loaded(records, ViewOptions::new("galleria")).await;
        let html = view.render();

        assert_eq!(html.matches(r#"class="gallery-item "#).count(), 9);
        assert!(html.contains("Record 1<"));
        assert!(html.contains("Record 9<"));
        assert!(!html.contains("Record 10<"));
        assert_eq!(html.matches("page-next").count(), 1);
        assert_eq!(html.matches("page-prev").count(), 0);
    }

    #[tokio::test]
    async fn test_no_pagination_for_single_page() {
        let view = loaded(
            vec![record("Solo", ContentKind::Image)],
            ViewOptions::new("galleria"),
        )
        .await;
        assert_eq!(view.pagination_html(), "");
    }

    #[tokio::test]
    async fn test_filter_bar_lists_sorted_categories() {
        let mut a = record("a", ContentKind::Image);
        a.categories = Some("Roma, Estate".to_string());
        let mut b = record("b", ContentKind::Image);
        b.categories = Some("Autunno".to_string());

        let mut view = loaded(vec![a, b], ViewOptions::new("galleria")).await;
        view.filter_by_category("Estate");
        let html = view.filters_html();

        let all = html.find(r#"data-filter="all""#).unwrap();
        let autunno = html.find(r#"data-filter="Autunno""#).unwrap();
        let estate = html.find(r#"data-filter="Estate""#).unwrap();
        let roma = html.find(r#"data-filter="Roma""#).unwrap();
        assert!(all < autunno && autunno < estate && estate < roma);
        assert!(html.contains(r#"class="filter-btn active" data-filter="Estate""#));
        assert!(html.contains(r#"class="filter-btn" data-filter="all""#));
    }

    #[tokio::test]
    async fn test_filter_bar_hidden_without_categories_or_when_disabled() {
        let view = loaded(vec![record("a", ContentKind::Image)], ViewOptions::new("galleria")).await;
        assert_eq!(view.filters_html(), "");

        let mut tagged = record("a", ContentKind::Image);
        tagged.categories = Some("Roma".to_string());
        let view = loaded(
            vec![tagged],
            ViewOptions::new("galleria").show_categories(false),
        )
        .await;
        assert_eq!(view.filters_html(), "");
    }

    #[tokio::test]
    async fn test_empty_sheet_renders_no_content() {
        let view = loaded(vec![], ViewOptions::new("galleria")).await;
        assert!(view.render().contains(EMPTY_TEXT));
    }

    #[tokio::test]
    async fn test_error_render_offers_retry() {
        let document = Document::site();
        let mut view = ContentView::new(
            ViewOptions::new("galleria"),
            &document,
            FailingSource::status(500),
        )
        .unwrap();
        assert!(view.render().contains(LOADING_TEXT));

        view.refresh().await;
        let html = view.render();
        assert!(html.contains("Errore nel caricamento dei contenuti"));
        assert!(html.contains(r#"class="retry-btn""#));
        assert!(!html.contains("500"), "technical details stay out of the page");
    }
}
