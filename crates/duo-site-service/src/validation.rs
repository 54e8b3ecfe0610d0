use std::fmt;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("URL cannot be empty")]
    EmptyUrl,
    #[error("Malformed URL: {0}")]
    MalformedUrl(String),
    #[error("URL must have a host")]
    MissingHost,
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
}

/// A media or link target taken from a spreadsheet cell.
///
/// Guarantees: either an absolute `http`/`https` URL with a host, or a path
/// rooted at the site (`/img/foto.jpg`). Protocol-relative `//host` paths are
/// parsed as absolute URLs, never as site paths.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaUrl {
    Absolute(Url),
    SitePath(String),
}

impl MediaUrl {
    /// Last non-empty path segment, e.g. the post id of an Instagram link.
    pub fn last_segment(&self) -> Option<&str> {
        match self {
            MediaUrl::Absolute(url) => url
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last()),
            MediaUrl::SitePath(path) => {
                let path = path.split(['?', '#']).next().unwrap_or_default();
                path.split('/').filter(|s| !s.is_empty()).last()
            }
        }
    }
}

impl fmt::Display for MediaUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaUrl::Absolute(url) => write!(f, "{url}"),
            MediaUrl::SitePath(path) => write!(f, "{path}"),
        }
    }
}

fn check_web_url(url: Url, raw: &str) -> Result<Url, ValidationError> {
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(ValidationError::UnsupportedScheme(scheme.to_string())),
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        Some(_) => Err(ValidationError::MissingHost),
        None => Err(ValidationError::MalformedUrl(raw.to_string())),
    }
}

pub fn validate_media_url(raw: &str) -> Result<MediaUrl, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }

    if raw.starts_with('/') && !raw.starts_with("//") {
        return Ok(MediaUrl::SitePath(raw.to_string()));
    }

    let candidate = if raw.starts_with("//") {
        format!("https:{raw}")
    } else {
        raw.to_string()
    };

    let url = Url::parse(&candidate).map_err(|_| ValidationError::MalformedUrl(raw.to_string()))?;
    check_web_url(url, raw).map(MediaUrl::Absolute)
}

/// Validates the spreadsheet API endpoint the adapter talks to.
pub fn validate_endpoint(raw: &str) -> Result<Url, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }

    let url = Url::parse(raw).map_err(|_| ValidationError::MalformedUrl(raw.to_string()))?;
    check_web_url(url, raw)
}
