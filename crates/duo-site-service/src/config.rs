use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use url::Url;

use crate::errors::ConfigurationError;
use crate::repositories::sheetdb::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};
use crate::validation::validate_endpoint;
use crate::view::ViewOptions;

pub const DEFAULT_BIND_ADDRESS: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 3000));
pub const DEFAULT_ITEMS_PER_PAGE: usize = 9;

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone, PartialEq)]
pub struct SiteConfig {
    pub endpoint: Url,
    pub bind_address: SocketAddr,
    pub fetch_timeout: Duration,
    pub items_per_page: usize,
    pub show_categories: bool,
    pub show_dates: bool,
}

impl SiteConfig {
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigurationError> {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let endpoint = validate_endpoint(
            get("SHEETDB_ENDPOINT")
                .as_deref()
                .unwrap_or(DEFAULT_ENDPOINT),
        )?;

        let bind_address = parse_var("BIND_ADDRESS", get("BIND_ADDRESS"))?
            .unwrap_or(DEFAULT_BIND_ADDRESS);

        let fetch_timeout = parse_var::<u64>("FETCH_TIMEOUT_SECS", get("FETCH_TIMEOUT_SECS"))?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        if fetch_timeout.is_zero() {
            return Err(ConfigurationError::InvalidVar {
                var: "FETCH_TIMEOUT_SECS",
                reason: "must be at least 1".to_string(),
            });
        }

        let items_per_page = parse_var("ITEMS_PER_PAGE", get("ITEMS_PER_PAGE"))?
            .unwrap_or(DEFAULT_ITEMS_PER_PAGE);
        if items_per_page == 0 {
            return Err(ConfigurationError::InvalidPageSize);
        }

        Ok(Self {
            endpoint,
            bind_address,
            fetch_timeout,
            items_per_page,
            show_categories: parse_flag("SHOW_CATEGORIES", get("SHOW_CATEGORIES"))?,
            show_dates: parse_flag("SHOW_DATES", get("SHOW_DATES"))?,
        })
    }

    pub fn gallery_options(&self, mount_id: &str) -> ViewOptions {
        ViewOptions::new(mount_id)
            .items_per_page(self.items_per_page)
            .show_categories(self.show_categories)
            .show_dates(self.show_dates)
    }
}

fn parse_var<T>(var: &'static str, value: Option<String>) -> Result<Option<T>, ConfigurationError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|err: T::Err| ConfigurationError::InvalidVar {
                var,
                reason: err.to_string(),
            }),
        None => Ok(None),
    }
}

fn parse_flag(var: &'static str, value: Option<String>) -> Result<bool, ConfigurationError> {
    let Some(raw) = value else {
        return Ok(true);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigurationError::InvalidVar {
            var,
            reason: format!("expected a boolean, got {other:?}"),
        }),
    }
}
