use std::path::PathBuf;

use anyhow::Context;
use homepage_core::carousel::{CarouselCardConfig, DEFAULT_CARD_LABELS};

/// Number of carousel cards the homepage shows.
pub const CARD_COUNT: usize = 3;

pub const DEFAULT_WEATHER_CITIES: &str = "Johannesburg,Cape Town,Durban";

/// Dashboard configuration loaded from environment variables.
///
/// Every field has a default suitable for a demo tenant. Graph pipelines
/// only run when a Graph token is supplied.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Bearer token for SharePoint REST calls.
    pub sharepoint_token: Option<String>,
    /// Bearer token for Microsoft Graph calls.
    pub graph_token: Option<String>,
    /// One entry per carousel card, in display order.
    pub cards: Vec<CarouselCardConfig>,
    /// Cities for the weather widget, parsed from comma-separated `WEATHER_CITIES`.
    pub weather_cities: Vec<String>,
    /// Directory for persisted weather cache entries. In-memory when unset.
    pub weather_cache_dir: Option<PathBuf>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
}

impl DashboardConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                          |
    /// |-----------------------------|----------------------------------|
    /// | `SP_ACCESS_TOKEN`           | none                             |
    /// | `GRAPH_ACCESS_TOKEN`        | none                             |
    /// | `CARD{n}_SITE_URL`          | default intranet site            |
    /// | `CARD{n}_LIST_NAME`         | empty (card shows nothing)       |
    /// | `CARD{n}_LABEL`             | `Updates` / `News` / `Announcements` |
    /// | `CARD{n}_TITLE_COLUMN`      | `Title`                          |
    /// | `CARD{n}_CONTENT_COLUMN`    | `Body`                           |
    /// | `CARD{n}_IMAGE_COLUMN`      | empty                            |
    /// | `CARD{n}_ATTACHMENT_COLUMN` | empty                            |
    /// | `CARD{n}_DATE_COLUMN`       | `Created`                        |
    /// | `WEATHER_CITIES`            | `Johannesburg,Cape Town,Durban`  |
    /// | `WEATHER_CACHE_DIR`         | none                             |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                             |
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let cards = (1..=CARD_COUNT)
            .map(|n| {
                let var = |suffix: &str| lookup(&format!("CARD{n}_{suffix}")).unwrap_or_default();
                let label = non_empty(&format!("CARD{n}_LABEL"))
                    .unwrap_or_else(|| DEFAULT_CARD_LABELS[n - 1].to_string());
                CarouselCardConfig {
                    site_url: var("SITE_URL"),
                    list_name: var("LIST_NAME"),
                    card_label: label,
                    title_column: var("TITLE_COLUMN"),
                    content_column: var("CONTENT_COLUMN"),
                    image_column: var("IMAGE_COLUMN"),
                    attachment_column: var("ATTACHMENT_COLUMN"),
                    date_column: var("DATE_COLUMN"),
                }
                .resolved()
            })
            .collect();

        let weather_cities = lookup("WEATHER_CITIES")
            .unwrap_or_else(|| DEFAULT_WEATHER_CITIES.into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = lookup("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".into())
            .trim()
            .parse()
            .context("REQUEST_TIMEOUT_SECS must be a valid u64")?;

        Ok(Self {
            sharepoint_token: non_empty("SP_ACCESS_TOKEN"),
            graph_token: non_empty("GRAPH_ACCESS_TOKEN"),
            cards,
            weather_cities,
            weather_cache_dir: non_empty("WEATHER_CACHE_DIR").map(PathBuf::from),
            request_timeout_secs,
        })
    }
}
