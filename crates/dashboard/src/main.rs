mod config;
mod snapshot;

use std::io;
use std::time::Duration;

use anyhow::Context;
use chrono::{Local, Timelike, Utc};
use homepage_core::calendar::MonthCursor;
use homepage_graph::odata::ODataQuery;
use homepage_graph::{aggregate, fetch_month_events, fetch_praises, ApiVersion, GraphApi, GraphClient};
use homepage_sharepoint::{fetch_all_cards, SharePointApi};
use homepage_weather::{FileStore, KeyValueStore, MemoryStore, OpenMeteoClient, WeatherCache, WeatherResolver};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::DashboardConfig;
use snapshot::{build_snapshot, Clock, GraphResults};

/// Weather cache backend chosen at startup.
enum CacheStore {
    Memory(MemoryStore),
    File(FileStore),
}

impl KeyValueStore for CacheStore {
    fn get(&self, key: &str) -> Option<String> {
        match self {
            Self::Memory(store) => store.get(key),
            Self::File(store) => store.get(key),
        }
    }

    fn set(&self, key: &str, value: String) -> io::Result<()> {
        match self {
            Self::Memory(store) => store.set(key, value),
            Self::File(store) => store.set(key, value),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "homepage_dashboard=info,homepage_graph=info,homepage_weather=info,homepage_sharepoint=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = DashboardConfig::from_env()?;
    tracing::info!(
        cards = config.cards.iter().filter(|c| c.is_configured()).count(),
        cities = config.weather_cities.len(),
        graph = config.graph_token.is_some(),
        "Starting fetch cycle"
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    let store = match &config.weather_cache_dir {
        Some(dir) => CacheStore::File(
            FileStore::open(dir).with_context(|| format!("Failed to open weather cache at {}", dir.display()))?,
        ),
        None => CacheStore::Memory(MemoryStore::new()),
    };

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, cancelling fetch cycle");
                cancel.cancel();
            }
        }
    });

    let sharepoint = SharePointApi::with_client(client.clone(), config.sharepoint_token.clone());
    let weather = WeatherResolver::new(OpenMeteoClient::with_client(client.clone()), WeatherCache::new(store));
    let graph = config
        .graph_token
        .clone()
        .map(|token| GraphClient::with_client(client, token));

    let today = Local::now();
    let (card_items, cities, personal) = tokio::join!(
        fetch_all_cards(&sharepoint, &config.cards, &cancel),
        weather.resolve_all(&config.weather_cities, &cancel),
        async {
            match &graph {
                Some(api) => Some(fetch_personal(api, MonthCursor::containing(today.date_naive()), &cancel).await),
                None => None,
            }
        },
    );

    if cancel.is_cancelled() {
        tracing::warn!("Fetch cycle cancelled, nothing to show");
        return Ok(());
    }

    let clock = Clock {
        now: Utc::now(),
        today: today.date_naive(),
        local_hour: today.hour(),
    };
    let snapshot = build_snapshot(&clock, &config.cards, &card_items, cities, personal);
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

async fn fetch_personal<G>(api: &G, month: MonthCursor, cancel: &CancellationToken) -> GraphResults
where
    G: GraphApi + ?Sized,
{
    let (display_name, board, praises, events) = tokio::join!(
        fetch_display_name(api),
        aggregate(api, cancel),
        fetch_praises(api, cancel),
        fetch_month_events(api, month, cancel),
    );
    GraphResults { display_name, board, praises, events }
}

/// Signed-in user's display name, or empty when the profile is unavailable.
async fn fetch_display_name<G>(api: &G) -> String
where
    G: GraphApi + ?Sized,
{
    let path = ODataQuery::new().select("displayName").apply("/me");
    match api.get(ApiVersion::V1, &path).await {
        Ok(profile) => profile["displayName"].as_str().unwrap_or_default().to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch user profile");
            String::new()
        }
    }
}
