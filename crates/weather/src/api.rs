//! HTTP clients for the geocoding, forecast, and encyclopedia endpoints.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;

pub const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const SUMMARY_URL: &str = "https://en.wikipedia.org/api/rest_v1/page/summary";

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,weather_code,wind_speed_10m,is_day";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min";

/// Errors from the weather HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote service returned a non-2xx status code.
    #[error("Weather API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

/// A resolved place: where to ask for a forecast and what to call it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<Coordinates>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentConditions {
    pub temperature_2m: f64,
    pub relative_humidity_2m: f64,
    pub weather_code: i32,
    pub wind_speed_10m: f64,
    /// `1` in daylight, `0` at night.
    pub is_day: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DailyForecast {
    pub temperature_2m_max: Vec<Option<f64>>,
    pub temperature_2m_min: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Forecast {
    pub current: CurrentConditions,
    #[serde(default)]
    pub daily: Option<DailyForecast>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageSummary {
    thumbnail: Option<Thumbnail>,
}

// ---------------------------------------------------------------------------
// Seam
// ---------------------------------------------------------------------------

/// The three remote lookups the resolver needs.
#[async_trait]
pub trait WeatherApi: Send + Sync {
    /// First geocoder match for `name`, or `None` when nothing matched.
    async fn geocode(&self, name: &str) -> Result<Option<Coordinates>, WeatherError>;

    /// Current conditions and today's high/low.
    async fn forecast(&self, latitude: f64, longitude: f64) -> Result<Forecast, WeatherError>;

    /// Raw thumbnail URL from the summary of `article`, if the page has one.
    async fn page_thumbnail(&self, article: &str) -> Result<Option<String>, WeatherError>;
}

/// Open-Meteo and Wikipedia over HTTP. No API keys are needed.
pub struct OpenMeteoClient {
    client: reqwest::Client,
}

impl OpenMeteoClient {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    // ---- private helpers ----

    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, WeatherError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(WeatherError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, WeatherError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

impl Default for OpenMeteoClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WeatherApi for OpenMeteoClient {
    async fn geocode(&self, name: &str) -> Result<Option<Coordinates>, WeatherError> {
        let response = self
            .client
            .get(GEOCODING_URL)
            .query(&[("name", name), ("count", "1"), ("language", "en"), ("format", "json")])
            .send()
            .await?;

        let body: GeocodeResponse = Self::parse_response(response).await?;
        Ok(body.results.into_iter().next())
    }

    async fn forecast(&self, latitude: f64, longitude: f64) -> Result<Forecast, WeatherError> {
        let response = self
            .client
            .get(FORECAST_URL)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("daily", DAILY_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
                ("forecast_days", "1".to_string()),
            ])
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn page_thumbnail(&self, article: &str) -> Result<Option<String>, WeatherError> {
        let response = self
            .client
            .get(format!("{SUMMARY_URL}/{}", urlencoding::encode(article)))
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let summary: PageSummary = Self::parse_response(response).await?;
        Ok(summary.thumbnail.and_then(|t| t.source))
    }
}
