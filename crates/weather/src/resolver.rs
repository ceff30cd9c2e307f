//! City name → [`WeatherRecord`], through the cache.

use futures::future::join_all;
use homepage_core::weather::{
    cache_key, clean_city_name, known_city, round_degrees, round_wind, upscale_thumbnail,
    wiki_article, wmo_description, WeatherRecord,
};
use tokio_util::sync::CancellationToken;

use crate::api::{Coordinates, Forecast, WeatherApi};
use crate::cache::{now_millis, KeyValueStore, WeatherCache};

/// Cities shown by the widget at most.
pub const MAX_CITIES: usize = 5;

pub struct WeatherResolver<A, S> {
    api: A,
    cache: WeatherCache<S>,
}

impl<A: WeatherApi, S: KeyValueStore> WeatherResolver<A, S> {
    pub fn new(api: A, cache: WeatherCache<S>) -> Self {
        Self { api, cache }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn cache(&self) -> &WeatherCache<S> {
        &self.cache
    }

    /// Weather for one free-text city name, or `None` when it cannot be
    /// resolved. A fresh cache entry short-circuits all network access.
    pub async fn resolve(&self, city: &str, cancel: &CancellationToken) -> Option<WeatherRecord> {
        let city = city.trim();
        if city.is_empty() {
            return None;
        }

        let key = cache_key(city);
        if let Some(cached) = self.cache.get_fresh(&key, now_millis()) {
            tracing::debug!(city = %city, "Weather served from cache");
            return Some(cached);
        }

        let clean = clean_city_name(city);
        let place = self.locate(clean).await?;
        let article = wiki_article(&place.name, clean);

        let (forecast, photo) = tokio::join!(
            self.api.forecast(place.latitude, place.longitude),
            self.api.page_thumbnail(&article),
        );

        let forecast = match forecast {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(city = %city, error = %e, "Failed to fetch forecast");
                return None;
            }
        };
        let photo = match photo {
            Ok(url) => url.map(|u| upscale_thumbnail(&u)),
            Err(e) => {
                tracing::debug!(city = %city, article = %article, error = %e, "City photo unavailable");
                None
            }
        };

        if cancel.is_cancelled() {
            return None;
        }

        let record = build_record(&place.name, &forecast, photo);
        self.cache.put(&key, &record, now_millis());
        Some(record)
    }

    /// Resolve up to [`MAX_CITIES`] cities concurrently, keeping input
    /// order and dropping the ones that could not be resolved.
    pub async fn resolve_all(&self, cities: &[String], cancel: &CancellationToken) -> Vec<WeatherRecord> {
        let results = join_all(
            cities
                .iter()
                .take(MAX_CITIES)
                .map(|city| self.resolve(city, cancel)),
        )
        .await;

        if cancel.is_cancelled() {
            return Vec::new();
        }
        results.into_iter().flatten().collect()
    }

    /// Known-city table first; the geocoder only on a miss.
    async fn locate(&self, clean: &str) -> Option<Coordinates> {
        if let Some(known) = known_city(clean) {
            return Some(Coordinates {
                latitude: known.latitude,
                longitude: known.longitude,
                name: known.name.to_string(),
            });
        }

        match self.api.geocode(clean).await {
            Ok(Some(mut place)) => {
                if place.name.is_empty() {
                    place.name = clean.to_string();
                }
                Some(place)
            }
            Ok(None) => {
                tracing::warn!(city = %clean, "Geocoder found no match");
                None
            }
            Err(e) => {
                tracing::warn!(city = %clean, error = %e, "Geocoding failed");
                None
            }
        }
    }
}

fn first_rounded(values: Option<&Vec<Option<f64>>>) -> Option<i32> {
    values
        .and_then(|v| v.first().copied().flatten())
        .map(round_degrees)
}

/// Map a forecast response onto the display record.
pub fn build_record(city_name: &str, forecast: &Forecast, photo: Option<String>) -> WeatherRecord {
    let current = &forecast.current;
    let daily = forecast.daily.as_ref();

    WeatherRecord {
        city_name: city_name.to_string(),
        temperature: round_degrees(current.temperature_2m),
        description: wmo_description(current.weather_code).to_string(),
        weather_code: current.weather_code,
        humidity: current.relative_humidity_2m,
        wind_speed: round_wind(current.wind_speed_10m),
        is_day: current.is_day == 1,
        temp_high: first_rounded(daily.map(|d| &d.temperature_2m_max)),
        temp_low: first_rounded(daily.map(|d| &d.temperature_2m_min)),
        background_image_url: photo,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CurrentConditions, DailyForecast};

    #[test]
    fn record_rounds_and_maps_codes() {
        let forecast = Forecast {
            current: CurrentConditions {
                temperature_2m: 17.5,
                relative_humidity_2m: 55.5,
                weather_code: 61,
                wind_speed_10m: 9.87,
                is_day: 0,
            },
            daily: Some(DailyForecast {
                temperature_2m_max: vec![Some(21.4)],
                temperature_2m_min: vec![],
            }),
        };

        let record = build_record("Pretoria", &forecast, None);
        assert_eq!(record.temperature, 18);
        assert_eq!(record.description, "Rain");
        assert_eq!(record.humidity, 55.5);
        assert_eq!(record.wind_speed, 9.9);
        assert!(!record.is_day);
        assert_eq!(record.temp_high, Some(21));
        assert_eq!(record.temp_low, None);
    }
}
