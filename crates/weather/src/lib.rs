//! City weather for the homepage widget.
//!
//! Coordinates come from a fixed table or the Open-Meteo geocoder, current
//! conditions from the Open-Meteo forecast API, and a background photo
//! from the Wikipedia page summary. Resolved records are cached per city
//! for [`cache::FRESHNESS`].

pub mod api;
pub mod cache;
pub mod resolver;

pub use api::{OpenMeteoClient, WeatherApi, WeatherError};
pub use cache::{FileStore, KeyValueStore, MemoryStore, WeatherCache};
pub use resolver::WeatherResolver;
