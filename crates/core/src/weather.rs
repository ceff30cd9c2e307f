//! Weather display record and the fixed lookup tables behind it.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Prefix of every weather cache key.
pub const CACHE_KEY_PREFIX: &str = "cwi_weather_";

/// Width requested when rewriting encyclopedia thumbnail URLs.
pub const THUMBNAIL_WIDTH_PX: u32 = 800;

static THUMB_WIDTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\d+px-").expect("valid regex"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s").expect("valid regex"));

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Current conditions for one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRecord {
    pub city_name: String,
    /// Whole degrees Celsius.
    pub temperature: i32,
    pub description: String,
    /// WMO present-weather code.
    pub weather_code: i32,
    /// Relative humidity in percent, as reported.
    pub humidity: f64,
    /// km/h, one decimal place.
    pub wind_speed: f64,
    pub is_day: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_high: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_low: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image_url: Option<String>,
}

impl WeatherRecord {
    pub fn icon_category(&self) -> IconCategory {
        icon_category(self.weather_code, self.is_day)
    }
}

/// Round to the nearest whole degree, halves away from zero.
pub fn round_degrees(value: f64) -> i32 {
    value.round() as i32
}

/// Round wind speed to one decimal place.
pub fn round_wind(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ---------------------------------------------------------------------------
// WMO code tables
// ---------------------------------------------------------------------------

/// Human-readable text for a WMO weather code.
pub fn wmo_description(code: i32) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 | 48 => "Fog",
        51..=55 => "Drizzle",
        56 | 57 => "Freezing drizzle",
        61..=65 => "Rain",
        66 | 67 => "Freezing rain",
        71..=77 => "Snow",
        80..=82 => "Rain showers",
        85 | 86 => "Snow showers",
        95 => "Thunderstorm",
        96 | 99 => "Thunderstorm with hail",
        _ => "Unknown",
    }
}

/// Icon family drawn for a weather code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IconCategory {
    ClearDay,
    ClearNight,
    PartlyDay,
    PartlyNight,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Thunder,
}

/// Map a WMO code to its icon family. Codes are bucketed by upper bound,
/// so gaps in the WMO table fall into the next bucket up.
pub fn icon_category(code: i32, is_day: bool) -> IconCategory {
    match code {
        i32::MIN..=0 => {
            if is_day {
                IconCategory::ClearDay
            } else {
                IconCategory::ClearNight
            }
        }
        1..=2 => {
            if is_day {
                IconCategory::PartlyDay
            } else {
                IconCategory::PartlyNight
            }
        }
        3 => IconCategory::Cloudy,
        4..=48 => IconCategory::Fog,
        49..=57 => IconCategory::Drizzle,
        58..=67 => IconCategory::Rain,
        68..=77 => IconCategory::Snow,
        78..=82 => IconCategory::Rain,
        83..=86 => IconCategory::Snow,
        _ => IconCategory::Thunder,
    }
}

// ---------------------------------------------------------------------------
// City tables
// ---------------------------------------------------------------------------

/// Coordinates and canonical name of a city that needs no geocoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnownCity {
    pub latitude: f64,
    pub longitude: f64,
    pub name: &'static str,
}

/// Lowercase lookup key → known city.
const KNOWN_CITIES: &[(&str, KnownCity)] = &[
    ("johannesburg", KnownCity { latitude: -26.2044, longitude: 28.0456, name: "Johannesburg" }),
    ("pretoria", KnownCity { latitude: -25.7479, longitude: 28.2293, name: "Pretoria" }),
    ("cape town", KnownCity { latitude: -33.9249, longitude: 18.4241, name: "Cape Town" }),
    ("capetown", KnownCity { latitude: -33.9249, longitude: 18.4241, name: "Cape Town" }),
    ("durban", KnownCity { latitude: -29.8587, longitude: 31.0218, name: "Durban" }),
    ("bloemfontein", KnownCity { latitude: -29.0852, longitude: 26.1596, name: "Bloemfontein" }),
    ("port elizabeth", KnownCity { latitude: -33.9608, longitude: 25.6022, name: "Port Elizabeth" }),
    ("gqeberha", KnownCity { latitude: -33.9608, longitude: 25.6022, name: "Gqeberha" }),
    ("polokwane", KnownCity { latitude: -23.9045, longitude: 29.4689, name: "Polokwane" }),
    ("mbombela", KnownCity { latitude: -25.4753, longitude: 30.9694, name: "Mbombela" }),
    ("nelspruit", KnownCity { latitude: -25.4753, longitude: 30.9694, name: "Nelspruit" }),
    ("east london", KnownCity { latitude: -33.0292, longitude: 27.8546, name: "East London" }),
    ("kimberley", KnownCity { latitude: -28.7282, longitude: 24.7499, name: "Kimberley" }),
    ("pietermaritzburg", KnownCity { latitude: -29.6006, longitude: 30.3794, name: "Pietermaritzburg" }),
];

/// Lowercase lookup key → encyclopedia article title.
const WIKI_ARTICLES: &[(&str, &str)] = &[
    ("johannesburg", "Johannesburg"),
    ("sandton", "Sandton"),
    ("pretoria", "Pretoria"),
    ("cape town", "Cape_Town"),
    ("capetown", "Cape_Town"),
    ("durban", "Durban"),
    ("bloemfontein", "Bloemfontein"),
    ("port elizabeth", "Gqeberha"),
    ("gqeberha", "Gqeberha"),
    ("polokwane", "Polokwane"),
    ("mbombela", "Mbombela"),
    ("nelspruit", "Mbombela"),
    ("east london", "East_London,_Eastern_Cape"),
    ("kimberley", "Kimberley,_Northern_Cape"),
    ("pietermaritzburg", "Pietermaritzburg"),
];

/// Drop a trailing region suffix: `"Johannesburg, ZA"` → `"Johannesburg"`.
pub fn clean_city_name(city: &str) -> &str {
    city.split(',').next().unwrap_or("").trim()
}

/// Look up a cleaned city name in the known-city table.
pub fn known_city(clean_name: &str) -> Option<KnownCity> {
    let key = clean_name.to_lowercase();
    KNOWN_CITIES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, city)| *city)
}

/// Article title for a city photo. Tries the display name, then the
/// cleaned input, then falls back to the display name with underscores.
pub fn wiki_article(display_name: &str, clean_name: &str) -> String {
    let lookup = |name: &str| {
        let key = name.to_lowercase();
        WIKI_ARTICLES
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, article)| article.to_string())
    };
    lookup(display_name)
        .or_else(|| lookup(clean_name))
        .unwrap_or_else(|| display_name.replace(' ', "_"))
}

/// Rewrite a thumbnail URL to request the [`THUMBNAIL_WIDTH_PX`] variant.
pub fn upscale_thumbnail(url: &str) -> String {
    THUMB_WIDTH_RE
        .replace(url, format!("/{THUMBNAIL_WIDTH_PX}px-").as_str())
        .into_owned()
}

/// Cache key for a free-text city name.
pub fn cache_key(city: &str) -> String {
    format!(
        "{CACHE_KEY_PREFIX}{}",
        WHITESPACE_RE.replace_all(&city.to_lowercase(), "_")
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- WMO ------------------------------------------------------------------

    #[test]
    fn wmo_table() {
        let cases = [
            (0, "Clear sky"),
            (1, "Mainly clear"),
            (2, "Partly cloudy"),
            (3, "Overcast"),
            (45, "Fog"),
            (48, "Fog"),
            (53, "Drizzle"),
            (57, "Freezing drizzle"),
            (63, "Rain"),
            (66, "Freezing rain"),
            (75, "Snow"),
            (81, "Rain showers"),
            (86, "Snow showers"),
            (95, "Thunderstorm"),
            (99, "Thunderstorm with hail"),
            (4, "Unknown"),
            (100, "Unknown"),
        ];
        for (code, text) in cases {
            assert_eq!(wmo_description(code), text, "code {code}");
        }
    }

    #[test]
    fn icon_categories() {
        assert_eq!(icon_category(0, true), IconCategory::ClearDay);
        assert_eq!(icon_category(0, false), IconCategory::ClearNight);
        assert_eq!(icon_category(2, false), IconCategory::PartlyNight);
        assert_eq!(icon_category(3, true), IconCategory::Cloudy);
        assert_eq!(icon_category(45, true), IconCategory::Fog);
        assert_eq!(icon_category(55, true), IconCategory::Drizzle);
        assert_eq!(icon_category(65, true), IconCategory::Rain);
        assert_eq!(icon_category(73, true), IconCategory::Snow);
        assert_eq!(icon_category(80, true), IconCategory::Rain);
        assert_eq!(icon_category(85, true), IconCategory::Snow);
        assert_eq!(icon_category(95, true), IconCategory::Thunder);
    }

    // -- Rounding -------------------------------------------------------------

    #[test]
    fn rounding() {
        assert_eq!(round_degrees(21.5), 22);
        assert_eq!(round_degrees(-0.4), 0);
        assert_eq!(round_wind(12.34), 12.3);
        assert_eq!(round_wind(12.36), 12.4);
    }

    // -- Cities ---------------------------------------------------------------

    #[test]
    fn clean_strips_region_suffix() {
        assert_eq!(clean_city_name("Johannesburg,ZA"), "Johannesburg");
        assert_eq!(clean_city_name("  Durban , KZN"), "Durban");
        assert_eq!(clean_city_name(""), "");
    }

    #[test]
    fn known_city_is_case_insensitive() {
        let city = known_city("Cape Town").unwrap();
        assert_eq!(city.name, "Cape Town");
        assert!(known_city("CAPETOWN").is_some());
        assert!(known_city("Nairobi").is_none());
    }

    #[test]
    fn wiki_article_lookup_and_fallback() {
        assert_eq!(wiki_article("Port Elizabeth", "port elizabeth"), "Gqeberha");
        assert_eq!(wiki_article("Sandton", "Sandton"), "Sandton");
        assert_eq!(wiki_article("New York", "new york"), "New_York");
    }

    #[test]
    fn thumbnail_is_upscaled() {
        let url = "https://upload.wikimedia.org/wikipedia/commons/thumb/a/ab/City.jpg/320px-City.jpg";
        assert_eq!(
            upscale_thumbnail(url),
            "https://upload.wikimedia.org/wikipedia/commons/thumb/a/ab/City.jpg/800px-City.jpg"
        );
        assert_eq!(upscale_thumbnail("https://x/y.jpg"), "https://x/y.jpg");
    }

    #[test]
    fn cache_key_normalizes_whitespace_and_case() {
        assert_eq!(cache_key("Cape Town"), "cwi_weather_cape_town");
        assert_eq!(cache_key("Cape Town"), cache_key("cape town"));
    }
}
