//! Display models assembled from one fetch cycle.

use chrono::NaiveDate;
use homepage_core::calendar::{
    month_grid, upcoming_events, CalendarDay, CalendarEvent, MonthCursor, UPCOMING_EVENTS,
};
use homepage_core::carousel::{
    first_name, flatten_cards, greeting, CarouselCardConfig, CarouselItem, LabeledItem, Rotation,
    CAROUSEL_ROTATE_INTERVAL, WEATHER_ROTATE_INTERVAL,
};
use homepage_core::praise::PraiseRecord;
use homepage_core::task::TaskBoard;
use homepage_core::types::Timestamp;
use homepage_core::weather::{IconCategory, WeatherRecord};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselView {
    pub items: Vec<LabeledItem>,
    pub auto_rotates: bool,
    pub interval_secs: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherCard {
    #[serde(flatten)]
    pub record: WeatherRecord,
    pub icon: IconCategory,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherView {
    pub cities: Vec<WeatherCard>,
    /// Indices of the two cities shown first.
    pub visible: Vec<usize>,
    pub auto_rotates: bool,
    pub interval_secs: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarView {
    pub label: String,
    pub days: Vec<CalendarDay>,
    pub upcoming: Vec<CalendarEvent>,
}

/// Results of the signed-in user's pipelines.
#[derive(Debug, Default)]
pub struct GraphResults {
    pub display_name: String,
    pub board: TaskBoard,
    pub praises: Vec<PraiseRecord>,
    pub events: Vec<CalendarEvent>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub greeting: String,
    pub carousel: CarouselView,
    pub weather: WeatherView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<TaskBoard>,
    pub praises: Vec<PraiseRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar: Option<CalendarView>,
}

/// `Good morning, Ada` or just `Good morning` without a name.
pub fn greeting_line(hour: u32, display_name: &str) -> String {
    match first_name(display_name) {
        "" => greeting(hour).to_string(),
        name => format!("{}, {name}", greeting(hour)),
    }
}

pub struct Clock {
    pub now: Timestamp,
    pub today: NaiveDate,
    pub local_hour: u32,
}

pub fn build_snapshot(
    clock: &Clock,
    cards: &[CarouselCardConfig],
    card_items: &[Vec<CarouselItem>],
    weather: Vec<WeatherRecord>,
    graph: Option<GraphResults>,
) -> Snapshot {
    let items = flatten_cards(cards, card_items);
    let carousel = CarouselView {
        auto_rotates: Rotation::carousel(items.len()).auto_rotates(),
        interval_secs: CAROUSEL_ROTATE_INTERVAL.as_secs(),
        items,
    };

    let rotation = Rotation::weather(weather.len());
    let weather = WeatherView {
        visible: rotation.visible_pair(),
        auto_rotates: rotation.auto_rotates(),
        interval_secs: WEATHER_ROTATE_INTERVAL.as_secs(),
        cities: weather
            .into_iter()
            .map(|record| WeatherCard { icon: record.icon_category(), record })
            .collect(),
    };

    let Some(graph) = graph else {
        return Snapshot {
            greeting: greeting_line(clock.local_hour, ""),
            carousel,
            weather,
            tasks: None,
            praises: Vec::new(),
            calendar: None,
        };
    };

    let month = MonthCursor::containing(clock.today);
    let calendar = CalendarView {
        label: month.label(),
        days: month_grid(month, &graph.events, clock.today),
        upcoming: upcoming_events(&graph.events, clock.now, UPCOMING_EVENTS)
            .into_iter()
            .cloned()
            .collect(),
    };

    Snapshot {
        greeting: greeting_line(clock.local_hour, &graph.display_name),
        carousel,
        weather,
        tasks: Some(graph.board),
        praises: graph.praises,
        calendar: Some(calendar),
    }
}
