//! Month calendar: event records, month navigation, and the 6-week grid.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{parse_timestamp, Timestamp};

/// Days in the month grid (six full weeks).
pub const GRID_DAYS: usize = 42;

/// Events fetched per month.
pub const MAX_MONTH_EVENTS: u32 = 50;

/// Upcoming events listed beside the grid.
pub const UPCOMING_EVENTS: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventTime {
    pub date_time: String,
    pub time_zone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventLocation {
    pub display_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalendarEvent {
    pub id: String,
    pub subject: String,
    pub start: EventTime,
    pub end: EventTime,
    pub location: EventLocation,
    pub body_preview: String,
}

impl CalendarEvent {
    pub fn start_date(&self) -> Option<NaiveDate> {
        parse_timestamp(&self.start.date_time).map(|t| t.date_naive())
    }
}

/// A calendar month, navigated one step at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthCursor {
    year: i32,
    /// 1–12.
    month: u32,
}

impl MonthCursor {
    pub fn containing(date: NaiveDate) -> Self {
        Self { year: date.year(), month: date.month() }
    }

    pub fn current() -> Self {
        Self::containing(Utc::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { month: self.month + 1, ..self }
        }
    }

    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { month: self.month - 1, ..self }
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next().first_day() - Duration::days(1)
    }

    /// Query window: first day 00:00:00 through last day 23:59:59, UTC.
    pub fn window(&self) -> (Timestamp, Timestamp) {
        let start = self.first_day().and_time(NaiveTime::MIN);
        let end = self
            .last_day()
            .and_hms_opt(23, 59, 59)
            .unwrap_or(start);
        (Utc.from_utc_datetime(&start), Utc.from_utc_datetime(&end))
    }

    /// Display label, e.g. `"May 2024"`.
    pub fn label(&self) -> String {
        self.first_day().format("%B %Y").to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub day: u32,
    pub is_current_month: bool,
    pub is_today: bool,
    pub has_events: bool,
    pub events: Vec<CalendarEvent>,
}

/// Six weeks starting on the Sunday on or before the 1st of `month`.
pub fn month_grid(month: MonthCursor, events: &[CalendarEvent], today: NaiveDate) -> Vec<CalendarDay> {
    let first = month.first_day();
    let lead = i64::from(first.weekday().num_days_from_sunday());
    let start = first - Duration::days(lead);

    (0..GRID_DAYS as i64)
        .map(|offset| {
            let date = start + Duration::days(offset);
            let day_events: Vec<CalendarEvent> = events
                .iter()
                .filter(|e| e.start_date() == Some(date))
                .cloned()
                .collect();
            CalendarDay {
                date,
                day: date.day(),
                is_current_month: date.month() == month.month() && date.year() == month.year(),
                is_today: date == today,
                has_events: !day_events.is_empty(),
                events: day_events,
            }
        })
        .collect()
}

/// Events starting at or after `now`, at most `limit`, in the order given.
pub fn upcoming_events(events: &[CalendarEvent], now: Timestamp, limit: usize) -> Vec<&CalendarEvent> {
    events
        .iter()
        .filter(|e| parse_timestamp(&e.start.date_time).is_some_and(|start| start >= now))
        .take(limit)
        .collect()
}

/// Events on a single date, in the order given.
pub fn events_on(events: &[CalendarEvent], date: NaiveDate) -> Vec<&CalendarEvent> {
    events.iter().filter(|e| e.start_date() == Some(date)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
