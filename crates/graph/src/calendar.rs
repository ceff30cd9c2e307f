//! Signed-in user's calendar events for one month.

use homepage_core::calendar::{CalendarEvent, MonthCursor, MAX_MONTH_EVENTS};
use homepage_core::types::Timestamp;
use tokio_util::sync::CancellationToken;

use crate::api::{get_collection, ApiVersion, GraphApi};
use crate::odata::ODataQuery;

fn iso(ts: Timestamp) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// `$filter` expression selecting events that lie within `month`.
pub fn month_filter(month: MonthCursor) -> String {
    let (start, end) = month.window();
    format!(
        "start/dateTime ge '{}' and end/dateTime le '{}'",
        iso(start),
        iso(end)
    )
}

/// Events in `month` ordered by start, at most [`MAX_MONTH_EVENTS`].
/// Empty on failure or cancellation.
pub async fn fetch_month_events<G>(api: &G, month: MonthCursor, cancel: &CancellationToken) -> Vec<CalendarEvent>
where
    G: GraphApi + ?Sized,
{
    let path = ODataQuery::new()
        .filter(&month_filter(month))
        .select("id,subject,start,end,location,bodyPreview")
        .orderby("start/dateTime")
        .top(MAX_MONTH_EVENTS)
        .apply("/me/events");

    let events = match get_collection::<_, CalendarEvent>(api, ApiVersion::V1, &path).await {
        Ok(events) => events,
        Err(e) => {
            tracing::warn!(month = %month.label(), error = %e, "Failed to fetch calendar events");
            return Vec::new();
        }
    };

    if cancel.is_cancelled() {
        return Vec::new();
    }
    tracing::debug!(month = %month.label(), count = events.len(), "Fetched calendar events");
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn filter_covers_first_to_last_day() {
        let month = MonthCursor::containing(NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
        assert_eq!(
            month_filter(month),
            "start/dateTime ge '2024-02-01T00:00:00.000Z' and end/dateTime le '2024-02-29T23:59:59.000Z'"
        );
    }
}
