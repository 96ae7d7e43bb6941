//! ICS parsing using the icalendar crate's parser.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Property, read_calendar, unfold},
};

/// Fields recovered from an encoded event.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
    pub uid: String,
    pub summary: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub stamp: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// Parse the first VEVENT of `content`.
///
/// Returns `None` when a mandatory field is missing or a time cannot be
/// placed on the timeline.
pub(super) fn parse_event(content: &str) -> Option<DecodedEvent> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).ok()?;
    let vevent = calendar.components.iter().find(|c| c.name == "VEVENT")?;

    let uid = vevent.find_prop("UID")?.val.to_string();
    let summary = vevent.find_prop("SUMMARY")?.val.to_string();
    let start = to_zoned(vevent.find_prop("DTSTART")?)?;
    let end = to_zoned(vevent.find_prop("DTEND")?)?;

    let stamp = vevent.find_prop("DTSTAMP").and_then(|p| {
        NaiveDateTime::parse_from_str(p.val.as_ref().trim_end_matches('Z'), "%Y%m%dT%H%M%S")
            .ok()
            .map(|dt| dt.and_utc())
    });
    let location = vevent.find_prop("LOCATION").map(|p| p.val.to_string());
    let description = vevent.find_prop("DESCRIPTION").map(|p| p.val.to_string());

    Some(DecodedEvent {
        uid,
        summary,
        start,
        end,
        stamp,
        location,
        description,
    })
}

/// Convert DTSTART/DTEND into a zoned datetime.
///
/// UTC and floating values are interpreted in UTC; all-day dates are rejected
/// since this system only creates timed events.
fn to_zoned(prop: &Property) -> Option<DateTime<Tz>> {
    match DatePerhapsTime::try_from(prop).ok()? {
        DatePerhapsTime::Date(_) => None,
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            CalendarDateTime::Utc(dt) => Some(dt.with_timezone(&Tz::UTC)),
            CalendarDateTime::Floating(naive) => Some(Tz::UTC.from_utc_datetime(&naive)),
            CalendarDateTime::WithTimezone { date_time, tzid } => {
                let tz: Tz = tzid.parse().ok()?;
                tz.from_local_datetime(&date_time).earliest()
            }
        },
    }
}
