//! The event model: raw requests and the immutable events built from them.

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::when::{parse_date, parse_time};

/// Fields as supplied by the caller (typically an LLM tool call).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRequest {
    pub title: String,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl EventRequest {
    pub fn new(title: impl Into<String>, date: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            date: date.into(),
            time: time.into(),
            location: None,
            description: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Configuration the builder needs but the request does not carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    pub timezone: Tz,
    pub default_duration: Duration,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Europe::Berlin,
            default_duration: Duration::hours(1),
        }
    }
}

/// A calendar event with resolved times.
///
/// Only constructible through [`CalendarEvent::build`] (or by reloading a stored
/// record), so every instance has a uid, a stamp, a summary and `end > start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "EventRecord", try_from = "EventRecord")]
pub struct CalendarEvent {
    uid: String,
    summary: String,
    start: DateTime<Tz>,
    end: DateTime<Tz>,
    created_at: DateTime<Utc>,
    location: Option<String>,
    description: Option<String>,
}

impl CalendarEvent {
    /// Build an event from a request, resolving relative dates against `now`.
    pub fn build(
        request: &EventRequest,
        options: &BuildOptions,
        now: DateTime<Utc>,
    ) -> Result<Self, ParseError> {
        let summary = request.title.trim();
        if summary.is_empty() {
            return Err(ParseError::EmptyTitle);
        }

        let tz = options.timezone;
        let today = now.with_timezone(&tz).date_naive();
        let date = parse_date(&request.date, today)?;
        let time = parse_time(&request.time)?;

        // DST folds resolve to the earlier instant; gaps have no valid instant.
        let start = tz
            .from_local_datetime(&date.and_time(time))
            .earliest()
            .ok_or_else(|| ParseError::NonexistentLocalTime {
                date: date.to_string(),
                time: time.format("%H:%M").to_string(),
                timezone: tz.name().to_string(),
            })?;
        let end = start + options.default_duration;

        Ok(Self {
            uid: uuid::Uuid::new_v4().to_string(),
            summary: summary.to_string(),
            start,
            end,
            created_at: now,
            location: non_empty(request.location.as_deref()),
            description: non_empty(request.description.as_deref()),
        })
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn start(&self) -> DateTime<Tz> {
        self.start
    }

    pub fn end(&self) -> DateTime<Tz> {
        self.end
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn timezone(&self) -> Tz {
        self.start.timezone()
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// On-disk shape of a [`CalendarEvent`].
///
/// Times are stored with their offset plus the zone name, since `DateTime<Tz>`
/// cannot be deserialized directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EventRecord {
    uid: String,
    summary: String,
    timezone: String,
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl From<CalendarEvent> for EventRecord {
    fn from(event: CalendarEvent) -> Self {
        Self {
            timezone: event.timezone().name().to_string(),
            uid: event.uid,
            summary: event.summary,
            start: event.start.fixed_offset(),
            end: event.end.fixed_offset(),
            created_at: event.created_at,
            location: event.location,
            description: event.description,
        }
    }
}

impl TryFrom<EventRecord> for CalendarEvent {
    type Error = String;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        let tz: Tz = record
            .timezone
            .parse()
            .map_err(|_| format!("unknown timezone '{}'", record.timezone))?;

        if record.uid.is_empty() {
            return Err("event has no uid".to_string());
        }
        if record.summary.trim().is_empty() {
            return Err(format!("event {} has no summary", record.uid));
        }
        if record.end <= record.start {
            return Err(format!("event {} ends before it starts", record.uid));
        }

        Ok(Self {
            uid: record.uid,
            summary: record.summary,
            start: record.start.with_timezone(&tz),
            end: record.end.with_timezone(&tz),
            created_at: record.created_at,
            location: record.location,
            description: record.description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};
    use proptest::prelude::*;
    use std::collections::HashSet;

    // Wednesday 2025-12-17, 10:00 UTC.
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 17, 10, 0, 0).unwrap()
    }

    fn options() -> BuildOptions {
        BuildOptions::default()
    }

    #[test]
    fn next_saturday_evening_in_berlin() {
        let request = EventRequest::new("Dinner with Maria", "Saturday", "7:00 PM")
            .with_location("Pizzeria Roma");
        let event = CalendarEvent::build(&request, &options(), now()).unwrap();

        assert_eq!(event.start().date_naive(), NaiveDate::from_ymd_opt(2025, 12, 20).unwrap());
        assert_eq!(event.start().hour(), 19);
        assert_eq!(event.start().minute(), 0);
        assert_eq!(event.timezone(), chrono_tz::Europe::Berlin);
        assert_eq!(event.end() - event.start(), Duration::hours(1));
        assert_eq!(event.location(), Some("Pizzeria Roma"));
        assert_eq!(event.summary(), "Dinner with Maria");
    }

    #[test]
    fn today_is_taken_in_the_target_timezone() {
        // 23:30 UTC on Friday is already Saturday in Berlin, so "saturday" means next week.
        let late_friday = Utc.with_ymd_and_hms(2025, 12, 19, 23, 30, 0).unwrap();
        let request = EventRequest::new("Brunch", "saturday", "11:00");
        let event = CalendarEvent::build(&request, &options(), late_friday).unwrap();
        assert_eq!(event.start().date_naive(), NaiveDate::from_ymd_opt(2025, 12, 27).unwrap());
    }

    #[test]
    fn created_at_is_utc_and_independent_of_start() {
        let request = EventRequest::new("Standup", "2025-12-20", "09:00");
        let event = CalendarEvent::build(&request, &options(), now()).unwrap();
        assert_eq!(event.created_at(), now());
        assert_eq!(event.start().with_timezone(&Utc).hour(), 8);
    }

    #[test]
    fn empty_optional_fields_become_none() {
        let mut request = EventRequest::new("Call", "2025-12-20", "18:00");
        request.location = Some(String::new());
        request.description = Some("   ".to_string());
        let event = CalendarEvent::build(&request, &options(), now()).unwrap();
        assert_eq!(event.location(), None);
        assert_eq!(event.description(), None);
    }

    #[test]
    fn empty_title_is_rejected() {
        let request = EventRequest::new("  ", "2025-12-20", "18:00");
        assert_eq!(
            CalendarEvent::build(&request, &options(), now()),
            Err(ParseError::EmptyTitle)
        );
    }

    #[test]
    fn unparseable_date_is_rejected() {
        let request = EventRequest::new("Dinner", "not a date", "6pm");
        assert_eq!(
            CalendarEvent::build(&request, &options(), now()),
            Err(ParseError::Date("not a date".to_string()))
        );
    }

    #[test]
    fn time_in_dst_gap_is_rejected() {
        // Clocks jump from 02:00 to 03:00 in Berlin on 2026-03-29.
        let request = EventRequest::new("Ghost", "2026-03-29", "02:30");
        let err = CalendarEvent::build(&request, &options(), now()).unwrap_err();
        assert!(matches!(err, ParseError::NonexistentLocalTime { .. }));
    }

    #[test]
    fn thousand_builds_give_thousand_uids() {
        let request = EventRequest::new("Repeat", "tomorrow", "10:00");
        let uids: HashSet<String> = (0..1000)
            .map(|_| {
                CalendarEvent::build(&request, &options(), now())
                    .unwrap()
                    .uid()
                    .to_string()
            })
            .collect();
        assert_eq!(uids.len(), 1000);
    }

    #[test]
    fn uids_are_distinct_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| {
                    let request = EventRequest::new("Parallel", "tomorrow", "10:00");
                    (0..250)
                        .map(|_| {
                            CalendarEvent::build(&request, &BuildOptions::default(), now())
                                .unwrap()
                                .uid()
                                .to_string()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let uids: HashSet<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(uids.len(), 1000);
    }

    #[test]
    fn record_roundtrip_preserves_event() {
        let request = EventRequest::new("Dinner", "2025-12-20", "19:00").with_description("Bring wine");
        let event = CalendarEvent::build(&request, &options(), now()).unwrap();
        let json = serde_json::to_string(&event).unwrap();
        let back: CalendarEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn record_with_inverted_times_is_rejected() {
        let json = r#"{"uid":"x","summary":"Bad","timezone":"UTC",
            "start":"2025-12-20T10:00:00+00:00","end":"2025-12-20T09:00:00+00:00",
            "created_at":"2025-12-17T10:00:00Z"}"#;
        assert!(serde_json::from_str::<CalendarEvent>(json).is_err());
    }

    proptest! {
        #[test]
        fn end_is_always_after_start(
            days in 0u64..700,
            hour in 0u32..24,
            minute in 0u32..60,
            minutes in 1i64..(24 * 60),
        ) {
            let date = now().date_naive() + chrono::Days::new(days);
            let request = EventRequest::new(
                "Prop",
                date.format("%Y-%m-%d").to_string(),
                format!("{:02}:{:02}", hour, minute),
            );
            let options = BuildOptions {
                default_duration: Duration::minutes(minutes),
                ..BuildOptions::default()
            };
            match CalendarEvent::build(&request, &options, now()) {
                Ok(event) => {
                    prop_assert!(event.end() > event.start());
                    prop_assert!(!event.uid().is_empty());
                }
                Err(err) => {
                    let in_gap = matches!(err, ParseError::NonexistentLocalTime { .. });
                    prop_assert!(in_gap, "unexpected error: {:?}", err);
                }
            }
        }
    }
}
