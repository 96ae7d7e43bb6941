//! ICS generation.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use icalendar::{Calendar, Component, EventLike, Property};

use super::{PRODID, VERSION};
use crate::event::CalendarEvent;

/// Generate .ics content for a single event.
///
/// Mandatory fields (UID, DTSTAMP, SUMMARY, DTSTART, DTEND) come straight from
/// the event, which cannot exist without them.
pub(super) fn generate_ics(event: &CalendarEvent) -> String {
    let mut ics_event = icalendar::Event::new();
    ics_event.uid(event.uid());
    ics_event.summary(event.summary());

    // DTSTAMP is the creation stamp, not "now", so output stays deterministic.
    ics_event.add_property("DTSTAMP", utc_stamp(event.created_at()));

    add_zoned_property(&mut ics_event, "DTSTART", event.start());
    add_zoned_property(&mut ics_event, "DTEND", event.end());

    if let Some(desc) = event.description() {
        ics_event.description(desc);
    }

    if let Some(loc) = event.location() {
        ics_event.location(loc);
    }

    let mut cal = Calendar::new();
    cal.push(ics_event.done());
    let cal = cal.done();

    rewrite_envelope(&cal.to_string())
}

/// Replace the icalendar crate's envelope with ours.
/// - PRODID and VERSION are written once, right after BEGIN:VCALENDAR
/// - CALSCALE:GREGORIAN is dropped (it's the default)
fn rewrite_envelope(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") || line.starts_with("VERSION:") {
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");

        if line == "BEGIN:VCALENDAR" {
            result.push_str(&format!("VERSION:{}\r\n", VERSION));
            result.push_str(&format!("PRODID:{}\r\n", PRODID));
        }
    }

    result
}

fn utc_stamp(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Local wall-clock time with a TZID parameter naming the IANA zone.
fn add_zoned_property(ics_event: &mut icalendar::Event, name: &str, time: DateTime<Tz>) {
    let mut prop = Property::new(name, time.format("%Y%m%dT%H%M%S").to_string());
    prop.add_parameter("TZID", time.timezone().name());
    ics_event.append_property(prop);
}

#[cfg(test)]
mod tests {
    use super::super::CalendarDocument;
    use crate::event::{BuildOptions, CalendarEvent, EventRequest};
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn make_test_event() -> CalendarEvent {
        let now = Utc.with_ymd_and_hms(2025, 12, 17, 10, 0, 0).unwrap();
        let request = EventRequest::new("Dinner with Maria", "2025-12-20", "19:00")
            .with_location("Pizzeria Roma");
        CalendarEvent::build(&request, &BuildOptions::default(), now).unwrap()
    }

    fn count_lines(ics: &str, prefix: &str) -> usize {
        ics.lines().filter(|l| l.starts_with(prefix)).count()
    }

    #[test]
    fn envelope_is_written_once() {
        let ics = CalendarDocument::encode(&make_test_event()).into_string();

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Agendum//CalDAV Client//EN\r\n"));
        assert_eq!(count_lines(&ics, "VERSION:"), 1);
        assert_eq!(count_lines(&ics, "PRODID:"), 1);
        assert!(!ics.contains("CALSCALE"), "ICS:\n{}", ics);
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
    }

    #[test]
    fn event_block_has_mandatory_fields() {
        let event = make_test_event();
        let ics = CalendarDocument::encode(&event).into_string();

        assert_eq!(count_lines(&ics, "BEGIN:VEVENT"), 1);
        assert_eq!(count_lines(&ics, "END:VEVENT"), 1);
        assert!(ics.contains(&format!("UID:{}", event.uid())), "ICS:\n{}", ics);
        assert!(ics.contains("DTSTAMP:20251217T100000Z"), "ICS:\n{}", ics);
        assert!(ics.contains("SUMMARY:Dinner with Maria"), "ICS:\n{}", ics);
        assert!(ics.contains("DTSTART;TZID=Europe/Berlin:20251220T190000"), "ICS:\n{}", ics);
        assert!(ics.contains("DTEND;TZID=Europe/Berlin:20251220T200000"), "ICS:\n{}", ics);
        assert!(ics.contains("LOCATION:Pizzeria Roma"), "ICS:\n{}", ics);
        assert_eq!(count_lines(&ics, "DESCRIPTION"), 0);
    }

    #[test]
    fn encoding_is_deterministic() {
        let event = make_test_event();
        assert_eq!(CalendarDocument::encode(&event), CalendarDocument::encode(&event));
    }

    #[test]
    fn decode_recovers_identity_and_times() {
        let event = make_test_event();
        let doc = CalendarDocument::encode(&event);
        let decoded = CalendarDocument::decode(doc.as_str()).expect("Should decode");

        assert_eq!(decoded.uid, event.uid());
        assert_eq!(decoded.summary, event.summary());
        assert_eq!(decoded.start, event.start());
        assert_eq!(decoded.end, event.end());
        assert_eq!(decoded.stamp, Some(event.created_at()));
        assert_eq!(decoded.location.as_deref(), Some("Pizzeria Roma"));
    }

    proptest! {
        #[test]
        fn every_document_carries_the_mandatory_set(
            title in "[A-Za-z0-9][A-Za-z0-9 ]{0,120}",
            location in proptest::option::of("[A-Za-z0-9 ]{1,40}"),
            hour in 0u32..24,
        ) {
            let now = Utc.with_ymd_and_hms(2025, 12, 17, 10, 0, 0).unwrap();
            let mut request = EventRequest::new(title, "2025-12-20", format!("{:02}:15", hour));
            request.location = location;
            let event = CalendarEvent::build(&request, &BuildOptions::default(), now).unwrap();
            let ics = CalendarDocument::encode(&event).into_string();

            for prefix in ["UID:", "DTSTAMP:", "SUMMARY:", "DTSTART;", "DTEND;", "PRODID:", "VERSION:"] {
                prop_assert_eq!(count_lines(&ics, prefix), 1, "{} in\n{}", prefix, ics);
            }
            let decoded = CalendarDocument::decode(&ics).unwrap();
            prop_assert_eq!(decoded.uid, event.uid());
            prop_assert_eq!(decoded.start, event.start());
            prop_assert_eq!(decoded.end, event.end());
        }
    }
}
