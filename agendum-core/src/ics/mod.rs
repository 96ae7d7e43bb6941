//! ICS document generation and parsing.
//!
//! This module turns a `CalendarEvent` into an RFC 5545 calendar object and back.

mod generate;
mod parse;

pub use parse::DecodedEvent;

use crate::event::CalendarEvent;

/// Product identifier written into every document envelope.
pub const PRODID: &str = "-//Agendum//CalDAV Client//EN";

/// iCalendar format version written into every document envelope.
pub const VERSION: &str = "2.0";

/// An encoded VCALENDAR holding exactly one VEVENT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDocument {
    uid: String,
    content: String,
}

impl CalendarDocument {
    /// Encode an event. Pure: the same event always yields the same bytes.
    pub fn encode(event: &CalendarEvent) -> Self {
        Self {
            uid: event.uid().to_string(),
            content: generate::generate_ics(event),
        }
    }

    /// Parse the first VEVENT of an ICS document.
    pub fn decode(content: &str) -> Option<DecodedEvent> {
        parse::parse_event(content)
    }

    /// Uid of the encoded event; also names the remote resource (`{uid}.ics`).
    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn into_string(self) -> String {
        self.content
    }
}

impl std::fmt::Display for CalendarDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.content)
    }
}
