//! CalDAV remote for agendum.
//!
//! Discovers the calendars of an account (principal → calendar home →
//! collections), picks the first writable one and `PUT`s the event there.
//! It can also read upcoming events back with a `calendar-query` REPORT.

pub mod caldav;
pub mod discovery;
pub mod remote;

pub use discovery::CalendarCollection;
pub use remote::{CalDavRemote, RemoteEvent};
