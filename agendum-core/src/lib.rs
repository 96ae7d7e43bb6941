//! Core types for agendum.
//!
//! This crate provides everything the event creation flow needs except the
//! network client:
//! - `event` builds immutable `CalendarEvent`s from loosely formatted input
//! - `ics` encodes them as RFC 5545 documents (and decodes them back)
//! - `store` is the local fallback store used when remote sync fails
//! - `create` sequences the above behind `EventCreator`
//!
//! Remote calendars plug in through the `CalendarRemote` trait.

pub mod config;
pub mod create;
pub mod decision;
pub mod error;
pub mod event;
pub mod ics;
pub mod remote;
pub mod store;
pub mod when;

pub use create::{Creation, EventCreator, Outcome};
pub use decision::{Decision, DecisionLog};
pub use error::{AgendumError, AgendumResult, ParseError, StorageError, SyncError};
pub use event::{BuildOptions, CalendarEvent, EventRequest};
pub use ics::CalendarDocument;
pub use remote::{CalendarRemote, SyncReceipt};
pub use store::{Appended, LocalStore, StoredEvent};
