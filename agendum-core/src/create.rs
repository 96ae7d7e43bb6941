//! Event creation: build, encode, try the remote, fall back to the local store.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::decision::DecisionLog;
use crate::error::{ParseError, StorageError, SyncError};
use crate::event::{BuildOptions, CalendarEvent, EventRequest};
use crate::ics::CalendarDocument;
use crate::remote::{CalendarRemote, SyncReceipt};
use crate::store::{Appended, LocalStore};

pub const ACTION_SYNCED: &str = "create_calendar_event";
pub const ACTION_LOCAL: &str = "create_calendar_event_local";
pub const ACTION_FAILED: &str = "create_calendar_event_failed";

/// Terminal state of one creation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The remote calendar accepted the event.
    Synced {
        event: CalendarEvent,
        receipt: SyncReceipt,
    },
    /// The remote attempt failed or was skipped; the event is in the local store.
    FallenBack {
        event: CalendarEvent,
        reason: SyncError,
        stored_at: PathBuf,
    },
    /// The input could not be understood. Nothing was written anywhere.
    ParseError(ParseError),
}

/// What `EventCreator::create` hands back: the outcome plus a display message.
#[derive(Debug, Clone, PartialEq)]
pub struct Creation {
    pub outcome: Outcome,
    pub message: String,
}

/// Entry point for creating calendar events.
///
/// Holds no state between calls apart from the local store on disk.
#[derive(Debug)]
pub struct EventCreator<R> {
    remote: Option<R>,
    store: LocalStore,
    options: BuildOptions,
}

impl<R: CalendarRemote> EventCreator<R> {
    /// `remote` is `None` when no remote calendar is configured; every event then
    /// goes straight to the local store.
    pub fn new(remote: Option<R>, store: LocalStore, options: BuildOptions) -> Self {
        Self {
            remote,
            store,
            options,
        }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn remote(&self) -> Option<&R> {
        self.remote.as_ref()
    }

    pub async fn create(
        &self,
        request: &EventRequest,
        log: &mut DecisionLog,
    ) -> Result<Creation, StorageError> {
        self.create_at(request, log, Utc::now()).await
    }

    /// Like [`EventCreator::create`], with an explicit clock for relative dates.
    ///
    /// Appends exactly one entry to `log`, whatever the result.
    pub async fn create_at(
        &self,
        request: &EventRequest,
        log: &mut DecisionLog,
        now: DateTime<Utc>,
    ) -> Result<Creation, StorageError> {
        let event = match CalendarEvent::build(request, &self.options, now) {
            Ok(event) => event,
            Err(err) => {
                tracing::info!(title = %request.title, error = %err, "event request rejected");
                log.record(
                    ACTION_FAILED,
                    format!("Could not create event '{}': {}", request.title, err),
                );
                return Ok(Creation {
                    message: format!("Could not create calendar event: {}", err),
                    outcome: Outcome::ParseError(err),
                });
            }
        };

        let document = CalendarDocument::encode(&event);

        let sync_result = match &self.remote {
            Some(remote) => remote.submit(&document).await,
            None => Err(SyncError::NotConfigured),
        };

        match sync_result {
            Ok(receipt) => {
                tracing::info!(
                    uid = event.uid(),
                    calendar = receipt.calendar_label(),
                    "event synced"
                );
                log.record(
                    ACTION_SYNCED,
                    format!(
                        "Created event in remote calendar '{}': {} on {}",
                        receipt.calendar_label(),
                        event.summary(),
                        when(&event)
                    ),
                );
                Ok(Creation {
                    message: synced_message(&event, &receipt),
                    outcome: Outcome::Synced { event, receipt },
                })
            }
            Err(reason) => self.fall_back(event, reason, log),
        }
    }

    fn fall_back(
        &self,
        event: CalendarEvent,
        reason: SyncError,
        log: &mut DecisionLog,
    ) -> Result<Creation, StorageError> {
        tracing::warn!(uid = event.uid(), reason = %reason, "remote sync failed, storing locally");

        match self.store.append(&event, &reason.to_string()) {
            Ok(appended) => {
                if appended == Appended::AlreadyPresent {
                    tracing::debug!(uid = event.uid(), "event was already stored locally");
                }
                log.record(
                    ACTION_LOCAL,
                    format!(
                        "Created event locally ({}): {} on {}. Reason: {}",
                        reason.kind(),
                        event.summary(),
                        when(&event),
                        reason
                    ),
                );
                let stored_at = self.store.path();
                Ok(Creation {
                    message: fallen_back_message(&event, &reason),
                    outcome: Outcome::FallenBack {
                        event,
                        reason,
                        stored_at,
                    },
                })
            }
            Err(err) => {
                tracing::error!(uid = event.uid(), error = %err, "local fallback failed, event lost");
                log.record(
                    ACTION_FAILED,
                    format!(
                        "Could not store event '{}' after remote failure ({}): {}",
                        event.summary(),
                        reason,
                        err
                    ),
                );
                Err(err)
            }
        }
    }
}

fn when(event: &CalendarEvent) -> String {
    event.start().format("%Y-%m-%d %H:%M %Z").to_string()
}

fn details(event: &CalendarEvent) -> String {
    format!(
        "Event: {}\nDate: {}\nTime: {} - {}\nLocation: {}",
        event.summary(),
        event.start().format("%A, %B %-d, %Y"),
        event.start().format("%H:%M"),
        event.end().format("%H:%M %Z"),
        event.location().unwrap_or("Not specified"),
    )
}

fn synced_message(event: &CalendarEvent, receipt: &SyncReceipt) -> String {
    format!(
        "Calendar event created successfully!\n\n{}\n\nSynced to calendar '{}'.",
        details(event),
        receipt.calendar_label()
    )
}

fn fallen_back_message(event: &CalendarEvent, reason: &SyncError) -> String {
    let note = match reason {
        SyncError::NotConfigured => "Remote calendar is not configured.".to_string(),
        SyncError::NoWritableCalendar => "No writable remote calendar found.".to_string(),
        other => format!("Could not sync to remote calendar.\nReason: {}", other),
    };
    format!(
        "Calendar event created locally!\n\n{}\n\nNote: {} Event stored locally only.",
        details(event),
        note
    )
}
