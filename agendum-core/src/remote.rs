//! The boundary to a remote calendar service.

use std::future::Future;

use crate::error::SyncError;
use crate::ics::CalendarDocument;

/// Confirmation that a document was accepted remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReceipt {
    /// URL of the calendar collection that accepted the event.
    pub calendar_url: String,
    /// Display name of that collection, when the server reports one.
    pub calendar_name: Option<String>,
    /// URL of the created resource.
    pub resource_url: String,
}

impl SyncReceipt {
    /// Human-friendly calendar label: display name, else the collection URL.
    pub fn calendar_label(&self) -> &str {
        self.calendar_name.as_deref().unwrap_or(&self.calendar_url)
    }
}

/// A remote calendar service that can store one encoded document.
///
/// Implementations must not retry and must not keep session state between
/// calls; every failure is reported as a [`SyncError`] value.
pub trait CalendarRemote {
    fn submit(
        &self,
        document: &CalendarDocument,
    ) -> impl Future<Output = Result<SyncReceipt, SyncError>> + Send;
}
