//! Error types for agendum.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur outside the event creation flow (startup, config, IO).
#[derive(Error, Debug)]
pub enum AgendumError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for agendum operations.
pub type AgendumResult<T> = Result<T, AgendumError>;

/// The user's input could not be turned into an event. Nothing was written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Event title must not be empty")]
    EmptyTitle,

    #[error("Could not parse date: \"{0}\"")]
    Date(String),

    #[error("Could not parse time: \"{0}\"")]
    Time(String),

    #[error("{date} {time} does not exist in {timezone} (daylight saving gap)")]
    NonexistentLocalTime {
        date: String,
        time: String,
        timezone: String,
    },
}

/// Why a remote submission did not happen. Every variant leads to the local fallback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Remote calendar not configured")]
    NotConfigured,

    #[error("No writable calendar found")]
    NoWritableCalendar,

    /// The server answered with a non-success status. `body` is kept verbatim:
    /// a 403 is as likely to be a document validation failure as a credential problem.
    #[error("Remote rejected request (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Remote request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Remote unreachable: {0}")]
    Unreachable(String),

    /// The server answered with a success status but a body that could not be read.
    #[error("Remote sent an unreadable response: {0}")]
    InvalidResponse(String),
}

impl SyncError {
    /// Short machine-friendly name, used in decision records.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::NotConfigured => "NotConfigured",
            SyncError::NoWritableCalendar => "NoWritableCalendar",
            SyncError::Rejected { .. } => "SyncRejected",
            SyncError::Timeout(_) => "Timeout",
            SyncError::Unreachable(_) => "Unreachable",
            SyncError::InvalidResponse(_) => "InvalidResponse",
        }
    }
}

/// The local fallback store could not record an event.
///
/// When this happens after a failed remote attempt, no copy of the event exists anywhere.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Could not access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt record in {} at line {line}: {message}", path.display())]
    Corrupt {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Could not serialize event: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_display_keeps_status_and_body() {
        let err = SyncError::Rejected {
            status: 403,
            body: "<error><valid-calendar-data/></error>".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("403"));
        assert!(msg.contains("valid-calendar-data"));
        assert_eq!(err.kind(), "SyncRejected");
    }

    #[test]
    fn invalid_response_is_not_a_rejection() {
        let err = SyncError::InvalidResponse("Invalid multistatus XML".to_string());
        assert_eq!(err.kind(), "InvalidResponse");
        assert!(!err.to_string().contains("HTTP"));
    }

    #[test]
    fn timeout_display_in_seconds() {
        let err = SyncError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "Remote request timed out after 30s");
    }
}
