//! Local fallback store.
//!
//! Events that could not be written to a remote calendar are appended to a
//! JSON Lines file (`events.jsonl`) in the data directory, one record per line,
//! keyed by uid. A uid is written at most once.
//!
//! Appends are serialised twice: a mutex for callers in this process and an
//! exclusive advisory lock on `events.lock` for other processes.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::event::CalendarEvent;
use crate::ics::CalendarDocument;

const EVENTS_FILE: &str = "events.jsonl";
const LOCK_FILE: &str = "events.lock";

/// An event held in the fallback store, with the reason it ended up there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub event: CalendarEvent,
    pub reason: String,
    pub stored_at: DateTime<Utc>,
}

/// Result of an append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appended {
    Written,
    /// A record with the same uid already existed; nothing was written.
    AlreadyPresent,
}

#[derive(Debug)]
pub struct LocalStore {
    dir: PathBuf,
    guard: Mutex<()>,
}

impl LocalStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;
        Ok(Self {
            dir,
            guard: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the events file; this is where fallen-back events live.
    pub fn path(&self) -> PathBuf {
        self.dir.join(EVENTS_FILE)
    }

    /// Append an event unless its uid is already stored.
    pub fn append(&self, event: &CalendarEvent, reason: &str) -> Result<Appended, StorageError> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let _lock = self.lock()?;

        let contents = self.read_records()?;
        if contents.records.iter().any(|r| r.event.uid() == event.uid()) {
            tracing::debug!(uid = event.uid(), "event already in fallback store");
            return Ok(Appended::AlreadyPresent);
        }

        let record = StoredEvent {
            event: event.clone(),
            reason: reason.to_string(),
            stored_at: Utc::now(),
        };
        let mut line = match contents.tail {
            // A whole record is missing only its newline.
            Tail::Unterminated => "\n".to_string(),
            Tail::Clean | Tail::Torn { .. } => String::new(),
        };
        line.push_str(&serde_json::to_string(&record)?);
        line.push('\n');

        let path = self.path();
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| StorageError::io(&path, e))?;

        // Drop the fragment a crashed writer left behind.
        if let Tail::Torn { valid_len } = contents.tail {
            tracing::warn!(path = %path.display(), valid_len, "truncating incomplete last record");
            file.set_len(valid_len)
                .map_err(|e| StorageError::io(&path, e))?;
        }
        file.seek(SeekFrom::End(0))
            .map_err(|e| StorageError::io(&path, e))?;

        // One write per record; the lock keeps writers from interleaving.
        file.write_all(line.as_bytes())
            .and_then(|_| file.sync_data())
            .map_err(|e| StorageError::io(&path, e))?;

        tracing::debug!(uid = event.uid(), path = %path.display(), "event stored locally");
        Ok(Appended::Written)
    }

    /// All stored events, in the order they were appended.
    pub fn list(&self) -> Result<Vec<StoredEvent>, StorageError> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        self.read_all()
    }

    pub fn get(&self, uid: &str) -> Result<Option<StoredEvent>, StorageError> {
        Ok(self.list()?.into_iter().find(|r| r.event.uid() == uid))
    }

    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.list()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    /// Re-encode a stored event as ICS for manual import elsewhere.
    pub fn export_ics(&self, uid: &str) -> Result<Option<CalendarDocument>, StorageError> {
        Ok(self.get(uid)?.map(|r| CalendarDocument::encode(&r.event)))
    }

    fn lock(&self) -> Result<File, StorageError> {
        let path = self.dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| StorageError::io(&path, e))?;
        FileExt::lock_exclusive(&file).map_err(|e| StorageError::io(&path, e))?;
        // Released when the handle is dropped.
        Ok(file)
    }

    fn read_all(&self) -> Result<Vec<StoredEvent>, StorageError> {
        self.read_records().map(|contents| contents.records)
    }

    fn read_records(&self) -> Result<Contents, StorageError> {
        let path = self.path();
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Contents {
                    records: Vec::new(),
                    tail: Tail::Clean,
                });
            }
            Err(e) => return Err(StorageError::io(&path, e)),
        };

        let terminated = text.is_empty() || text.ends_with('\n');
        let lines: Vec<&str> = text.lines().collect();
        let mut records = Vec::with_capacity(lines.len());
        let mut tail = if terminated { Tail::Clean } else { Tail::Unterminated };

        for (idx, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<StoredEvent>(line) {
                Ok(record) => records.push(record),
                // A torn final line (crash mid-write) is ignored; anything else is corruption.
                Err(e) if !terminated && idx + 1 == lines.len() => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring incomplete last record");
                    let valid_len = text.rfind('\n').map_or(0, |pos| pos + 1);
                    tail = Tail::Torn {
                        valid_len: valid_len as u64,
                    };
                }
                Err(e) => {
                    return Err(StorageError::Corrupt {
                        path: path.clone(),
                        line: idx + 1,
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(Contents { records, tail })
    }
}

/// Parsed events file.
struct Contents {
    records: Vec<StoredEvent>,
    tail: Tail,
}

/// How the events file ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tail {
    /// Empty, or the last record ends with a newline.
    Clean,
    /// The last record parses but has no trailing newline.
    Unterminated,
    /// The last line is a partial record; only the first `valid_len` bytes are good.
    Torn { valid_len: u64 },
}
