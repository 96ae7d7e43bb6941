//! Caller-owned decision trace.
//!
//! The event creation flow never keeps its own history; the caller passes a
//! `DecisionLog` in and the flow appends exactly one entry per call.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AgendumError, AgendumResult};

/// A single recorded decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub action: String,
    pub reasoning: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only, ordered list of decisions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionLog {
    entries: Vec<Decision>,
}

impl DecisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a decision stamped with the current time.
    pub fn record(&mut self, action: impl Into<String>, reasoning: impl Into<String>) -> &Decision {
        self.record_at(action, reasoning, Utc::now())
    }

    pub fn record_at(
        &mut self,
        action: impl Into<String>,
        reasoning: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> &Decision {
        self.entries.push(Decision {
            action: action.into(),
            reasoning: reasoning.into(),
            timestamp,
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[Decision] {
        &self.entries
    }

    pub fn last(&self) -> Option<&Decision> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load a log saved with [`DecisionLog::save`]. A missing file is an empty log.
    pub fn load(path: &Path) -> AgendumResult<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| {
            AgendumError::Serialization(format!("Could not read {}: {e}", path.display()))
        })
    }

    pub fn save(&self, path: &Path) -> AgendumResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| AgendumError::Serialization(e.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
