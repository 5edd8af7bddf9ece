//! Append-only issue history with JSON persistence.
//!
//! Issues are appended in the order they are raised. Nothing is pruned
//! automatically; callers limit what they read with [`IssueHistory::since`]
//! or drop old entries explicitly with [`IssueHistory::prune_before`].

use crate::core::issue::Issue;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Ordered log of every issue raised in a monitoring session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueHistory {
    issues: Vec<Issue>,
}

impl IssueHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a newly raised issue.
    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    /// Issues raised within `since` of `now`, in insertion order.
    ///
    /// A look-back reaching past the representable time range returns the
    /// whole history.
    pub fn since(&self, now: DateTime<Utc>, since: Duration) -> Vec<Issue> {
        match now.checked_sub_signed(since) {
            Some(cutoff) => self
                .issues
                .iter()
                .filter(|issue| issue.raised_at >= cutoff)
                .cloned()
                .collect(),
            None => self.issues.clone(),
        }
    }

    /// Remove issues raised before `cutoff`. Returns how many were removed.
    pub fn prune_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.issues.len();
        self.issues.retain(|issue| issue.raised_at >= cutoff);
        before - self.issues.len()
    }

    pub fn as_slice(&self) -> &[Issue] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Load a history from disk. A missing file yields an empty history.
    pub fn load(path: &Path) -> Result<Self, HistoryError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let issues: Vec<Issue> = serde_json::from_str(&content)?;
        tracing::info!(count = issues.len(), path = %path.display(), "Loaded issue history");
        Ok(Self { issues })
    }

    /// Save the history to disk as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), HistoryError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.issues)?;
        std::fs::write(path, json)?;
        tracing::info!(count = self.issues.len(), path = %path.display(), "Saved issue history");
        Ok(())
    }
}

impl From<Vec<Issue>> for IssueHistory {
    fn from(issues: Vec<Issue>) -> Self {
        Self { issues }
    }
}

/// Errors reading or writing a persisted history.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
