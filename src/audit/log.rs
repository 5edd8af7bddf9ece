//! Monitoring audit log.
//!
//! Counts what the monitor has evaluated, without storing any observation
//! content. Totals carry over between sessions through a small JSON file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Cumulative counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditCounters {
    /// Observations accepted for evaluation
    pub observations_received: u64,
    /// Observations excluded as malformed
    pub observations_rejected: u64,
    /// Detector checks run
    pub checks_run: u64,
    /// Issues raised across all checks
    pub issues_raised: u64,
}

/// Audit totals plus the current session's start time.
#[derive(Debug)]
pub struct AuditLog {
    totals: AuditCounters,
    session_start: DateTime<Utc>,
    persist_path: Option<PathBuf>,
}

impl AuditLog {
    /// Create an in-memory audit log starting from zero.
    pub fn new() -> Self {
        Self {
            totals: AuditCounters::default(),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create an audit log that continues the totals stored at `path`.
    ///
    /// An unreadable file is logged and the totals start from zero.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        match PersistedStats::read(&path) {
            Ok(Some(persisted)) => log.totals = persisted.counters,
            Ok(None) => {}
            Err(e) => tracing::warn!("Could not load previous audit stats: {e}"),
        }
        log.persist_path = Some(path);
        log
    }

    pub fn record_observations(&mut self, count: u64) {
        self.totals.observations_received += count;
    }

    pub fn record_rejected(&mut self, count: u64) {
        self.totals.observations_rejected += count;
    }

    /// Record a detector check and the number of issues it raised.
    pub fn record_check(&mut self, issues: u64) {
        self.totals.checks_run += 1;
        self.totals.issues_raised += issues;
    }

    pub fn counters(&self) -> AuditCounters {
        self.totals
    }

    /// Seconds since this session started.
    pub fn session_duration_secs(&self) -> u64 {
        (Utc::now() - self.session_start).num_seconds().max(0) as u64
    }

    /// Human-readable totals.
    pub fn summary(&self) -> String {
        let c = self.totals;
        format!(
            "Monitoring Statistics:\n\
             - Observations evaluated: {}\n\
             - Observations rejected: {}\n\
             - Checks run: {}\n\
             - Issues raised: {}\n\
             - Session duration: {} seconds",
            c.observations_received,
            c.observations_rejected,
            c.checks_run,
            c.issues_raised,
            self.session_duration_secs()
        )
    }

    /// Write the totals to the persistence file, if one is configured.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let Some(path) = &self.persist_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let persisted = PersistedStats {
            counters: self.totals,
            last_updated: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// On-disk audit totals.
#[derive(Debug, Serialize, Deserialize)]
pub struct PersistedStats {
    #[serde(flatten)]
    pub counters: AuditCounters,
    pub last_updated: DateTime<Utc>,
}

impl PersistedStats {
    /// Read persisted totals. A missing file yields `None`.
    pub fn read(path: &Path) -> Result<Option<Self>, std::io::Error> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(std::io::Error::other)
    }
}
