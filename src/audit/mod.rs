//! Audit module for the Synheart Affect Monitor.
//!
//! Tracks what the monitor has evaluated so operators can verify it is
//! running and seeing data.

pub mod log;

// Re-export commonly used types
pub use log::{AuditCounters, AuditLog, PersistedStats};
