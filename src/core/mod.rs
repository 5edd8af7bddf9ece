//! Core functionality for the Synheart Affect Monitor.
//!
//! This module contains:
//! - Look-back windows over observation sequences
//! - Threshold records and the detection rules built from them
//! - The issue detector and its append-only history
//! - Plain-text report rendering

pub mod detector;
pub mod history;
pub mod issue;
pub mod report;
pub mod rules;
pub mod thresholds;
pub mod window;

// Re-export commonly used types
pub use detector::IssueDetector;
pub use history::{HistoryError, IssueHistory};
pub use issue::{Issue, IssueDetails, IssueKind, Severity};
pub use report::{generate_report, history_summary, title_case, NO_ISSUES_MESSAGE};
pub use rules::{default_rules, CheckContext, Rule};
pub use thresholds::{
    CommunicationBreakdownThreshold, ExtremeEmotionThreshold, RapidSwingsThreshold,
    SustainedNegativeThreshold, ThresholdError, Thresholds,
};
pub use window::{ObservationBuffer, ObservationWindow};
