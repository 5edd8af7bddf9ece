//! Synheart Affect Monitor - critical-issue detection over emotion readings.
//!
//! This library watches a stream of emotion observations produced by facial
//! and vocal classifiers, and raises structured issues when the readings show
//! patterns that may indicate psychological or physical distress.
//!
//! # Guarantees
//!
//! - **No raw media**: Only `(timestamp, label, confidence)` readings are seen
//! - **No raw storage**: Observations are held only in the caller's rolling buffer
//! - **Tolerant intake**: A malformed reading is excluded, never fatal to a check
//! - **Auditable**: Every check and every issue is counted and persisted
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Synheart Affect Monitor                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │ Observation │──▶│   Window    │──▶│    Rules    │       │
//! │  │    Feed     │   │  (buffer)   │   │ (4, fixed)  │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │         │                                    │              │
//! │         ▼                                    ▼              │
//! │  ┌─────────────┐                     ┌─────────────┐       │
//! │  │    Audit    │                     │   Issues    │       │
//! │  │     Log     │                     │ + Report    │       │
//! │  └─────────────┘                     └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use synheart_affect_monitor::{EmotionLabel, IssueDetector, IssueKind, Observation};
//!
//! let now = Utc::now();
//! let observations = vec![
//!     Observation::new(now - Duration::seconds(30), EmotionLabel::Angry, 0.95),
//!     Observation::new(now, EmotionLabel::Angry, 0.96),
//! ];
//!
//! let mut detector = IssueDetector::default();
//! let issues = detector.check(&observations, None, now);
//!
//! assert_eq!(issues.len(), 1);
//! assert_eq!(issues[0].kind, IssueKind::ExtremeEmotion);
//! ```

pub mod audit;
pub mod config;
pub mod core;
pub mod observation;

// Re-export key types at crate root for convenience
pub use audit::{AuditCounters, AuditLog};
pub use config::{Config, ConfigError};
pub use core::{
    generate_report, Issue, IssueDetails, IssueDetector, IssueHistory, IssueKind,
    ObservationBuffer, Severity, Thresholds, NO_ISSUES_MESSAGE,
};
pub use observation::{EmotionLabel, Observation, ObservationSource, RawObservation};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Monitoring declaration that can be displayed to users.
pub const MONITORING_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║          SYNHEART AFFECT MONITOR - MONITORING DECLARATION        ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This monitor watches emotion readings for signs of distress.    ║
║                                                                  ║
║  ✓ WHAT WE EVALUATE:                                             ║
║    • The dominant emotion label of each reading                  ║
║    • How confident the classifier was                            ║
║    • When the reading was taken                                  ║
║    • When you last interacted                                    ║
║                                                                  ║
║  ✗ WHAT WE NEVER STORE:                                          ║
║    • Camera frames or audio recordings                           ║
║    • The readings themselves beyond the rolling window           ║
║                                                                  ║
║  Only raised issues are kept, so that ground control can         ║
║  review them.                                                    ║
║                                                                  ║
║  You can view monitoring statistics anytime with:                ║
║    synheart-affect status                                        ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
