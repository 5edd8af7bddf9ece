//! Issues raised by the detector.

use crate::observation::EmotionLabel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The kind of critical issue a rule detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    SustainedNegativeEmotion,
    RapidEmotionSwings,
    ExtremeEmotion,
    CommunicationBreakdown,
}

impl IssueKind {
    /// Snake-case identifier, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::SustainedNegativeEmotion => "sustained_negative_emotion",
            IssueKind::RapidEmotionSwings => "rapid_emotion_swings",
            IssueKind::ExtremeEmotion => "extreme_emotion",
            IssueKind::CommunicationBreakdown => "communication_breakdown",
        }
    }

    /// Severity attached to every issue of this kind.
    pub fn severity(&self) -> Severity {
        match self {
            IssueKind::RapidEmotionSwings => Severity::Medium,
            IssueKind::SustainedNegativeEmotion
            | IssueKind::ExtremeEmotion
            | IssueKind::CommunicationBreakdown => Severity::High,
        }
    }

    /// Fixed recommendation text for this kind.
    pub fn recommendation(&self) -> &'static str {
        match self {
            IssueKind::SustainedNegativeEmotion => {
                "Immediate psychological support recommended. Consider ground control notification."
            }
            IssueKind::RapidEmotionSwings => "Monitor closely. May indicate stress or instability.",
            IssueKind::ExtremeEmotion => {
                "Immediate attention required. Consider ground control notification."
            }
            IssueKind::CommunicationBreakdown => {
                "Attempt to re-establish communication. If unsuccessful, notify ground control."
            }
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse urgency tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule-specific evidence attached to an issue.
///
/// Serializes as a plain JSON object (no variant tag); the owning issue's
/// `kind` says which variant it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IssueDetails {
    SustainedNegativeEmotion {
        emotion: Option<EmotionLabel>,
        duration_minutes: u32,
        negative_percentage: f64,
    },
    RapidEmotionSwings {
        swings_detected: usize,
        time_window_minutes: u32,
    },
    ExtremeEmotion {
        emotion: Option<EmotionLabel>,
        confidence: f64,
        occurrences: usize,
    },
    CommunicationBreakdown {
        minutes_since_last_interaction: f64,
    },
}

impl IssueDetails {
    /// The issue kind these details belong to.
    pub fn kind(&self) -> IssueKind {
        match self {
            IssueDetails::SustainedNegativeEmotion { .. } => IssueKind::SustainedNegativeEmotion,
            IssueDetails::RapidEmotionSwings { .. } => IssueKind::RapidEmotionSwings,
            IssueDetails::ExtremeEmotion { .. } => IssueKind::ExtremeEmotion,
            IssueDetails::CommunicationBreakdown { .. } => IssueKind::CommunicationBreakdown,
        }
    }
}

/// A structured alert produced when a rule fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Unique issue identifier
    pub id: Uuid,
    /// What was detected
    #[serde(rename = "type")]
    pub kind: IssueKind,
    /// How urgent it is
    pub severity: Severity,
    /// Evidence supporting the issue
    pub details: IssueDetails,
    /// What the operator should do
    pub recommendation: String,
    /// When the detector raised it
    pub raised_at: DateTime<Utc>,
}

impl Issue {
    /// Build an issue from rule details; kind, severity and recommendation
    /// follow from the details variant.
    pub fn new(details: IssueDetails, raised_at: DateTime<Utc>) -> Self {
        let kind = details.kind();
        Self {
            id: Uuid::new_v4(),
            kind,
            severity: kind.severity(),
            details,
            recommendation: kind.recommendation().to_string(),
            raised_at,
        }
    }
}
