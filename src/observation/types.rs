//! Emotion observation types for the Synheart Affect Monitor.
//!
//! These types carry ONLY a label, a confidence and a timestamp - never the
//! frames or audio the upstream classifier looked at.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Closed emotion vocabulary shared by the facial and vocal classifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionLabel {
    Neutral,
    Calm,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgust,
    Surprised,
}

impl EmotionLabel {
    /// All labels, in vocabulary order.
    pub const ALL: [EmotionLabel; 8] = [
        EmotionLabel::Neutral,
        EmotionLabel::Calm,
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Angry,
        EmotionLabel::Fearful,
        EmotionLabel::Disgust,
        EmotionLabel::Surprised,
    ];

    /// Canonical lower-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Neutral => "neutral",
            EmotionLabel::Calm => "calm",
            EmotionLabel::Happy => "happy",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Angry => "angry",
            EmotionLabel::Fearful => "fearful",
            EmotionLabel::Disgust => "disgust",
            EmotionLabel::Surprised => "surprised",
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionLabel {
    type Err = ObservationError;

    /// Parse a label from either vocabulary.
    ///
    /// The facial classifier says `fear` and `surprise` where the vocal one
    /// says `fearful` and `surprised`; both spellings map to the same label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "neutral" => Ok(EmotionLabel::Neutral),
            "calm" => Ok(EmotionLabel::Calm),
            "happy" => Ok(EmotionLabel::Happy),
            "sad" => Ok(EmotionLabel::Sad),
            "angry" => Ok(EmotionLabel::Angry),
            "fearful" | "fear" => Ok(EmotionLabel::Fearful),
            "disgust" => Ok(EmotionLabel::Disgust),
            "surprised" | "surprise" => Ok(EmotionLabel::Surprised),
            other => Err(ObservationError::UnknownLabel(other.to_string())),
        }
    }
}

/// Which upstream classifier produced an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationSource {
    Facial,
    Audio,
    #[default]
    Unknown,
}

impl ObservationSource {
    fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "facial" | "face" | "video" => ObservationSource::Facial,
            "audio" | "voice" => ObservationSource::Audio,
            _ => ObservationSource::Unknown,
        }
    }
}

/// A single timestamped emotion reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// When the reading was taken
    pub timestamp: DateTime<Utc>,
    /// Dominant emotion, if the classifier reported one
    pub label: Option<EmotionLabel>,
    /// Classifier confidence (0-1)
    pub confidence: f64,
    /// Classifier that produced the reading
    #[serde(default)]
    pub source: ObservationSource,
}

impl Observation {
    pub fn new(timestamp: DateTime<Utc>, label: EmotionLabel, confidence: f64) -> Self {
        Self {
            timestamp,
            label: Some(label),
            confidence,
            source: ObservationSource::Unknown,
        }
    }

    /// Whether the confidence is a finite value in `[0, 1]`.
    pub fn has_valid_confidence(&self) -> bool {
        confidence_in_range(self.confidence)
    }

    /// Whether the label is one of `labels` with at least `min_confidence`.
    pub fn matches(&self, labels: &[EmotionLabel], min_confidence: f64) -> bool {
        match self.label {
            Some(label) => labels.contains(&label) && self.confidence >= min_confidence,
            None => false,
        }
    }
}

/// An observation as emitted by an emotion source, before validation.
///
/// Every field is optional so that a single malformed record never fails a
/// whole batch at deserialization time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawObservation {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default, alias = "dominant_emotion", alias = "emotion")]
    pub label: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub source: Option<String>,
}

impl RawObservation {
    /// Validate into an [`Observation`].
    ///
    /// A missing timestamp is stamped with `received_at`. A missing confidence
    /// is treated as 0 and a missing label stays absent.
    pub fn into_observation(
        self,
        received_at: DateTime<Utc>,
    ) -> Result<Observation, ObservationError> {
        let timestamp = match self.timestamp.as_deref() {
            Some(ts) => parse_timestamp(ts)?,
            None => received_at,
        };

        let confidence = self.confidence.unwrap_or(0.0);
        if !confidence_in_range(confidence) {
            return Err(ObservationError::ConfidenceOutOfRange(confidence));
        }

        let label = self
            .label
            .as_deref()
            .map(EmotionLabel::from_str)
            .transpose()?;

        Ok(Observation {
            timestamp,
            label,
            confidence,
            source: self
                .source
                .as_deref()
                .map(ObservationSource::parse)
                .unwrap_or_default(),
        })
    }
}

fn confidence_in_range(confidence: f64) -> bool {
    confidence.is_finite() && (0.0..=1.0).contains(&confidence)
}

/// Parse an RFC 3339 timestamp, or a naive ISO-8601 one interpreted as UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, ObservationError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|_| ObservationError::InvalidTimestamp(s.to_string()))
}

/// Reasons a single observation is excluded from evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ObservationError {
    #[error("unparsable timestamp: {0:?}")]
    InvalidTimestamp(String),
    #[error("unknown emotion label: {0:?}")]
    UnknownLabel(String),
    #[error("confidence {0} outside [0, 1]")]
    ConfidenceOutOfRange(f64),
}
