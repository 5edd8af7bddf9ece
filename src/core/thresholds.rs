//! Threshold parameters for the detection rules.
//!
//! Thresholds are fixed when a detector is constructed and read-only
//! during evaluation.

use crate::observation::EmotionLabel;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parameters for the sustained negative emotion rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SustainedNegativeThreshold {
    /// Labels counted as negative
    pub emotions: Vec<EmotionLabel>,
    /// Look-back window
    pub duration_minutes: u32,
    /// Minimum confidence for a negative reading to count
    pub confidence_threshold: f64,
    /// Minimum observations in the window before the rule can fire
    pub min_observations: usize,
    /// Share of the window that must be negative (0-1)
    pub negative_ratio: f64,
}

impl Default for SustainedNegativeThreshold {
    fn default() -> Self {
        Self {
            emotions: vec![EmotionLabel::Sad, EmotionLabel::Angry, EmotionLabel::Fearful],
            duration_minutes: 15,
            confidence_threshold: 0.7,
            min_observations: 3,
            negative_ratio: 0.7,
        }
    }
}

/// Parameters for the rapid emotion swings rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RapidSwingsThreshold {
    pub swings_per_minute: u32,
    pub time_window_minutes: u32,
    pub min_observations: usize,
}

impl RapidSwingsThreshold {
    /// Label changes needed within the window for the rule to fire.
    pub fn required_swings(&self) -> usize {
        (self.swings_per_minute as usize) * (self.time_window_minutes as usize)
    }
}

impl Default for RapidSwingsThreshold {
    fn default() -> Self {
        Self {
            swings_per_minute: 3,
            time_window_minutes: 5,
            min_observations: 3,
        }
    }
}

/// Parameters for the extreme emotion rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtremeEmotionThreshold {
    pub emotions: Vec<EmotionLabel>,
    pub confidence_threshold: f64,
    pub duration_minutes: u32,
    /// Extreme readings needed within the window
    pub min_occurrences: usize,
}

impl Default for ExtremeEmotionThreshold {
    fn default() -> Self {
        Self {
            emotions: vec![EmotionLabel::Angry, EmotionLabel::Fearful],
            confidence_threshold: 0.9,
            duration_minutes: 5,
            min_occurrences: 2,
        }
    }
}

/// Parameters for the communication breakdown rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunicationBreakdownThreshold {
    pub no_response_minutes: u32,
}

impl Default for CommunicationBreakdownThreshold {
    fn default() -> Self {
        Self {
            no_response_minutes: 30,
        }
    }
}

/// The full rule configuration, one record per issue kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub sustained_negative: SustainedNegativeThreshold,
    pub rapid_swings: RapidSwingsThreshold,
    pub extreme_emotion: ExtremeEmotionThreshold,
    pub communication_breakdown: CommunicationBreakdownThreshold,
}

impl Thresholds {
    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<(), ThresholdError> {
        let sustained = &self.sustained_negative;
        check_unit("sustained_negative.confidence_threshold", sustained.confidence_threshold)?;
        check_unit("sustained_negative.negative_ratio", sustained.negative_ratio)?;
        check_nonzero("sustained_negative.duration_minutes", sustained.duration_minutes)?;
        if sustained.emotions.is_empty() {
            return Err(ThresholdError::EmptyEmotionSet("sustained_negative.emotions"));
        }

        let swings = &self.rapid_swings;
        check_nonzero("rapid_swings.time_window_minutes", swings.time_window_minutes)?;
        check_nonzero("rapid_swings.swings_per_minute", swings.swings_per_minute)?;

        let extreme = &self.extreme_emotion;
        check_unit("extreme_emotion.confidence_threshold", extreme.confidence_threshold)?;
        check_nonzero("extreme_emotion.duration_minutes", extreme.duration_minutes)?;
        if extreme.emotions.is_empty() {
            return Err(ThresholdError::EmptyEmotionSet("extreme_emotion.emotions"));
        }

        check_nonzero(
            "communication_breakdown.no_response_minutes",
            self.communication_breakdown.no_response_minutes,
        )?;

        Ok(())
    }
}

fn check_unit(name: &'static str, value: f64) -> Result<(), ThresholdError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ThresholdError::OutOfRange { name, value })
    }
}

fn check_nonzero(name: &'static str, value: u32) -> Result<(), ThresholdError> {
    if value == 0 {
        Err(ThresholdError::Zero(name))
    } else {
        Ok(())
    }
}

/// Invalid threshold configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    #[error("{name} must be within [0, 1], got {value}")]
    OutOfRange { name: &'static str, value: f64 },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("{0} must name at least one emotion")]
    EmptyEmotionSet(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let t = Thresholds::default();
        assert_eq!(t.sustained_negative.duration_minutes, 15);
        assert_eq!(t.sustained_negative.confidence_threshold, 0.7);
        assert_eq!(t.rapid_swings.required_swings(), 15);
        assert_eq!(t.extreme_emotion.confidence_threshold, 0.9);
        assert_eq!(t.extreme_emotion.min_occurrences, 2);
        assert_eq!(t.communication_breakdown.no_response_minutes, 30);
        assert!(t.validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let mut t = Thresholds::default();
        t.extreme_emotion.confidence_threshold = 1.2;
        assert!(matches!(t.validate(), Err(ThresholdError::OutOfRange { .. })));

        let mut t = Thresholds::default();
        t.rapid_swings.time_window_minutes = 0;
        assert_eq!(
            t.validate(),
            Err(ThresholdError::Zero("rapid_swings.time_window_minutes"))
        );

        let mut t = Thresholds::default();
        t.sustained_negative.emotions.clear();
        assert!(matches!(t.validate(), Err(ThresholdError::EmptyEmotionSet(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let t: Thresholds =
            serde_json::from_str(r#"{"communication_breakdown": {"no_response_minutes": 45}}"#)
                .unwrap();
        assert_eq!(t.communication_breakdown.no_response_minutes, 45);
        assert_eq!(t.sustained_negative, SustainedNegativeThreshold::default());
    }
}
