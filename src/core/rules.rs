//! Detection rules.
//!
//! Each rule is a pure function of an observation sequence, its own
//! threshold record and the evaluation context. Rules never see each other's
//! results and never touch the issue history.

use crate::core::issue::{IssueDetails, IssueKind};
use crate::core::thresholds::{
    CommunicationBreakdownThreshold, ExtremeEmotionThreshold, RapidSwingsThreshold,
    SustainedNegativeThreshold, Thresholds,
};
use crate::core::window::ObservationWindow;
use crate::observation::Observation;
use chrono::{DateTime, Utc};

/// Inputs shared by every rule in one check.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext {
    /// Evaluation time, read once per check
    pub now: DateTime<Utc>,
    /// Last time the user actively engaged, if known
    pub last_interaction: Option<DateTime<Utc>>,
}

/// A single detection rule.
pub trait Rule: Send + Sync {
    /// The issue kind this rule raises.
    fn kind(&self) -> IssueKind;

    /// Evaluate the rule, returning evidence if it fires.
    fn evaluate(&self, observations: &[Observation], ctx: &CheckContext) -> Option<IssueDetails>;
}

/// Build the default rule set in evaluation order.
pub fn default_rules(thresholds: &Thresholds) -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(SustainedNegativeRule::new(thresholds.sustained_negative.clone())),
        Box::new(RapidSwingsRule::new(thresholds.rapid_swings.clone())),
        Box::new(ExtremeEmotionRule::new(thresholds.extreme_emotion.clone())),
        Box::new(CommunicationBreakdownRule::new(
            thresholds.communication_breakdown.clone(),
        )),
    ]
}

/// Fires when most recent readings are confidently negative.
pub struct SustainedNegativeRule {
    threshold: SustainedNegativeThreshold,
}

impl SustainedNegativeRule {
    pub fn new(threshold: SustainedNegativeThreshold) -> Self {
        Self { threshold }
    }
}

impl Rule for SustainedNegativeRule {
    fn kind(&self) -> IssueKind {
        IssueKind::SustainedNegativeEmotion
    }

    fn evaluate(&self, observations: &[Observation], ctx: &CheckContext) -> Option<IssueDetails> {
        let t = &self.threshold;
        let window = ObservationWindow::recent(observations, ctx.now, t.duration_minutes);
        if window.len() < t.min_observations || window.is_empty() {
            return None;
        }

        let negatives: Vec<&Observation> = window
            .iter()
            .filter(|o| o.matches(&t.emotions, t.confidence_threshold))
            .collect();

        let total = window.len() as f64;
        if (negatives.len() as f64) < total * t.negative_ratio {
            return None;
        }

        Some(IssueDetails::SustainedNegativeEmotion {
            emotion: negatives.last().and_then(|o| o.label),
            duration_minutes: t.duration_minutes,
            negative_percentage: negatives.len() as f64 / total * 100.0,
        })
    }
}

/// Fires when the dominant label keeps changing within a short window.
pub struct RapidSwingsRule {
    threshold: RapidSwingsThreshold,
}

impl RapidSwingsRule {
    pub fn new(threshold: RapidSwingsThreshold) -> Self {
        Self { threshold }
    }
}

impl Rule for RapidSwingsRule {
    fn kind(&self) -> IssueKind {
        IssueKind::RapidEmotionSwings
    }

    fn evaluate(&self, observations: &[Observation], ctx: &CheckContext) -> Option<IssueDetails> {
        let t = &self.threshold;
        let window = ObservationWindow::recent(observations, ctx.now, t.time_window_minutes);
        if window.len() < t.min_observations {
            return None;
        }

        let swings = count_label_changes(&window);
        if swings < t.required_swings() {
            return None;
        }

        Some(IssueDetails::RapidEmotionSwings {
            swings_detected: swings,
            time_window_minutes: t.time_window_minutes,
        })
    }
}

/// Count adjacent label changes, ignoring unlabelled readings.
fn count_label_changes(window: &ObservationWindow<'_>) -> usize {
    let labels: Vec<_> = window.iter().filter_map(|o| o.label).collect();
    labels.windows(2).filter(|pair| pair[0] != pair[1]).count()
}

/// Fires on repeated high-confidence extreme readings.
pub struct ExtremeEmotionRule {
    threshold: ExtremeEmotionThreshold,
}

impl ExtremeEmotionRule {
    pub fn new(threshold: ExtremeEmotionThreshold) -> Self {
        Self { threshold }
    }
}

impl Rule for ExtremeEmotionRule {
    fn kind(&self) -> IssueKind {
        IssueKind::ExtremeEmotion
    }

    fn evaluate(&self, observations: &[Observation], ctx: &CheckContext) -> Option<IssueDetails> {
        let t = &self.threshold;
        let window = ObservationWindow::recent(observations, ctx.now, t.duration_minutes);
        if window.is_empty() {
            return None;
        }

        let extremes: Vec<&Observation> = window
            .iter()
            .filter(|o| o.matches(&t.emotions, t.confidence_threshold))
            .collect();
        if extremes.len() < t.min_occurrences.max(1) {
            return None;
        }

        let latest = extremes.last()?;
        Some(IssueDetails::ExtremeEmotion {
            emotion: latest.label,
            confidence: latest.confidence,
            occurrences: extremes.len(),
        })
    }
}

/// Fires when the user has not engaged for too long.
///
/// Skipped entirely when no last-interaction time is known.
pub struct CommunicationBreakdownRule {
    threshold: CommunicationBreakdownThreshold,
}

impl CommunicationBreakdownRule {
    pub fn new(threshold: CommunicationBreakdownThreshold) -> Self {
        Self { threshold }
    }
}

impl Rule for CommunicationBreakdownRule {
    fn kind(&self) -> IssueKind {
        IssueKind::CommunicationBreakdown
    }

    fn evaluate(&self, _observations: &[Observation], ctx: &CheckContext) -> Option<IssueDetails> {
        let last = ctx.last_interaction?;
        let minutes_since = (ctx.now - last).num_milliseconds() as f64 / 60_000.0;

        if minutes_since < f64::from(self.threshold.no_response_minutes) {
            return None;
        }

        Some(IssueDetails::CommunicationBreakdown {
            minutes_since_last_interaction: minutes_since,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::EmotionLabel;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn ctx() -> CheckContext {
        CheckContext {
            now: now(),
            last_interaction: None,
        }
    }

    /// Observations spaced `step_secs` apart, the last one at `now`.
    fn series(labels: &[EmotionLabel], confidence: f64, step_secs: i64) -> Vec<Observation> {
        let n = labels.len() as i64;
        labels
            .iter()
            .enumerate()
            .map(|(i, &label)| {
                let ago = (n - 1 - i as i64) * step_secs;
                Observation::new(now() - Duration::seconds(ago), label, confidence)
            })
            .collect()
    }

    #[test]
    fn test_sustained_negative_fires() {
        let rule = SustainedNegativeRule::new(SustainedNegativeThreshold::default());
        let obs = series(&[EmotionLabel::Sad; 5], 0.8, 60);

        match rule.evaluate(&obs, &ctx()) {
            Some(IssueDetails::SustainedNegativeEmotion {
                emotion,
                duration_minutes,
                negative_percentage,
            }) => {
                assert_eq!(emotion, Some(EmotionLabel::Sad));
                assert_eq!(duration_minutes, 15);
                assert_eq!(negative_percentage, 100.0);
            }
            other => panic!("expected sustained negative, got {other:?}"),
        }
    }

    #[test]
    fn test_sustained_negative_needs_min_observations() {
        let rule = SustainedNegativeRule::new(SustainedNegativeThreshold::default());
        let obs = series(&[EmotionLabel::Sad; 2], 0.9, 60);
        assert!(rule.evaluate(&obs, &ctx()).is_none());
    }

    #[test]
    fn test_sustained_negative_ratio_boundary() {
        let rule = SustainedNegativeRule::new(SustainedNegativeThreshold::default());

        // 7 of 10 negative is exactly 70%.
        let mut labels = vec![EmotionLabel::Angry; 7];
        labels.extend([EmotionLabel::Calm; 3]);
        let obs = series(&labels, 0.75, 30);
        assert!(rule.evaluate(&obs, &ctx()).is_some());

        // 6 of 10 is not enough.
        let mut labels = vec![EmotionLabel::Angry; 6];
        labels.extend([EmotionLabel::Calm; 4]);
        let obs = series(&labels, 0.75, 30);
        assert!(rule.evaluate(&obs, &ctx()).is_none());
    }

    #[test]
    fn test_sustained_negative_ignores_low_confidence_and_old_readings() {
        let rule = SustainedNegativeRule::new(SustainedNegativeThreshold::default());

        let obs = series(&[EmotionLabel::Sad; 5], 0.65, 60);
        assert!(rule.evaluate(&obs, &ctx()).is_none());

        // All readings older than the 15 minute window.
        let obs = series(&[EmotionLabel::Sad; 5], 0.9, 60)
            .into_iter()
            .map(|mut o| {
                o.timestamp -= Duration::minutes(30);
                o
            })
            .collect::<Vec<_>>();
        assert!(rule.evaluate(&obs, &ctx()).is_none());
    }

    #[test]
    fn test_unlabelled_readings_dilute_but_never_count() {
        let rule = SustainedNegativeRule::new(SustainedNegativeThreshold::default());
        let mut obs = series(&[EmotionLabel::Sad; 3], 0.9, 60);
        for o in obs.iter_mut().take(2) {
            o.label = None;
        }
        assert!(rule.evaluate(&obs, &ctx()).is_none());
    }

    #[test]
    fn test_rapid_swings_threshold() {
        let rule = RapidSwingsRule::new(RapidSwingsThreshold::default());

        let few = series(
            &[
                EmotionLabel::Happy,
                EmotionLabel::Sad,
                EmotionLabel::Happy,
                EmotionLabel::Sad,
            ],
            0.8,
            10,
        );
        assert!(rule.evaluate(&few, &ctx()).is_none());

        let labels: Vec<EmotionLabel> = (0..16)
            .map(|i| {
                if i % 2 == 0 {
                    EmotionLabel::Happy
                } else {
                    EmotionLabel::Sad
                }
            })
            .collect();
        let many = series(&labels, 0.8, 10);
        assert_eq!(
            rule.evaluate(&many, &ctx()),
            Some(IssueDetails::RapidEmotionSwings {
                swings_detected: 15,
                time_window_minutes: 5,
            })
        );
    }

    #[test]
    fn test_rapid_swings_skip_unlabelled() {
        let mut window_obs = series(&[EmotionLabel::Happy; 3], 0.8, 10);
        window_obs[1].label = None;
        let window = ObservationWindow::recent(&window_obs, now(), 5);
        assert_eq!(count_label_changes(&window), 0);

        // happy, None, sad: the gap is bridged, giving one change.
        let mut window_obs = series(
            &[EmotionLabel::Happy, EmotionLabel::Happy, EmotionLabel::Sad],
            0.8,
            10,
        );
        window_obs[1].label = None;
        let window = ObservationWindow::recent(&window_obs, now(), 5);
        assert_eq!(count_label_changes(&window), 1);
    }

    #[test]
    fn test_extreme_emotion() {
        let rule = ExtremeEmotionRule::new(ExtremeEmotionThreshold::default());

        let obs = series(&[EmotionLabel::Angry, EmotionLabel::Angry], 0.95, 60);
        assert_eq!(
            rule.evaluate(&obs, &ctx()),
            Some(IssueDetails::ExtremeEmotion {
                emotion: Some(EmotionLabel::Angry),
                confidence: 0.95,
                occurrences: 2,
            })
        );

        let obs = series(&[EmotionLabel::Angry, EmotionLabel::Angry], 0.85, 60);
        assert!(rule.evaluate(&obs, &ctx()).is_none());

        assert!(rule.evaluate(&[], &ctx()).is_none());
    }

    #[test]
    fn test_extreme_reports_latest_qualifying_reading() {
        let rule = ExtremeEmotionRule::new(ExtremeEmotionThreshold::default());
        let mut obs = series(
            &[EmotionLabel::Angry, EmotionLabel::Fearful, EmotionLabel::Calm],
            0.95,
            30,
        );
        obs[1].confidence = 0.97;

        match rule.evaluate(&obs, &ctx()) {
            Some(IssueDetails::ExtremeEmotion {
                emotion,
                confidence,
                occurrences,
            }) => {
                assert_eq!(emotion, Some(EmotionLabel::Fearful));
                assert_eq!(confidence, 0.97);
                assert_eq!(occurrences, 2);
            }
            other => panic!("expected extreme emotion, got {other:?}"),
        }
    }

    #[test]
    fn test_communication_breakdown_boundary() {
        let rule = CommunicationBreakdownRule::new(CommunicationBreakdownThreshold::default());
        let at = |minutes: i64| CheckContext {
            now: now(),
            last_interaction: Some(now() - Duration::minutes(minutes)),
        };

        assert!(rule.evaluate(&[], &at(29)).is_none());
        assert_eq!(
            rule.evaluate(&[], &at(30)),
            Some(IssueDetails::CommunicationBreakdown {
                minutes_since_last_interaction: 30.0
            })
        );
        assert!(rule.evaluate(&[], &at(31)).is_some());
        assert!(rule.evaluate(&[], &ctx()).is_none());
    }

    #[test]
    fn test_default_rule_order() {
        let kinds: Vec<IssueKind> = default_rules(&Thresholds::default())
            .iter()
            .map(|r| r.kind())
            .collect();
        assert_eq!(
            kinds,
            vec![
                IssueKind::SustainedNegativeEmotion,
                IssueKind::RapidEmotionSwings,
                IssueKind::ExtremeEmotion,
                IssueKind::CommunicationBreakdown,
            ]
        );
    }
}
