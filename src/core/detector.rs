//! The critical-issue detector.
//!
//! One detector is created per monitored session. It owns the rule set and
//! the issue history; callers feed it observation windows and decide what to
//! do with the issues it raises.

use crate::core::history::IssueHistory;
use crate::core::issue::Issue;
use crate::core::rules::{default_rules, CheckContext, Rule};
use crate::core::thresholds::Thresholds;
use crate::observation::Observation;
use chrono::{DateTime, Duration, Utc};

/// Evaluates observations against the threshold rules and records issues.
///
/// Not synchronized: a multi-threaded host must serialize calls to
/// [`check`](Self::check) and [`history`](Self::history).
pub struct IssueDetector {
    thresholds: Thresholds,
    rules: Vec<Box<dyn Rule>>,
    history: IssueHistory,
}

impl IssueDetector {
    /// Create a detector with an empty history.
    pub fn new(thresholds: Thresholds) -> Self {
        Self::with_history(thresholds, IssueHistory::new())
    }

    /// Create a detector that continues a previously persisted history.
    pub fn with_history(thresholds: Thresholds, history: IssueHistory) -> Self {
        let rules = default_rules(&thresholds);
        tracing::info!(
            rules = rules.len(),
            prior_issues = history.len(),
            "Critical issue detector initialized"
        );
        Self {
            thresholds,
            rules,
            history,
        }
    }

    /// Evaluate every rule against `observations` as of `now`.
    ///
    /// `observations` must be sorted by timestamp. Returns the issues raised
    /// by this call in rule order (sustained negative, rapid swings, extreme,
    /// communication breakdown); each is also appended to the history. No
    /// de-duplication is done against earlier calls.
    pub fn check(
        &mut self,
        observations: &[Observation],
        last_interaction: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Vec<Issue> {
        let ctx = CheckContext {
            now,
            last_interaction,
        };

        let issues: Vec<Issue> = self
            .rules
            .iter()
            .filter_map(|rule| {
                let details = rule.evaluate(observations, &ctx)?;
                tracing::debug!(kind = %rule.kind(), ?details, "Rule fired");
                Some(Issue::new(details, now))
            })
            .collect();

        for issue in &issues {
            self.history.push(issue.clone());
        }

        if !issues.is_empty() {
            tracing::warn!(
                count = issues.len(),
                observations = observations.len(),
                "Critical issues detected"
            );
        }

        issues
    }

    /// [`check`](Self::check) against the wall clock.
    pub fn check_now(
        &mut self,
        observations: &[Observation],
        last_interaction: Option<DateTime<Utc>>,
    ) -> Vec<Issue> {
        self.check(observations, last_interaction, Utc::now())
    }

    /// Issues raised within `since` of `now`, in the order they were raised.
    pub fn history(&self, since: Duration, now: DateTime<Utc>) -> Vec<Issue> {
        self.history.since(now, since)
    }

    /// [`history`](Self::history) against the wall clock.
    pub fn history_now(&self, since: Duration) -> Vec<Issue> {
        self.history(since, Utc::now())
    }

    /// The full issue history.
    pub fn issue_history(&self) -> &IssueHistory {
        &self.history
    }

    /// Mutable access for explicit retention (see [`IssueHistory::prune_before`]).
    pub fn issue_history_mut(&mut self) -> &mut IssueHistory {
        &mut self.history
    }

    /// The thresholds this detector was built with.
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Consume the detector, keeping its history.
    pub fn into_history(self) -> IssueHistory {
        self.history
    }
}

impl Default for IssueDetector {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::issue::{IssueKind, Severity};
    use crate::observation::EmotionLabel;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_check_appends_to_history() {
        let mut detector = IssueDetector::default();
        let obs: Vec<Observation> = (0..3)
            .map(|i| Observation::new(now() - Duration::seconds(i * 20), EmotionLabel::Angry, 0.95))
            .rev()
            .collect();

        let issues = detector.check(&obs, None, now());
        let kinds: Vec<IssueKind> = issues.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![IssueKind::SustainedNegativeEmotion, IssueKind::ExtremeEmotion]
        );
        assert!(issues.iter().all(|i| i.severity == Severity::High));
        assert!(issues.iter().all(|i| i.raised_at == now()));
        assert_eq!(detector.issue_history().len(), 2);

        // Re-checking the same window raises the same issues again.
        detector.check(&obs, None, now() + Duration::seconds(2));
        assert_eq!(detector.issue_history().len(), 4);
    }

    #[test]
    fn test_history_window() {
        let mut detector = IssueDetector::default();
        let idle_since = Some(now() - Duration::hours(1));

        detector.check(&[], idle_since, now() - Duration::hours(25));
        detector.check(&[], idle_since, now() - Duration::hours(2));
        detector.check(&[], idle_since, now());

        let recent = detector.history(Duration::hours(24), now());
        assert_eq!(recent.len(), 2);
        assert!(recent[0].raised_at < recent[1].raised_at);
        assert_eq!(detector.issue_history().len(), 3);
    }

    #[test]
    fn test_with_history_continues() {
        let mut first = IssueDetector::default();
        first.check(&[], Some(now() - Duration::minutes(45)), now());
        let history = first.into_history();

        let mut second = IssueDetector::with_history(Thresholds::default(), history);
        second.check(&[], Some(now() - Duration::minutes(50)), now() + Duration::minutes(5));
        assert_eq!(second.issue_history().len(), 2);
    }

    #[test]
    fn test_custom_thresholds() {
        let mut thresholds = Thresholds::default();
        thresholds.communication_breakdown.no_response_minutes = 5;
        let mut detector = IssueDetector::new(thresholds);

        let issues = detector.check(&[], Some(now() - Duration::minutes(6)), now());
        assert_eq!(issues.len(), 1);
        assert_eq!(detector.thresholds().communication_breakdown.no_response_minutes, 5);
    }
}
