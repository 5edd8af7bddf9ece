//! Plain-text issue reports for ground control.
//!
//! Rendering is deterministic apart from the header timestamp, which the
//! caller supplies.

use crate::core::issue::Issue;
use chrono::{DateTime, TimeZone};
use std::fmt::{Display, Write};

/// Report text when there is nothing to report.
pub const NO_ISSUES_MESSAGE: &str = "No critical issues detected. All systems normal.";

/// Width of the header rule.
const RULE_WIDTH: usize = 50;

/// Render a report for `issues`, stamped with `now`.
pub fn generate_report<Tz>(issues: &[Issue], now: DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if issues.is_empty() {
        return NO_ISSUES_MESSAGE.to_string();
    }

    let mut report = format!(
        "CRITICAL ISSUE REPORT - {}\n",
        now.format("%Y-%m-%d %H:%M:%S")
    );
    report.push_str(&"=".repeat(RULE_WIDTH));
    report.push_str("\n\n");

    for (i, issue) in issues.iter().enumerate() {
        let details = serde_json::to_string_pretty(&issue.details)
            .unwrap_or_else(|_| "{}".to_string());

        // Writing to a String cannot fail.
        let _ = writeln!(report, "Issue #{}: {}", i + 1, title_case(issue.kind.as_str()));
        let _ = writeln!(report, "Severity: {}", issue.severity.as_str().to_uppercase());
        let _ = writeln!(report, "Details: {details}");
        let _ = writeln!(report, "Recommendation: {}", issue.recommendation);
        report.push('\n');
    }

    report
}

/// One line per issue for the most recent `limit` issues.
pub fn history_summary(issues: &[Issue], limit: usize) -> String {
    if issues.is_empty() {
        return "No critical issues detected".to_string();
    }

    let mut summary = format!("Critical issues: {}\n", issues.len());
    let start = issues.len().saturating_sub(limit);
    for issue in &issues[start..] {
        let _ = writeln!(
            summary,
            "  - [{}] {} ({})",
            issue.raised_at.format("%Y-%m-%d %H:%M:%S"),
            issue.kind,
            issue.severity
        );
    }
    summary
}

/// `sustained_negative_emotion` -> `Sustained Negative Emotion`.
pub fn title_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::issue::IssueDetails;
    use crate::observation::EmotionLabel;
    use chrono::{Duration, Utc};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_report() {
        assert_eq!(generate_report(&[], fixed_now()), NO_ISSUES_MESSAGE);
    }

    #[test]
    fn test_report_golden() {
        let issues = vec![
            Issue::new(
                IssueDetails::SustainedNegativeEmotion {
                    emotion: Some(EmotionLabel::Sad),
                    duration_minutes: 15,
                    negative_percentage: 100.0,
                },
                fixed_now(),
            ),
            Issue::new(
                IssueDetails::RapidEmotionSwings {
                    swings_detected: 15,
                    time_window_minutes: 5,
                },
                fixed_now(),
            ),
        ];

        let expected = "CRITICAL ISSUE REPORT - 2026-03-01 12:00:00\n\
==================================================\n\
\n\
Issue #1: Sustained Negative Emotion\n\
Severity: HIGH\n\
Details: {\n  \"emotion\": \"sad\",\n  \"duration_minutes\": 15,\n  \"negative_percentage\": 100.0\n}\n\
Recommendation: Immediate psychological support recommended. Consider ground control notification.\n\
\n\
Issue #2: Rapid Emotion Swings\n\
Severity: MEDIUM\n\
Details: {\n  \"swings_detected\": 15,\n  \"time_window_minutes\": 5\n}\n\
Recommendation: Monitor closely. May indicate stress or instability.\n\
\n";

        assert_eq!(generate_report(&issues, fixed_now()), expected);
    }

    #[test]
    fn test_report_is_stable_apart_from_header() {
        let issues = vec![Issue::new(
            IssueDetails::CommunicationBreakdown {
                minutes_since_last_interaction: 31.5,
            },
            fixed_now(),
        )];

        let a = generate_report(&issues, fixed_now());
        let b = generate_report(&issues, fixed_now() + Duration::seconds(7));
        assert_ne!(a.lines().next(), b.lines().next());
        assert_eq!(
            a.lines().skip(1).collect::<Vec<_>>(),
            b.lines().skip(1).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_report_in_local_timezone() {
        let tz: chrono_tz::Tz = "Asia/Tokyo".parse().unwrap();
        let issues = vec![Issue::new(
            IssueDetails::CommunicationBreakdown {
                minutes_since_last_interaction: 30.0,
            },
            fixed_now(),
        )];
        let report = generate_report(&issues, fixed_now().with_timezone(&tz));
        assert!(report.starts_with("CRITICAL ISSUE REPORT - 2026-03-01 21:00:00\n"));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("communication_breakdown"), "Communication Breakdown");
        assert_eq!(title_case("extreme_emotion"), "Extreme Emotion");
    }

    #[test]
    fn test_history_summary() {
        assert_eq!(history_summary(&[], 5), "No critical issues detected");

        let issues: Vec<Issue> = (0..7)
            .map(|i| {
                Issue::new(
                    IssueDetails::CommunicationBreakdown {
                        minutes_since_last_interaction: 30.0 + i as f64,
                    },
                    fixed_now() + Duration::minutes(i),
                )
            })
            .collect();
        let summary = history_summary(&issues, 5);
        assert!(summary.starts_with("Critical issues: 7\n"));
        assert_eq!(summary.lines().count(), 6);
        assert!(summary.contains("communication_breakdown (high)"));
    }
}
