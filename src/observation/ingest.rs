//! Batch ingestion of observations from JSON input.
//!
//! Malformed records are excluded one by one and reported in the outcome;
//! they never abort the batch.

use crate::observation::types::{Observation, ObservationError, RawObservation};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result of ingesting a batch of raw observations.
#[derive(Debug, Default)]
pub struct IngestOutcome {
    /// Observations that passed validation, in input order
    pub accepted: Vec<Observation>,
    /// Index of each rejected record and why it was rejected
    pub rejected: Vec<(usize, RejectReason)>,
}

impl IngestOutcome {
    /// Total number of records seen.
    pub fn total(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }
}

/// Why a record was excluded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RejectReason {
    #[error("not a valid observation record: {0}")]
    Malformed(String),
    #[error(transparent)]
    Invalid(#[from] ObservationError),
}

/// Errors that make an entire input unusable.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("input is neither a JSON array nor JSON lines: {0}")]
    Format(String),
}

/// Validate already-deserialized records.
pub fn ingest<I>(records: I, received_at: DateTime<Utc>) -> IngestOutcome
where
    I: IntoIterator<Item = RawObservation>,
{
    let mut outcome = IngestOutcome::default();
    for (index, record) in records.into_iter().enumerate() {
        match record.into_observation(received_at) {
            Ok(obs) => outcome.accepted.push(obs),
            Err(e) => {
                tracing::warn!(index, error = %e, "Excluding observation");
                outcome.rejected.push((index, e.into()));
            }
        }
    }
    outcome
}

/// Parse observations from a JSON array or from JSON lines.
///
/// Blank lines are skipped. In JSON-lines mode a line that is not an object
/// is rejected individually.
pub fn ingest_json(input: &str, received_at: DateTime<Utc>) -> Result<IngestOutcome, IngestError> {
    let trimmed = input.trim_start();
    if trimmed.starts_with('[') {
        let values: Vec<serde_json::Value> =
            serde_json::from_str(trimmed).map_err(|e| IngestError::Format(e.to_string()))?;
        return Ok(ingest_values(values.into_iter().map(Ok), received_at));
    }

    let lines = input
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str::<serde_json::Value>(line).map_err(|e| e.to_string()));
    Ok(ingest_values(lines, received_at))
}

fn ingest_values<I>(values: I, received_at: DateTime<Utc>) -> IngestOutcome
where
    I: Iterator<Item = Result<serde_json::Value, String>>,
{
    let mut outcome = IngestOutcome::default();
    for (index, value) in values.enumerate() {
        let record = value.and_then(|v| {
            serde_json::from_value::<RawObservation>(v).map_err(|e| e.to_string())
        });
        let result = match record {
            Ok(record) => record.into_observation(received_at).map_err(RejectReason::from),
            Err(e) => Err(RejectReason::Malformed(e)),
        };
        match result {
            Ok(obs) => outcome.accepted.push(obs),
            Err(reason) => {
                tracing::warn!(index, error = %reason, "Excluding observation");
                outcome.rejected.push((index, reason));
            }
        }
    }
    outcome
}
