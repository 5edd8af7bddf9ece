//! Look-back windows over observation sequences.
//!
//! A window is the subsequence of observations taken within a fixed number
//! of minutes before the evaluation time. Observations are expected in
//! ascending timestamp order; no sorting is done here. Readings whose
//! confidence is not a finite value in `[0, 1]` never enter a window.

use crate::observation::Observation;
use chrono::{DateTime, Duration, Utc};

/// A borrowed look-back window ending at the evaluation time.
#[derive(Debug, Clone)]
pub struct ObservationWindow<'a> {
    /// Earliest instant still inside the window
    pub start: DateTime<Utc>,
    /// Evaluation time
    pub end: DateTime<Utc>,
    /// Observations inside the window, in input order
    pub observations: Vec<&'a Observation>,
}

impl<'a> ObservationWindow<'a> {
    /// Select the observations within `minutes` of `now`.
    ///
    /// An observation is inside iff `now - timestamp <= minutes`, so readings
    /// stamped slightly in the future (clock skew between sources) are kept.
    pub fn recent(observations: &'a [Observation], now: DateTime<Utc>, minutes: u32) -> Self {
        let start = now - Duration::minutes(i64::from(minutes));
        Self {
            start,
            end: now,
            observations: observations
                .iter()
                .filter(|o| o.timestamp >= start && o.has_valid_confidence())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Iterate the observations in order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &'a Observation> + '_ {
        self.observations.iter().copied()
    }
}

/// Rolling buffer of the most recent observations.
///
/// Holds at most `capacity` observations; pushing beyond that evicts the
/// oldest. This is the caller-side history fed to the detector on each check.
#[derive(Debug, Clone)]
pub struct ObservationBuffer {
    capacity: usize,
    observations: Vec<Observation>,
}

impl ObservationBuffer {
    /// Create a buffer holding at most `capacity` observations.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            observations: Vec::with_capacity(capacity),
        }
    }

    /// Append an observation, evicting the oldest when full.
    pub fn push(&mut self, observation: Observation) {
        self.observations.push(observation);
        if self.observations.len() > self.capacity {
            let excess = self.observations.len() - self.capacity;
            self.observations.drain(..excess);
        }
    }

    /// Get the buffered observations, oldest first.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

impl Default for ObservationBuffer {
    fn default() -> Self {
        Self::new(100)
    }
}
