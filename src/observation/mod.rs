//! Observation intake for the Synheart Affect Monitor.
//!
//! Emotion classifiers (facial and vocal) are external; this module only
//! validates what they emit and turns it into typed [`Observation`]s.

pub mod feed;
pub mod ingest;
pub mod types;

// Re-export commonly used types
pub use feed::{FeedEvent, ObservationFeed};
pub use ingest::{ingest, ingest_json, IngestError, IngestOutcome, RejectReason};
pub use types::{
    parse_timestamp, EmotionLabel, Observation, ObservationError, ObservationSource,
    RawObservation,
};
