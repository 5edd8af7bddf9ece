//! Streaming observation feed.
//!
//! A background thread reads JSON lines from any reader (a file, a pipe from
//! the emotion classifiers, stdin) and forwards validated events over a
//! bounded channel. Each line is either an observation record or an
//! interaction marker of the form `{"interaction_at": "<timestamp>"}`.

use crate::observation::ingest::RejectReason;
use crate::observation::types::{parse_timestamp, Observation, RawObservation};
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::Deserialize;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Channel capacity between the reader thread and the consumer.
const FEED_CAPACITY: usize = 10_000;

/// An event produced by the feed.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// A validated observation
    Observation(Observation),
    /// The user actively engaged at this instant
    Interaction(DateTime<Utc>),
    /// A line that could not be used
    Rejected { line: usize, reason: RejectReason },
    /// The underlying reader reached end of input
    Closed,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeedRecord {
    Interaction { interaction_at: String },
    Observation(RawObservation),
}

/// Background reader turning JSON lines into [`FeedEvent`]s.
pub struct ObservationFeed {
    receiver: Receiver<FeedEvent>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ObservationFeed {
    /// Spawn a reader thread over `reader`.
    pub fn spawn<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (sender, receiver) = bounded(FEED_CAPACITY);
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();

        let handle = thread::spawn(move || read_lines(reader, sender, flag));

        Self {
            receiver,
            running,
            handle: Some(handle),
        }
    }

    /// Get the receiver for feed events.
    pub fn receiver(&self) -> &Receiver<FeedEvent> {
        &self.receiver
    }

    /// Check if the reader thread is still producing events.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask the reader thread to stop after its current line.
    ///
    /// A thread blocked on a read (e.g. an idle stdin) is not joined.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for ObservationFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_lines<R: BufRead>(reader: R, sender: Sender<FeedEvent>, running: Arc<AtomicBool>) {
    for (index, line) in reader.lines().enumerate() {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        let line_no = index + 1;
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::error!(error = %e, "Observation feed read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let event = parse_line(&line, line_no, Utc::now());
        if sender.send(event).is_err() {
            // Consumer hung up.
            break;
        }
    }

    running.store(false, Ordering::SeqCst);
    let _ = sender.send(FeedEvent::Closed);
}

/// Turn one input line into a feed event.
pub fn parse_line(line: &str, line_no: usize, received_at: DateTime<Utc>) -> FeedEvent {
    let rejected = |reason: RejectReason| FeedEvent::Rejected {
        line: line_no,
        reason,
    };

    match serde_json::from_str::<FeedRecord>(line) {
        Ok(FeedRecord::Interaction { interaction_at }) => match parse_timestamp(&interaction_at) {
            Ok(at) => FeedEvent::Interaction(at),
            Err(e) => rejected(e.into()),
        },
        Ok(FeedRecord::Observation(raw)) => match raw.into_observation(received_at) {
            Ok(obs) => FeedEvent::Observation(obs),
            Err(e) => rejected(e.into()),
        },
        Err(e) => rejected(RejectReason::Malformed(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::types::EmotionLabel;
    use std::io::Cursor;
    use std::time::Duration;

    #[test]
    fn test_parse_line_variants() {
        let now = Utc::now();

        match parse_line(r#"{"label": "sad", "confidence": 0.8}"#, 1, now) {
            FeedEvent::Observation(obs) => {
                assert_eq!(obs.label, Some(EmotionLabel::Sad));
                assert_eq!(obs.timestamp, now);
            }
            other => panic!("unexpected event: {other:?}"),
        }

        assert!(matches!(
            parse_line(r#"{"interaction_at": "2026-03-01T12:00:00Z"}"#, 2, now),
            FeedEvent::Interaction(_)
        ));
        assert!(matches!(
            parse_line(r#"{"interaction_at": "soon"}"#, 3, now),
            FeedEvent::Rejected { line: 3, .. }
        ));
        assert!(matches!(
            parse_line("{{{", 4, now),
            FeedEvent::Rejected {
                line: 4,
                reason: RejectReason::Malformed(_)
            }
        ));
    }

    #[test]
    fn test_feed_reads_until_closed() {
        let input = "{\"label\": \"happy\", \"confidence\": 0.9}\n\
                     \n\
                     {\"label\": \"sad\", \"confidence\": 0.9}\n";
        let feed = ObservationFeed::spawn(Cursor::new(input.to_string()));

        let mut observations = 0;
        loop {
            match feed.receiver().recv_timeout(Duration::from_secs(5)) {
                Ok(FeedEvent::Observation(_)) => observations += 1,
                Ok(FeedEvent::Closed) => break,
                Ok(other) => panic!("unexpected event: {other:?}"),
                Err(e) => panic!("feed stalled: {e}"),
            }
        }

        assert_eq!(observations, 2);
        assert!(!feed.is_running());
    }
}
