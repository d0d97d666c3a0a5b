//! Progress stream — an append-only, ordered event channel consumed by
//! UI/CLI collaborators. Emission is fire-and-forget: a slow or absent
//! consumer never blocks the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

/// The seven pipeline steps, in their fixed emission order, plus the
/// terminal `error` event for aggregation failure. Steps may be skipped on
/// early short-circuit but are never reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStep {
    Discovery,
    Selection,
    Crawl,
    Analyze,
    Grade,
    Critique,
    Complete,
    Error,
}

impl ProgressStep {
    /// Position in the fixed order; used to assert monotonicity in tests.
    pub fn order(&self) -> u8 {
        match self {
            Self::Discovery => 0,
            Self::Selection => 1,
            Self::Crawl => 2,
            Self::Analyze => 3,
            Self::Grade => 4,
            Self::Critique => 5,
            Self::Complete => 6,
            Self::Error => 7,
        }
    }
}

impl std::fmt::Display for ProgressStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discovery => write!(f, "discovery"),
            Self::Selection => write!(f, "selection"),
            Self::Crawl => write!(f, "crawl"),
            Self::Analyze => write!(f, "analyze"),
            Self::Grade => write!(f, "grade"),
            Self::Critique => write!(f, "critique"),
            Self::Complete => write!(f, "complete"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub step: ProgressStep,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Sending half of the progress stream. Cloneable; `emit` never fails and
/// never blocks, even when the receiver is gone.
#[derive(Clone)]
pub struct ProgressSender {
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl ProgressSender {
    /// Create a connected sender/receiver pair.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sender with no consumer; every emit is dropped.
    pub fn noop() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, step: ProgressStep, message: impl Into<String>) {
        let event = ProgressEvent {
            step,
            message: message.into(),
            timestamp: Utc::now(),
        };
        debug!(step = %event.step, message = %event.message, "progress");
        if let Some(ref tx) = self.tx {
            // Receiver may have been dropped; that must not fail the run.
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_arrive_in_emission_order() {
        let (sender, mut rx) = ProgressSender::channel();
        sender.emit(ProgressStep::Discovery, "found 12 pages");
        sender.emit(ProgressStep::Selection, "selected 5");
        sender.emit(ProgressStep::Complete, "done");
        drop(sender);

        let mut steps = Vec::new();
        while let Some(event) = rx.recv().await {
            steps.push(event.step);
        }
        assert_eq!(
            steps,
            vec![
                ProgressStep::Discovery,
                ProgressStep::Selection,
                ProgressStep::Complete
            ]
        );
        assert!(steps.windows(2).all(|w| w[0].order() < w[1].order()));
    }

    #[tokio::test]
    async fn dropped_receiver_never_blocks() {
        let (sender, rx) = ProgressSender::channel();
        drop(rx);
        // Must not panic or block
        sender.emit(ProgressStep::Crawl, "crawling");
    }

    #[test]
    fn noop_sender_is_silent() {
        ProgressSender::noop().emit(ProgressStep::Analyze, "ignored");
    }
}
