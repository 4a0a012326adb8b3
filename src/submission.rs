//! Pluggable submission backend.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::{form::FormSnapshot, scheduler::Clock};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("submission rejected: {0}")]
    Rejected(String),
    #[error("submission backend unavailable: {0}")]
    Unavailable(String),
}

/// Acknowledgement returned by a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub reference: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub snapshot: FormSnapshot,
}

pub trait Submitter {
    fn submit(&mut self, snapshot: &FormSnapshot) -> Result<SubmissionReceipt, SubmissionError>;
}

impl<F> Submitter for F
where
    F: FnMut(&FormSnapshot) -> Result<SubmissionReceipt, SubmissionError>,
{
    fn submit(&mut self, snapshot: &FormSnapshot) -> Result<SubmissionReceipt, SubmissionError> {
        self(snapshot)
    }
}

/// Accepts every submission and logs it. The artificial latency lives in
/// the controller's submission delay, not here.
#[derive(Debug, Clone, Default)]
pub struct SimulatedSubmitter<C: Clock> {
    clock: C,
    accepted: usize,
}

impl<C: Clock> SimulatedSubmitter<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, accepted: 0 }
    }

    pub fn accepted(&self) -> usize {
        self.accepted
    }
}

impl<C: Clock> Submitter for SimulatedSubmitter<C> {
    fn submit(&mut self, snapshot: &FormSnapshot) -> Result<SubmissionReceipt, SubmissionError> {
        let receipt = SubmissionReceipt {
            reference: Uuid::new_v4(),
            submitted_at: self.clock.now(),
            snapshot: snapshot.clone(),
        };
        self.accepted += 1;
        let data = serde_json::to_string(snapshot).unwrap_or_default();
        tracing::info!(reference = %receipt.reference, %data, "form submitted");
        Ok(receipt)
    }
}
