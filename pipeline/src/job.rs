//! Per-job state machine types.

use serde::{Deserialize, Serialize};

use crate::qc::QcDecision;

/// Local state of one clone job.
///
/// ```text
/// queued -> processing -> {completed, failed}
/// queued | processing -> timed_out
/// ```
///
/// `TimedOut` is synthesized locally by the supervisor once the job's poll
/// budget is exhausted; the remote job may still be running but is abandoned.
/// Terminal states are final: a terminal job is never polled again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Processing,
    Completed,
    Failed,
    TimedOut,
}

impl JobState {
    /// True for states a job never leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::TimedOut
        )
    }
}

/// Result of a completed synthesis, with its QC decision attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneResult {
    /// Opaque handle to the synthesized audio blob.
    pub audio_blob_ref: String,
    /// Measured word error rate, when the service reported one.
    pub wer: Option<f64>,
    /// Measured speaker cosine similarity, when the service reported one.
    pub speaker_cosine: Option<f64>,
    /// Local gate decision, computed once and immutable.
    pub qc_decision: QcDecision,
}

/// Terminal record of one dispatched job, written exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOutcome {
    /// Remote job id, absent when submission itself failed.
    pub job_id: Option<String>,
    /// Speaker this job replaces.
    pub speaker_label: String,
    /// Target identity the speaker was mapped to.
    pub identity_id: String,
    /// Terminal state.
    pub state: JobState,
    /// Synthesis result, present iff `state` is `Completed`.
    pub result: Option<CloneResult>,
    /// Failure reason, present for `Failed`.
    pub error: Option<String>,
    /// Number of status polls issued before reaching the terminal state.
    pub attempts: u32,
}

impl JobOutcome {
    /// True when this job's audio should be spliced into the timeline:
    /// completed and accepted by the QC gate.
    pub fn is_accepted(&self) -> bool {
        self.state == JobState::Completed
            && self
                .result
                .as_ref()
                .is_some_and(|r| r.qc_decision == QcDecision::Pass)
    }
}

#[cfg(test)]
mod job_tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!JobState::Queued.is_terminal());
        assert!(!JobState::Processing.is_terminal());
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(JobState::TimedOut.is_terminal());
    }

    #[test]
    fn acceptance_requires_completed_and_pass() {
        let mut outcome = JobOutcome {
            job_id: Some("j1".to_string()),
            speaker_label: "A".to_string(),
            identity_id: "person-1".to_string(),
            state: JobState::Completed,
            result: Some(CloneResult {
                audio_blob_ref: "blob://a".to_string(),
                wer: Some(0.05),
                speaker_cosine: Some(0.9),
                qc_decision: QcDecision::Pass,
            }),
            error: None,
            attempts: 3,
        };
        assert!(outcome.is_accepted());

        outcome.result.as_mut().unwrap().qc_decision = QcDecision::Fail;
        assert!(!outcome.is_accepted());

        outcome.state = JobState::TimedOut;
        assert!(!outcome.is_accepted());
    }
}
