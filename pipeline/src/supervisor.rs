//! Concurrent job supervision.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use revoice_cloneapi::{CloneJobRequest, JobStatus};
use revoice_diarize::{SegmentStore, SpeakerMapping};

use crate::{
    backend::CloneBackend,
    config::RunOptions,
    error::{PipelineError, Result},
    job::{CloneResult, JobOutcome, JobState},
    qc,
    timeline::{Timeline, assemble},
};

/// One entry in a run's event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEvent {
    /// Monotonic sequence number within the run.
    pub seq: u64,
    /// Pipeline stage that produced the event.
    pub stage: String,
    pub message: String,
}

/// Shared, observable state of one run.
///
/// The journal is the only mutable state shared between the per-job tasks
/// and status readers. Job states are updated on transitions; each outcome
/// is written exactly once, at the terminal transition. Readers never block
/// writers of unrelated jobs.
#[derive(Default)]
pub struct RunJournal {
    states: RwLock<BTreeMap<String, JobState>>,
    outcomes: RwLock<BTreeMap<String, JobOutcome>>,
    events: RwLock<Vec<RunEvent>>,
}

impl RunJournal {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_state(&self, speaker: &str, state: JobState) {
        self.states.write().insert(speaker.to_string(), state);
    }

    fn record_outcome(&self, outcome: JobOutcome) {
        self.set_state(&outcome.speaker_label, outcome.state);
        let mut outcomes = self.outcomes.write();
        debug_assert!(
            !outcomes.contains_key(&outcome.speaker_label),
            "terminal outcome written twice for {}",
            outcome.speaker_label
        );
        outcomes.insert(outcome.speaker_label.clone(), outcome);
    }

    fn event(&self, stage: &str, message: impl Into<String>) {
        // Sequence numbers come from the log length under the same write
        // lock as the push, so events land in seq order.
        let mut events = self.events.write();
        let seq = events.len() as u64;
        events.push(RunEvent {
            seq,
            stage: stage.to_string(),
            message: message.into(),
        });
    }

    /// Current state of every dispatched job.
    pub fn job_states(&self) -> BTreeMap<String, JobState> {
        self.states.read().clone()
    }

    /// Terminal outcomes recorded so far.
    pub fn outcomes(&self) -> BTreeMap<String, JobOutcome> {
        self.outcomes.read().clone()
    }

    /// Event log so far.
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.read().clone()
    }
}

/// Final result of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PipelineOutcome {
    /// Every dispatched job reached a terminal state and the timeline was
    /// assembled. Speakers whose jobs failed, timed out, or were rejected by
    /// QC fall back to original audio inside the timeline.
    Completed {
        jobs: BTreeMap<String, JobOutcome>,
        timeline: Timeline,
    },
    /// The run was cancelled; no timeline is produced.
    Cancelled {
        jobs: BTreeMap<String, JobOutcome>,
    },
}

/// Drives all clone jobs of one run to a terminal state.
pub struct JobSupervisor {
    backend: Arc<dyn CloneBackend>,
    options: RunOptions,
}

impl JobSupervisor {
    pub fn new(backend: Arc<dyn CloneBackend>, options: RunOptions) -> Self {
        Self { backend, options }
    }

    /// Runs the pipeline: dispatch one job per mapped speaker, poll them all
    /// concurrently under the run's poll policy, then assemble the timeline.
    ///
    /// Returns an error only for fatal conditions: missing consent,
    /// unresolvable identities (caught before any dispatch), or an assembly
    /// coverage violation. Everything else degrades per speaker.
    pub async fn run(
        &self,
        store: &SegmentStore,
        mapping: &SpeakerMapping,
        source_ref: &str,
        journal: Arc<RunJournal>,
        cancel: CancellationToken,
    ) -> Result<PipelineOutcome> {
        if !self.options.consent {
            return Err(PipelineError::ConsentMissing);
        }

        // Resolve every target identity up front so an unresolvable
        // reference aborts the run before any remote job exists.
        let mut dispatches = Vec::new();
        for (label, identity_id) in mapping.replaced_speakers() {
            let voice_ref = self.backend.resolve_voice(identity_id).await.map_err(|e| {
                PipelineError::IdentityResolution {
                    identity_id: identity_id.clone(),
                    reason: e.to_string(),
                }
            })?;
            dispatches.push(Dispatch {
                speaker_label: label.clone(),
                identity_id: identity_id.clone(),
                voice_ref,
                text: store.transcript_for(label),
            });
        }

        journal.event(
            "dispatch",
            format!("dispatching {} clone job(s)", dispatches.len()),
        );

        let mut tasks = Vec::with_capacity(dispatches.len());
        for dispatch in dispatches {
            let backend = self.backend.clone();
            let options = self.options.clone();
            let journal = journal.clone();
            let cancel = cancel.clone();
            tasks.push(tokio::spawn(async move {
                drive_job(backend, options, dispatch, journal, cancel).await;
            }));
        }

        for task in tasks {
            // Per-job tasks never panic in normal operation; a panic here is
            // a bug worth surfacing loudly.
            if let Err(e) = task.await {
                warn!(error = %e, "clone job task aborted");
            }
        }

        let jobs = journal.outcomes();

        if cancel.is_cancelled() {
            journal.event("cancel", "run cancelled; timeline suppressed");
            info!(jobs = jobs.len(), "pipeline run cancelled");
            return Ok(PipelineOutcome::Cancelled { jobs });
        }

        journal.event("assemble", "all jobs terminal; assembling timeline");
        let timeline = assemble(store, mapping, &jobs, source_ref)?;

        info!(
            jobs = jobs.len(),
            accepted = jobs.values().filter(|o| o.is_accepted()).count(),
            "pipeline run complete"
        );

        Ok(PipelineOutcome::Completed { jobs, timeline })
    }
}

struct Dispatch {
    speaker_label: String,
    identity_id: String,
    voice_ref: String,
    text: Option<String>,
}

/// Drives one clone job from submission to its terminal state.
///
/// The poll budget starts at this job's own submission, so a speaker
/// dispatched later is not penalized by an earlier speaker's slow start.
/// The terminal outcome is written to the journal exactly once.
async fn drive_job(
    backend: Arc<dyn CloneBackend>,
    options: RunOptions,
    dispatch: Dispatch,
    journal: Arc<RunJournal>,
    cancel: CancellationToken,
) {
    let mut dispatch = dispatch;
    let label = dispatch.speaker_label.clone();
    let requested_text = dispatch.text.take();

    let fail = |reason: String, job_id: Option<String>, attempts: u32| JobOutcome {
        job_id,
        speaker_label: dispatch.speaker_label.clone(),
        identity_id: dispatch.identity_id.clone(),
        state: JobState::Failed,
        result: None,
        error: Some(reason),
        attempts,
    };

    // Policy guard, mirroring the service-side limits: nothing to
    // synthesize or text over the per-job limit fails this job only.
    let text = match requested_text {
        Some(t) if t.chars().count() <= options.max_text_length => t,
        Some(_) => {
            journal.event("policy", format!("{label}: request text too long"));
            journal.record_outcome(fail("request text exceeds length limit".to_string(), None, 0));
            return;
        }
        None => {
            journal.event("policy", format!("{label}: no transcript to synthesize"));
            journal.record_outcome(fail("no transcript to synthesize".to_string(), None, 0));
            return;
        }
    };

    let request = CloneJobRequest {
        text,
        voice_ref: dispatch.voice_ref.clone(),
        mode: options.mode,
        qc_thresholds: options.thresholds,
    };

    let job_id = match backend.submit(&request).await {
        Ok(id) => id,
        Err(e) => {
            warn!(speaker = %label, error = %e, "clone job submission failed");
            journal.event("submit", format!("{label}: submission failed: {e}"));
            journal.record_outcome(fail(format!("submission failed: {e}"), None, 0));
            return;
        }
    };

    debug!(speaker = %label, job_id = %job_id, "clone job submitted");
    journal.event("submit", format!("{label}: submitted as {job_id}"));
    journal.set_state(&label, JobState::Queued);

    for attempt in 1..=options.poll.max_attempts {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(options.poll.interval_for(attempt)) => {}
        }

        let response = tokio::select! {
            // An in-flight poll is allowed to finish remotely; its response
            // is simply discarded.
            _ = cancel.cancelled() => return,
            r = backend.poll(&job_id) => r,
        };

        let snapshot = match response {
            Ok(s) => s,
            Err(e) => {
                // Transient poll failure burns an attempt; the deadline
                // still bounds the job.
                warn!(speaker = %label, job_id = %job_id, error = %e, "status poll failed");
                continue;
            }
        };

        match snapshot.status {
            JobStatus::Queued => {}
            JobStatus::Processing => {
                journal.set_state(&label, JobState::Processing);
            }
            JobStatus::Completed => {
                let outcome = completed_outcome(&dispatch, &options, job_id, snapshot, attempt);
                journal.event(
                    "qc",
                    format!(
                        "{label}: completed, qc {}",
                        match outcome.result.as_ref().map(|r| r.qc_decision) {
                            Some(crate::qc::QcDecision::Pass) => "pass",
                            _ => "fail",
                        }
                    ),
                );
                journal.record_outcome(outcome);
                return;
            }
            JobStatus::Failed => {
                let reason = snapshot
                    .error
                    .unwrap_or_else(|| "unknown remote failure".to_string());
                journal.event("poll", format!("{label}: remote failure: {reason}"));
                journal.record_outcome(fail(reason, Some(job_id), attempt));
                return;
            }
        }
    }

    // Poll budget exhausted: abandon locally. The remote job may still be
    // running but nothing will poll it again.
    journal.event("timeout", format!("{label}: deadline elapsed, abandoning"));
    journal.record_outcome(JobOutcome {
        job_id: Some(job_id),
        speaker_label: dispatch.speaker_label,
        identity_id: dispatch.identity_id,
        state: JobState::TimedOut,
        result: None,
        error: None,
        attempts: options.poll.max_attempts,
    });
}

fn completed_outcome(
    dispatch: &Dispatch,
    options: &RunOptions,
    job_id: String,
    snapshot: revoice_cloneapi::JobStatusResponse,
    attempts: u32,
) -> JobOutcome {
    let result = snapshot.result.map(|r| {
        let metrics = r.qc.map(|q| q.metrics).unwrap_or_default();
        CloneResult {
            audio_blob_ref: r.audio_blob_ref,
            wer: metrics.wer,
            speaker_cosine: metrics.speaker_cosine,
            qc_decision: qc::evaluate(&metrics, &options.thresholds),
        }
    });

    match result {
        Some(result) => JobOutcome {
            job_id: Some(job_id),
            speaker_label: dispatch.speaker_label.clone(),
            identity_id: dispatch.identity_id.clone(),
            state: JobState::Completed,
            result: Some(result),
            error: None,
            attempts,
        },
        // Completed without a result payload violates the status contract;
        // treat it as a failure rather than accepting unverifiable audio.
        None => JobOutcome {
            job_id: Some(job_id),
            speaker_label: dispatch.speaker_label.clone(),
            identity_id: dispatch.identity_id.clone(),
            state: JobState::Failed,
            result: None,
            error: Some("completed status carried no result".to_string()),
            attempts,
        },
    }
}
