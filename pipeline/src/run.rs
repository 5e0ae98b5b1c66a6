//! Run registry: start, observe, and cancel pipeline runs.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

use revoice_diarize::{IdentityMapper, SegmentStore, SpeakerTarget};

use crate::{
    backend::CloneBackend,
    config::RunOptions,
    error::{PipelineError, Result},
    job::JobState,
    supervisor::{JobSupervisor, PipelineOutcome, RunEvent, RunJournal},
};

/// Identifier of one pipeline run.
pub type RunId = String;

/// Observable status of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    /// Jobs are still being supervised.
    InProgress {
        jobs: BTreeMap<String, JobState>,
        events: Vec<RunEvent>,
    },
    /// The run finished with a definite outcome.
    Finished { outcome: PipelineOutcome },
    /// The run aborted with a fatal error.
    Failed { error: String },
}

struct RunHandle {
    cancel: CancellationToken,
    journal: Arc<RunJournal>,
    // Set exactly once when the supervisor task finishes.
    terminal: Arc<RwLock<Option<RunStatus>>>,
}

/// Registry of pipeline runs.
///
/// This is the surface external collaborators (CLI, HTTP layer) drive:
/// `start_run`, `run_status`, `cancel_run`. Each run owns its jobs until
/// they are terminal; cancellation stops all outstanding polling and
/// suppresses timeline assembly.
pub struct RunManager {
    backend: Arc<dyn CloneBackend>,
    runs: Arc<RwLock<HashMap<RunId, Arc<RunHandle>>>>,
}

impl RunManager {
    pub fn new(backend: Arc<dyn CloneBackend>) -> Self {
        Self {
            backend,
            runs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Validates inputs and starts a supervised run.
    ///
    /// Input errors (malformed store handled at ingest, unknown speakers in
    /// the partial mapping) surface here, before anything is dispatched.
    pub fn start_run(
        &self,
        store: SegmentStore,
        partial_mapping: &BTreeMap<String, SpeakerTarget>,
        source_ref: impl Into<String>,
        options: RunOptions,
    ) -> Result<RunId> {
        let mapping = IdentityMapper::resolve(&store, partial_mapping)?;

        let run_id: RunId = Uuid::new_v4().to_string();
        let source_ref = source_ref.into();
        let handle = Arc::new(RunHandle {
            cancel: CancellationToken::new(),
            journal: Arc::new(RunJournal::new()),
            terminal: Arc::new(RwLock::new(None)),
        });

        self.runs.write().insert(run_id.clone(), handle.clone());

        let supervisor = JobSupervisor::new(self.backend.clone(), options);
        let task_run_id = run_id.clone();
        tokio::spawn(async move {
            info!(run_id = %task_run_id, "pipeline run started");
            let result = supervisor
                .run(
                    &store,
                    &mapping,
                    &source_ref,
                    handle.journal.clone(),
                    handle.cancel.clone(),
                )
                .await;

            let status = match result {
                Ok(outcome) => RunStatus::Finished { outcome },
                Err(e) => {
                    error!(run_id = %task_run_id, error = %e, "pipeline run failed");
                    RunStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            *handle.terminal.write() = Some(status);
        });

        Ok(run_id)
    }

    /// Returns the current status of a run.
    pub fn run_status(&self, run_id: &str) -> Result<RunStatus> {
        let handle = self
            .runs
            .read()
            .get(run_id)
            .cloned()
            .ok_or_else(|| PipelineError::UnknownRun(run_id.to_string()))?;

        if let Some(status) = handle.terminal.read().clone() {
            return Ok(status);
        }

        Ok(RunStatus::InProgress {
            jobs: handle.journal.job_states(),
            events: handle.journal.events(),
        })
    }

    /// Cancels a run: no further polls are issued for its jobs and no
    /// timeline is assembled.
    pub fn cancel_run(&self, run_id: &str) -> Result<()> {
        let handle = self
            .runs
            .read()
            .get(run_id)
            .cloned()
            .ok_or_else(|| PipelineError::UnknownRun(run_id.to_string()))?;

        info!(run_id, "cancelling pipeline run");
        handle.cancel.cancel();
        Ok(())
    }
}
