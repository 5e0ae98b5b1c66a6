//! Voice-replacement orchestration.
//!
//! This crate supervises the per-speaker voice-synthesis jobs of one
//! pipeline run:
//! - [`CloneBackend`]: trait seam over the remote synthesis service
//! - [`qc::evaluate`]: deterministic accept/reject gate over QC metrics
//! - [`JobSupervisor`]: concurrent bounded polling of all dispatched jobs
//! - [`assemble`]: timeline reconstruction mixing synthesized and original
//!   audio
//! - [`RunManager`]: start/status/cancel surface for external callers
//!
//! Per-speaker failures (submission errors, remote failures, timeouts, QC
//! rejections) degrade that speaker to original audio; only input validation,
//! identity resolution, and assembly coverage errors are fatal to a run.

mod backend;
mod config;
mod error;
mod job;
pub mod qc;
mod run;
mod supervisor;
mod timeline;

pub use backend::{CloneBackend, RemoteBackend};
pub use config::{PollPolicy, RunOptions};
pub use error::{PipelineError, Result};
pub use job::{CloneResult, JobOutcome, JobState};
pub use qc::QcDecision;
pub use run::{RunId, RunManager, RunStatus};
pub use supervisor::{JobSupervisor, PipelineOutcome, RunEvent, RunJournal};
pub use timeline::{AssemblyError, AudioSource, Timeline, TimelineSegment, assemble};
