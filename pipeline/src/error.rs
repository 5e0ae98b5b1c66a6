//! Error types for pipeline orchestration.

use revoice_diarize::DiarizeError;

use crate::timeline::AssemblyError;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Fatal pipeline errors.
///
/// Everything here aborts the run. Per-speaker degradations (submission
/// failures, remote failures, timeouts, QC rejections) are *not* errors;
/// they are recorded in the run's [`crate::JobOutcome`] table instead.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Diarization input or mapping validation failed before dispatch.
    #[error(transparent)]
    Input(#[from] DiarizeError),

    /// The operator did not record consent for voice replacement.
    #[error("consent not given for voice replacement")]
    ConsentMissing,

    /// A target identity could not be resolved to a voice reference.
    /// Caught before any job is dispatched.
    #[error("identity {identity_id} could not be resolved: {reason}")]
    IdentityResolution {
        identity_id: String,
        reason: String,
    },

    /// The diarization segments did not tile the source duration.
    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    /// The run was not found in the run manager.
    #[error("unknown run: {0}")]
    UnknownRun(String),
}
