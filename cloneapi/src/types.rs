//! Wire types shared across the synthesis service API.

use serde::{Deserialize, Serialize};

/// Remote job status as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted by the service, not yet started.
    Queued,
    /// Synthesis in progress.
    Processing,
    /// Finished successfully; the status payload carries a result.
    Completed,
    /// Finished unsuccessfully; the status payload carries an error reason.
    Failed,
}

impl JobStatus {
    /// True for statuses the service will never leave.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Synthesis delivery mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisMode {
    #[default]
    Narration,
    Dialogue,
}

/// QC acceptance thresholds attached to a submission.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QcThresholds {
    /// Maximum acceptable word error rate (inclusive).
    pub max_wer: f64,
    /// Minimum acceptable speaker cosine similarity (inclusive).
    pub min_cosine: f64,
}

impl Default for QcThresholds {
    fn default() -> Self {
        // Defaults mirror the service-side gate configuration.
        Self {
            max_wer: 0.15,
            min_cosine: 0.80,
        }
    }
}

/// Acoustic/linguistic metrics measured against the reference voice.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct QcMetrics {
    /// Word error rate of the synthesized audio's transcription.
    #[serde(default)]
    pub wer: Option<f64>,
    /// Speaker-embedding cosine similarity to the reference voice.
    #[serde(default)]
    pub speaker_cosine: Option<f64>,
}

/// Provider-side QC report attached to a completed result.
///
/// The provider may include its own decision string; the pipeline recomputes
/// the decision locally from the metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QcReport {
    #[serde(default)]
    pub decision: Option<String>,
    #[serde(default)]
    pub metrics: QcMetrics,
}

/// Result payload of a completed clone job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteResult {
    /// Opaque handle to the synthesized audio blob.
    pub audio_blob_ref: String,
    /// QC report, when the service measured one.
    #[serde(default)]
    pub qc: Option<QcReport>,
}
