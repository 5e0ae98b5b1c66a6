//! Clone-job submission and status polling.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    http::HttpClient,
    types::{JobStatus, QcThresholds, RemoteResult, SynthesisMode},
};

/// Clone-job service: submit one synthesis request and poll its status.
pub struct JobService {
    http: Arc<HttpClient>,
}

impl JobService {
    pub(crate) fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Submits one voice-synthesis request.
    ///
    /// A successful acknowledgment means the remote job is `queued`; the
    /// caller polls [`JobService::status`] until a terminal status appears.
    pub async fn submit(&self, request: &CloneJobRequest) -> Result<JobHandle> {
        #[derive(Deserialize)]
        struct Response {
            job_id: String,
        }

        let resp: Response = self
            .http
            .request("POST", "/v1/clone_jobs", Some(request))
            .await?;

        Ok(JobHandle {
            job_id: resp.job_id,
        })
    }

    /// Queries the current status of a submitted job.
    pub async fn status(&self, job_id: &str) -> Result<JobStatusResponse> {
        let path = format!("/v1/clone_jobs/{}", job_id);
        self.http.request::<(), _>("GET", &path, None).await
    }
}

/// Request to synthesize one speaker's lines with a trained voice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneJobRequest {
    /// Text to synthesize.
    pub text: String,
    /// Reference to the trained voice to synthesize with.
    pub voice_ref: String,
    /// Delivery mode.
    #[serde(default)]
    pub mode: SynthesisMode,
    /// QC gates the service should measure against.
    pub qc_thresholds: QcThresholds,
}

/// Handle to a submitted job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_id: String,
}

/// Status payload for one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    /// Current remote status.
    pub status: JobStatus,
    /// Result, present once `status` is `completed`.
    #[serde(default)]
    pub result: Option<RemoteResult>,
    /// Failure reason, present once `status` is `failed`.
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod jobs_tests {
    use super::*;

    #[test]
    fn status_response_parses_all_phases() {
        let queued: JobStatusResponse = serde_json::from_str(r#"{"status":"queued"}"#).unwrap();
        assert_eq!(queued.status, JobStatus::Queued);
        assert!(queued.result.is_none());

        let completed: JobStatusResponse = serde_json::from_str(
            r#"{
                "status": "completed",
                "result": {
                    "audio_blob_ref": "blob://out/7",
                    "qc": {"decision": "pass", "metrics": {"wer": 0.06, "speaker_cosine": 0.88}}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(completed.status, JobStatus::Completed);
        let result = completed.result.unwrap();
        assert_eq!(result.audio_blob_ref, "blob://out/7");
        assert_eq!(result.qc.unwrap().metrics.speaker_cosine, Some(0.88));

        let failed: JobStatusResponse =
            serde_json::from_str(r#"{"status":"failed","error":"voice not trained"}"#).unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("voice not trained"));
    }

    #[test]
    fn request_serializes_thresholds() {
        let req = CloneJobRequest {
            text: "hi".to_string(),
            voice_ref: "voice-1".to_string(),
            mode: SynthesisMode::Dialogue,
            qc_thresholds: QcThresholds {
                max_wer: 0.2,
                min_cosine: 0.78,
            },
        };
        let v: serde_json::Value = serde_json::to_value(&req).unwrap();
        assert_eq!(v["mode"], "dialogue");
        assert_eq!(v["qc_thresholds"]["max_wer"], 0.2);
    }
}
