//! Synthesis backend seam.

use async_trait::async_trait;

use revoice_cloneapi::{Client, CloneJobRequest, JobStatusResponse};

/// Interface to the remote synthesis service, as the supervisor sees it.
///
/// The supervisor only needs three calls: resolve an identity to a voice
/// reference, submit one job, and poll one job. Tests substitute a scripted
/// mock here.
#[async_trait]
pub trait CloneBackend: Send + Sync {
    /// Resolves a target identity into the voice reference required by
    /// submission.
    async fn resolve_voice(&self, identity_id: &str) -> revoice_cloneapi::Result<String>;

    /// Submits one synthesis job; returns the remote job id.
    async fn submit(&self, request: &CloneJobRequest) -> revoice_cloneapi::Result<String>;

    /// Polls the status of one submitted job.
    async fn poll(&self, job_id: &str) -> revoice_cloneapi::Result<JobStatusResponse>;
}

/// Production backend over the [`revoice_cloneapi::Client`].
pub struct RemoteBackend {
    client: Client,
}

impl RemoteBackend {
    /// Wraps a configured API client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CloneBackend for RemoteBackend {
    async fn resolve_voice(&self, identity_id: &str) -> revoice_cloneapi::Result<String> {
        let resolved = self.client.identities().resolve(identity_id).await?;
        Ok(resolved.voice_ref)
    }

    async fn submit(&self, request: &CloneJobRequest) -> revoice_cloneapi::Result<String> {
        let handle = self.client.jobs().submit(request).await?;
        Ok(handle.job_id)
    }

    async fn poll(&self, job_id: &str) -> revoice_cloneapi::Result<JobStatusResponse> {
        self.client.jobs().status(job_id).await
    }
}
