//! Client SDK for the remote voice-synthesis service.
//!
//! This crate provides a typed client for the service endpoints the
//! orchestration pipeline consumes:
//! - clone-job submission and status polling ([`JobService`])
//! - identity-to-voice resolution and voice listing ([`IdentityService`])
//!
//! # Example
//!
//! ```rust,no_run
//! use revoice_cloneapi::{Client, CloneJobRequest, QcThresholds, SynthesisMode};
//!
//! # async fn example() -> revoice_cloneapi::Result<()> {
//! let client = Client::new("https://synth.example.com", "api-key")?;
//!
//! let handle = client.jobs().submit(&CloneJobRequest {
//!     text: "Hello there".to_string(),
//!     voice_ref: "voice-abc".to_string(),
//!     mode: SynthesisMode::Narration,
//!     qc_thresholds: QcThresholds { max_wer: 0.15, min_cosine: 0.80 },
//! }).await?;
//!
//! let status = client.jobs().status(&handle.job_id).await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
pub mod http;
mod identity;
mod jobs;
mod types;

pub use client::{Client, ClientBuilder, DEFAULT_MAX_RETRIES};
pub use error::{Error, Result};
pub use identity::{IdentityService, ResolvedVoice, VoiceInfo};
pub use jobs::{CloneJobRequest, JobHandle, JobService, JobStatusResponse};
pub use types::{JobStatus, QcMetrics, QcReport, QcThresholds, RemoteResult, SynthesisMode};
