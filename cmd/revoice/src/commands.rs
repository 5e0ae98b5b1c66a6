//! Subcommand implementations.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use revoice_cloneapi::{Client, QcThresholds, SynthesisMode};
use revoice_diarize::{IdentityMapper, RawDiarization, SegmentStore, SpeakerTarget};
use revoice_pipeline::{JobSupervisor, PollPolicy, RemoteBackend, RunJournal, RunOptions};

use crate::Cli;

/// Arguments for `revoice run`.
#[derive(Args)]
pub struct RunArgs {
    /// Diarization output JSON ({"segments": [...]})
    #[arg(long)]
    pub segments: PathBuf,

    /// Speaker mapping JSON ({"SPEAKER_00": "identity-id", "SPEAKER_01": null})
    #[arg(long)]
    pub mapping: PathBuf,

    /// Reference to the source media track used for original-audio fallback
    #[arg(long)]
    pub source_ref: String,

    /// Poll interval in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub interval_ms: u64,

    /// Maximum status polls per job
    #[arg(long, default_value_t = 40)]
    pub max_attempts: u32,

    /// Maximum acceptable word error rate
    #[arg(long, default_value_t = 0.15)]
    pub max_wer: f64,

    /// Minimum acceptable speaker cosine similarity
    #[arg(long, default_value_t = 0.80)]
    pub min_cosine: f64,

    /// Synthesize as dialogue instead of narration
    #[arg(long)]
    pub dialogue: bool,

    /// Confirm that consent was recorded for every replaced voice
    #[arg(long)]
    pub consent: bool,
}

/// Arguments for `revoice resolve`.
#[derive(Args)]
pub struct ResolveArgs {
    /// Target identity id
    pub identity_id: String,
}

/// Builds the API client from global flags.
pub fn client(cli: &Cli) -> anyhow::Result<Client> {
    let base_url = cli
        .base_url
        .clone()
        .context("missing --base-url (or REVOICE_BASE_URL)")?;
    let api_key = cli
        .api_key
        .clone()
        .context("missing --api-key (or REVOICE_API_KEY)")?;
    Ok(Client::new(base_url, api_key)?)
}

pub async fn run(client: Client, args: &RunArgs) -> anyhow::Result<()> {
    let raw: RawDiarization = serde_json::from_str(
        &std::fs::read_to_string(&args.segments)
            .with_context(|| format!("reading {}", args.segments.display()))?,
    )
    .context("parsing diarization output")?;
    let store = SegmentStore::ingest(raw)?;

    let partial: BTreeMap<String, SpeakerTarget> = serde_json::from_str(
        &std::fs::read_to_string(&args.mapping)
            .with_context(|| format!("reading {}", args.mapping.display()))?,
    )
    .context("parsing speaker mapping")?;
    let mapping = IdentityMapper::resolve(&store, &partial)?;

    info!(
        speakers = store.distinct_speakers().len(),
        replaced = mapping.replaced_speakers().count(),
        duration = store.duration(),
        "starting pipeline run"
    );

    let options = RunOptions {
        poll: PollPolicy {
            interval: Duration::from_millis(args.interval_ms),
            max_attempts: args.max_attempts,
            ..PollPolicy::default()
        },
        thresholds: QcThresholds {
            max_wer: args.max_wer,
            min_cosine: args.min_cosine,
        },
        mode: if args.dialogue {
            SynthesisMode::Dialogue
        } else {
            SynthesisMode::Narration
        },
        consent: args.consent,
        ..RunOptions::default()
    };

    let supervisor = JobSupervisor::new(Arc::new(RemoteBackend::new(client)), options);
    let journal = Arc::new(RunJournal::new());
    let cancel = CancellationToken::new();

    // Ctrl-C cancels the run: outstanding polls stop and no timeline is
    // produced.
    let ctrlc_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling run");
            ctrlc_cancel.cancel();
        }
    });

    let outcome = supervisor
        .run(&store, &mapping, &args.source_ref, journal, cancel)
        .await?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

pub async fn voices(client: Client) -> anyhow::Result<()> {
    let voices = client.identities().voices().await?;
    println!("{}", serde_json::to_string_pretty(&voices)?);
    Ok(())
}

pub async fn resolve(client: Client, args: &ResolveArgs) -> anyhow::Result<()> {
    let resolved = client.identities().resolve(&args.identity_id).await?;
    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}
