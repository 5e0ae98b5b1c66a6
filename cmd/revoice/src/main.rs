//! revoice CLI - drive the voice-replacement pipeline from the command line.

use clap::{Parser, Subcommand};

mod commands;

use commands::{ResolveArgs, RunArgs};

/// revoice - multi-speaker voice replacement.
///
/// Takes diarization output for a source media file plus an operator mapping
/// from detected speakers to target identities, supervises one remote
/// voice-synthesis job per mapped speaker, and prints the assembled timeline.
#[derive(Parser)]
#[command(name = "revoice")]
#[command(about = "Multi-speaker voice-replacement pipeline")]
#[command(version)]
pub struct Cli {
    /// Base URL of the voice-synthesis service
    #[arg(long, global = true, env = "REVOICE_BASE_URL")]
    pub base_url: Option<String>,

    /// API key for the voice-synthesis service
    #[arg(long, global = true, env = "REVOICE_API_KEY")]
    pub api_key: Option<String>,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the replacement pipeline on a diarized source
    Run(RunArgs),
    /// List voices known to the synthesis service
    Voices,
    /// Resolve a target identity into its voice reference
    Resolve(ResolveArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let client = commands::client(&cli)?;

    match &cli.command {
        Commands::Run(args) => commands::run(client, args).await,
        Commands::Voices => commands::voices(client).await,
        Commands::Resolve(args) => commands::resolve(client, args).await,
    }
}
