// ABOUTME: Entry point for the ghcert CLI.
// ABOUTME: Parses flags and environment, sets up logging, and runs the requested command.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use ghcert::Settings;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ghcert")]
#[command(about = "Short-lived SSH certificates signed through a GitHub repository")]
#[command(version)]
struct Cli {
    /// Show protocol-level logs on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get a new SSH certificate from GitHub
    Get(GetArgs),
}

#[derive(Args)]
struct GetArgs {
    /// Organization to use as a certificate authority
    #[arg(long, short, env = "GHCERT_ORG")]
    org: Option<String>,

    /// Repo to use as a certificate authority
    #[arg(long, short, env = "GHCERT_REPO")]
    repo: Option<String>,

    /// SSH public key to certify (e.g. ~/.ssh/id_ed25519.pub)
    #[arg(long, short, env = "GHCERT_KEY")]
    key: Option<PathBuf>,

    /// Root URL of the certificate signer (the fetch endpoint lives below it)
    #[arg(long, short, env = "GHCERT_SERVER")]
    server: Option<String>,

    /// GitHub REST API URL
    #[arg(long, env = "GHCERT_API_URL")]
    api_url: Option<String>,

    /// GitHub token (defaults to the GitHub CLI session)
    #[arg(long, env = "GH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Output file for the certificate (defaults to <key>-cert.pub next to the key)
    #[arg(long, short = 'f', visible_alias = "file")]
    output: Option<PathBuf>,

    /// Fetch attempts before giving up
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Milliseconds to wait between fetch attempts
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Path to configuration file (defaults to ~/.config/ghcert/config.toml)
    #[arg(long, short, env = "GHCERT_CONFIG")]
    config: Option<PathBuf>,
}

impl GetArgs {
    fn into_parts(self) -> (Settings, Option<PathBuf>) {
        let settings = Settings {
            org: self.org,
            repo: self.repo,
            key: self.key,
            server: self.server,
            api_url: self.api_url,
            token: self.token,
            output: self.output,
            max_attempts: self.max_attempts,
            poll_interval_ms: self.poll_interval_ms,
        };
        (settings, self.config)
    }
}

fn log_level(verbose: bool) -> tracing::Level {
    if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    ghcert_log::init_for(&["ghcert", "ghcert_ssh"], log_level(cli.verbose));

    match cli.command {
        Commands::Get(args) => {
            let (settings, config_file) = args.into_parts();
            ghcert::get::run(settings, config_file).await
        }
    }
}
