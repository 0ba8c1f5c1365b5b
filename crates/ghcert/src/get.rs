// ABOUTME: The `ghcert get` command: wires config, credentials and clients into one transaction.
// ABOUTME: Prints step-by-step progress and installs a Ctrl-C handler that cancels polling.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use crate::auth::resolve_token;
use crate::config::{detect_repository, Config, Settings};
use crate::fetch::SignerClient;
use crate::github::GithubClient;
use crate::transaction::{CertificateIssuer, Stage};

const STEPS: u32 = 5;

pub async fn run(flags: Settings, config_file: Option<PathBuf>) -> Result<()> {
    let file = Settings::load_file(config_file.as_deref())?;
    let settings = file.merge(flags).with_detected_repository(detect_repository);
    let config = Config::from_settings(settings)?;
    tracing::debug!(?config, "resolved configuration");

    let token = resolve_token(config.token.as_deref(), &config.api_url)?;
    let github = GithubClient::new(&config.api_url, token)?;
    let signer = SignerClient::new(&config.server_url)?;
    let issuer = CertificateIssuer::new(github.clone(), github, signer, config.poll);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let output = config.certificate_path();

    println!("{}", "GitHub SSH Certificate".bold());
    println!();

    let issued = issuer
        .issue_with_progress(
            &config.repository,
            &config.key_path,
            &output,
            &cancel,
            print_stage,
        )
        .await
        .context("Could not get a certificate")?;

    println!();
    println!("{}", "Certificate issued!".green().bold());
    println!();
    println!("  Key:         {} ({})", issued.key_title, issued.fingerprint.dimmed());
    println!("  Certificate: {}", issued.path.display());
    println!();

    Ok(())
}

fn print_stage(stage: Stage<'_>) {
    match stage {
        Stage::ReadingKey { path } => {
            println!("{} Reading SSH key from {}...", step(1), path.display());
        }
        Stage::ListingKeys { fingerprint } => {
            println!("  Fingerprint: {}", fingerprint.dimmed());
            println!(
                "{} Checking the key is registered on your GitHub profile...",
                step(2)
            );
        }
        Stage::KeyMatched { title } => {
            println!("  Registered as: {}", title.cyan());
        }
        Stage::Dispatching { repository } => {
            println!("{} Requesting certificate to {}...", step(3), repository);
        }
        Stage::Polling { max_attempts } => {
            println!(
                "{} Fetching certificate (up to {} attempts)...",
                step(4),
                max_attempts
            );
        }
        Stage::Writing { path } => {
            println!("{} Writing certificate to {}...", step(5), path.display());
        }
    }
}

fn step(n: u32) -> colored::ColoredString {
    format!("[{}/{}]", n, STEPS).dimmed()
}
