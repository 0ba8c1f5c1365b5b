// ABOUTME: Resolves the GitHub bearer credential for the current user.
// ABOUTME: Explicit token first, then GITHUB_TOKEN, then the GitHub CLI session.

use crate::error::{CertError, Result};
use tracing::debug;
use url::Url;

/// Find a GitHub token. `explicit` comes from flags, `GH_TOKEN` or the config file.
/// The CLI session is asked for the host that serves `api_url`.
///
/// # Errors
/// `Authentication` when no source yields a token.
pub fn resolve_token(explicit: Option<&str>, api_url: &Url) -> Result<String> {
    resolve_token_with(explicit, || {
        std::env::var("GITHUB_TOKEN")
            .ok()
            .or_else(|| gh_cli_token(gh_hostname(api_url).as_deref()))
    })
}

/// Like [`resolve_token`] with a caller-supplied fallback source.
pub fn resolve_token_with(
    explicit: Option<&str>,
    fallback: impl FnOnce() -> Option<String>,
) -> Result<String> {
    let token = explicit
        .map(str::to_string)
        .filter(|t| !t.trim().is_empty())
        .or_else(|| fallback().filter(|t| !t.trim().is_empty()));

    token.map(|t| t.trim().to_string()).ok_or_else(|| {
        CertError::Authentication(
            "no GitHub credential found. Set GH_TOKEN or run `gh auth login`".to_string(),
        )
    })
}

/// Host name the GitHub CLI knows the API at `api_url` by. `None` means
/// github.com, the CLI's own default.
///
/// `api.github.com` and `api.<tenant>.ghe.com` drop their `api.` label;
/// Enterprise Server serves its API from the web host under `/api/v3`.
fn gh_hostname(api_url: &Url) -> Option<String> {
    let host = api_url.host_str()?;
    if host == "api.github.com" || host == "github.com" {
        return None;
    }
    let host = match host.strip_prefix("api.") {
        Some(rest) if rest.ends_with(".ghe.com") => rest,
        _ => host,
    };
    Some(match api_url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Token of the GitHub CLI's logged-in session, if there is one.
fn gh_cli_token(hostname: Option<&str>) -> Option<String> {
    let mut command = std::process::Command::new("gh");
    command.args(["auth", "token"]);
    if let Some(hostname) = hostname {
        command.args(["--hostname", hostname]);
    }
    let output = command.output().ok()?;
    if !output.status.success() {
        debug!("gh auth token failed; no CLI session");
        return None;
    }
    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!token.is_empty()).then_some(token)
}
