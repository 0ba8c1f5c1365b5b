// ABOUTME: Configuration for a certificate transaction.
// ABOUTME: Merges config file, environment, and flags into one validated Config passed to the core.

use crate::error::{CertError, Result};
use crate::poller::{PollPolicy, DEFAULT_MAX_ATTEMPTS};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default GitHub REST API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Raw, possibly incomplete settings from one source (file or flags).
#[derive(Default, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct Settings {
    /// Organization that hosts the signer repository.
    pub org: Option<String>,
    /// Repository whose workflow signs certificates.
    pub repo: Option<String>,
    /// Public key to certify.
    pub key: Option<PathBuf>,
    /// Root URL of the signer's fetch service.
    pub server: Option<String>,
    pub api_url: Option<String>,
    pub token: Option<String>,
    /// Overrides the derived `-cert.pub` path.
    pub output: Option<PathBuf>,
    pub max_attempts: Option<u32>,
    pub poll_interval_ms: Option<u64>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("org", &self.org)
            .field("repo", &self.repo)
            .field("key", &self.key)
            .field("server", &self.server)
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("output", &self.output)
            .field("max_attempts", &self.max_attempts)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .finish()
    }
}

impl Settings {
    /// Load settings from `path`, or from the default location if present.
    ///
    /// An explicitly named file must exist. A missing default file yields
    /// empty settings.
    pub fn load_file(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };

        debug!(path = %path.display(), "loading config file");
        let contents = std::fs::read_to_string(&path).map_err(|e| {
            CertError::Configuration(format!(
                "failed to read config from {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&contents).map_err(|e| match e {
            CertError::Configuration(msg) => {
                CertError::Configuration(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Parse TOML settings.
    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| CertError::Configuration(format!("failed to parse config: {}", e)))
    }

    /// Layer `higher` over `self`; any value set in `higher` wins.
    pub fn merge(self, higher: Settings) -> Settings {
        Settings {
            org: higher.org.or(self.org),
            repo: higher.repo.or(self.repo),
            key: higher.key.or(self.key),
            server: higher.server.or(self.server),
            api_url: higher.api_url.or(self.api_url),
            token: higher.token.or(self.token),
            output: higher.output.or(self.output),
            max_attempts: higher.max_attempts.or(self.max_attempts),
            poll_interval_ms: higher.poll_interval_ms.or(self.poll_interval_ms),
        }
    }

    /// Fill org and repo from the current checkout when neither was given.
    pub fn with_detected_repository(mut self, detect: impl FnOnce() -> Option<Repository>) -> Self {
        if self.org.is_none() && self.repo.is_none() {
            if let Some(detected) = detect() {
                debug!(repository = %detected, "using repository of current checkout");
                self.org = Some(detected.org);
                self.repo = Some(detected.repo);
            }
        }
        self
    }
}

/// `org/repo` pair addressing the signer repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub org: String,
    pub repo: String,
}

impl Repository {
    pub fn new(org: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.org, self.repo)
    }
}

/// Validated configuration, built once and passed by reference.
#[derive(Clone)]
pub struct Config {
    pub repository: Repository,
    pub key_path: PathBuf,
    pub server_url: Url,
    pub api_url: Url,
    pub token: Option<String>,
    pub output: Option<PathBuf>,
    pub poll: PollPolicy,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("repository", &self.repository)
            .field("key_path", &self.key_path)
            .field("server_url", &self.server_url.as_str())
            .field("api_url", &self.api_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("output", &self.output)
            .field("poll", &self.poll)
            .finish()
    }
}

impl Config {
    /// Validate merged settings. All missing required values are reported
    /// together.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let org = non_empty(settings.org);
        let repo = non_empty(settings.repo);
        let server = non_empty(settings.server);
        let key = settings.key.filter(|p| !p.as_os_str().is_empty());

        let missing: Vec<&str> = [
            ("org", org.is_none()),
            ("repo", repo.is_none()),
            ("key", key.is_none()),
            ("server", server.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        let (Some(org), Some(repo), Some(key_path), Some(server)) = (org, repo, key, server)
        else {
            return Err(CertError::Configuration(format!(
                "required value(s) \"{}\" not set",
                missing.join("\", \"")
            )));
        };

        let server_url = parse_url("server", &server)?;
        let api_url = parse_url(
            "api-url",
            non_empty(settings.api_url).as_deref().unwrap_or(DEFAULT_API_URL),
        )?;

        let max_attempts = settings.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS);
        if max_attempts == 0 {
            return Err(CertError::Configuration(
                "max-attempts must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            repository: Repository { org, repo },
            key_path,
            server_url,
            api_url,
            token: non_empty(settings.token),
            output: settings.output,
            poll: PollPolicy {
                max_attempts,
                interval: Duration::from_millis(settings.poll_interval_ms.unwrap_or(0)),
            },
        })
    }

    /// Where the certificate will be written.
    pub fn certificate_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| ghcert_ssh::certificate_path(&self.key_path))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_url(name: &str, value: &str) -> Result<Url> {
    let url = Url::parse(value)
        .map_err(|e| CertError::Configuration(format!("invalid {} URL {:?}: {}", name, value, e)))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(CertError::Configuration(format!(
            "invalid {} URL {:?}: expected an http(s) URL",
            name, value
        )));
    }
    Ok(url)
}

/// Default config file location (~/.config/ghcert/config.toml).
///
/// Uses `XDG_CONFIG_HOME` if set, otherwise falls back to `~/.config`.
pub fn default_config_path() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .map(|p| p.join("ghcert").join("config.toml"))
}

/// Org and repo of the `origin` remote of the current git checkout.
pub fn detect_repository() -> Option<Repository> {
    let output = std::process::Command::new("git")
        .args(["remote", "get-url", "origin"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    parse_github_remote(String::from_utf8_lossy(&output.stdout).trim())
}

/// Parse a GitHub remote URL into org and repo.
///
/// Accepts `git@github.com:org/repo.git`, `ssh://git@github.com/org/repo`,
/// and `https://github.com/org/repo`.
pub fn parse_github_remote(remote: &str) -> Option<Repository> {
    let path = if let Some(rest) = remote.strip_prefix("git@") {
        rest.split_once(':')?.1
    } else {
        let url = Url::parse(remote).ok()?;
        url.host_str()?;
        return split_repo_path(url.path());
    };
    split_repo_path(path)
}

fn split_repo_path(path: &str) -> Option<Repository> {
    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let (org, repo) = path.split_once('/')?;
    if org.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some(Repository::new(org, repo))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> Settings {
        Settings {
            org: Some("acme".to_string()),
            repo: Some("ssh-ca".to_string()),
            key: Some(PathBuf::from("/home/me/.ssh/id_ed25519.pub")),
            server: Some("https://signer.example.com/ssh-cert-app".to_string()),
            ..Settings::default()
        }
    }

    #[test]
    fn test_complete_settings_validate() {
        let config = Config::from_settings(complete()).expect("should validate");
        assert_eq!(config.repository, Repository::new("acme", "ssh-ca"));
        assert_eq!(config.api_url.as_str(), "https://api.github.com/");
        assert_eq!(config.poll.max_attempts, 10);
        assert_eq!(config.poll.interval, Duration::ZERO);
        assert_eq!(
            config.certificate_path(),
            PathBuf::from("/home/me/.ssh/id_ed25519-cert.pub")
        );
    }

    #[test]
    fn test_missing_values_reported_together() {
        let settings = Settings {
            key: Some(PathBuf::from("k.pub")),
            server: Some("https://signer.example.com".to_string()),
            ..Settings::default()
        };
        let err = Config::from_settings(settings).unwrap_err();
        assert_eq!(err.to_string(), r#"required value(s) "org", "repo" not set"#);
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let mut settings = complete();
        settings.org = Some("   ".to_string());
        let err = Config::from_settings(settings).unwrap_err();
        assert_eq!(err.to_string(), r#"required value(s) "org" not set"#);
    }

    #[test]
    fn test_everything_missing() {
        let err = Config::from_settings(Settings::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"required value(s) "org", "repo", "key", "server" not set"#
        );
    }

    #[test]
    fn test_bad_server_url() {
        let mut settings = complete();
        settings.server = Some("not a url".to_string());
        assert!(matches!(
            Config::from_settings(settings),
            Err(CertError::Configuration(_))
        ));

        let mut settings = complete();
        settings.server = Some("ftp://signer.example.com".to_string());
        assert!(matches!(
            Config::from_settings(settings),
            Err(CertError::Configuration(_))
        ));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut settings = complete();
        settings.max_attempts = Some(0);
        assert!(matches!(
            Config::from_settings(settings),
            Err(CertError::Configuration(_))
        ));
    }

    #[test]
    fn test_output_override() {
        let mut settings = complete();
        settings.output = Some(PathBuf::from("/tmp/cert.pub"));
        let config = Config::from_settings(settings).unwrap();
        assert_eq!(config.certificate_path(), PathBuf::from("/tmp/cert.pub"));
    }

    #[test]
    fn test_flags_override_file() {
        let file = Settings::parse(
            r#"
            org = "from-file"
            repo = "ca"
            server = "https://file.example.com"
            max-attempts = 4
            "#,
        )
        .unwrap();
        let flags = Settings {
            org: Some("from-flag".to_string()),
            ..Settings::default()
        };

        let merged = file.merge(flags);
        assert_eq!(merged.org.as_deref(), Some("from-flag"));
        assert_eq!(merged.repo.as_deref(), Some("ca"));
        assert_eq!(merged.max_attempts, Some(4));
    }

    #[test]
    fn test_unknown_config_key_rejected() {
        assert!(Settings::parse("organisation = \"typo\"").is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ghcert.toml");
        std::fs::write(&path, "repo = \"ca\"\npoll-interval-ms = 250\n").unwrap();

        let settings = Settings::load_file(Some(&path)).unwrap();
        assert_eq!(settings.repo.as_deref(), Some("ca"));
        assert_eq!(settings.poll_interval_ms, Some(250));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = Settings::load_file(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(CertError::Configuration(_))));
    }

    #[test]
    fn test_detection_only_when_both_missing() {
        let detected = || Some(Repository::new("octo", "cat"));

        let filled = Settings::default().with_detected_repository(detected);
        assert_eq!(filled.org.as_deref(), Some("octo"));
        assert_eq!(filled.repo.as_deref(), Some("cat"));

        let partial = Settings {
            org: Some("mine".to_string()),
            ..Settings::default()
        }
        .with_detected_repository(|| panic!("detection should not run"));
        assert_eq!(partial.org.as_deref(), Some("mine"));
        assert!(partial.repo.is_none());
    }

    #[test]
    fn test_parse_github_remotes() {
        let expected = Some(Repository::new("octo", "cat"));
        assert_eq!(parse_github_remote("git@github.com:octo/cat.git"), expected);
        assert_eq!(parse_github_remote("git@github.com:octo/cat"), expected);
        assert_eq!(parse_github_remote("ssh://git@github.com/octo/cat.git"), expected);
        assert_eq!(parse_github_remote("https://github.com/octo/cat"), expected);
        assert_eq!(parse_github_remote("https://github.com/octo/cat.git/"), expected);
    }

    #[test]
    fn test_parse_github_remote_rejects_garbage() {
        assert_eq!(parse_github_remote(""), None);
        assert_eq!(parse_github_remote("/local/path/repo"), None);
        assert_eq!(parse_github_remote("https://github.com/only-org"), None);
        assert_eq!(parse_github_remote("https://github.com/a/b/c"), None);
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut settings = complete();
        settings.token = Some("ghp_secret".to_string());
        assert!(!format!("{:?}", settings).contains("ghp_secret"));
        let config = Config::from_settings(settings).unwrap();
        assert!(!format!("{:?}", config).contains("ghp_secret"));
    }
}
