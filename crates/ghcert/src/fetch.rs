// ABOUTME: Client for the signer's certificate fetch endpoint.
// ABOUTME: Classifies each fetch as not ready, ready, or a transport failure.

use crate::error::{CertError, Result};
use crate::token::SessionToken;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// A signed SSH certificate as returned by the signer. Opaque text.
#[derive(Clone, PartialEq, Eq)]
pub struct Certificate(String);

impl Certificate {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Certificate").field(&self.0).finish()
    }
}

/// Result of a single fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The signer answered but has no certificate for the token yet.
    NotReady,
    /// The certificate for the token.
    Ready(Certificate),
    /// The signer could not be reached or answered with something unusable.
    TransportFailure(String),
}

/// Source of certificates addressed by session token.
#[async_trait]
pub trait CertificateFetcher: Send + Sync {
    /// Ask once for the certificate belonging to `token`.
    async fn fetch(&self, token: &SessionToken) -> FetchOutcome;
}

#[async_trait]
impl<T: CertificateFetcher + ?Sized> CertificateFetcher for Arc<T> {
    async fn fetch(&self, token: &SessionToken) -> FetchOutcome {
        (**self).fetch(token).await
    }
}

#[derive(Serialize)]
struct FetchRequest<'a> {
    #[serde(rename = "sessionToken")]
    session_token: &'a str,
}

#[derive(Deserialize)]
struct FetchResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    certificate: Option<String>,
    #[serde(default, rename = "sessionToken")]
    session_token: Option<String>,
}

impl FetchResponse {
    fn into_outcome(self, sent: &SessionToken) -> FetchOutcome {
        if let Some(echoed) = self.session_token.as_deref() {
            if echoed != sent.as_str() {
                return FetchOutcome::TransportFailure(
                    "signer answered for a different session token".to_string(),
                );
            }
        }

        match self.certificate {
            Some(cert) if !cert.trim().is_empty() => FetchOutcome::Ready(Certificate(cert)),
            _ => {
                if let Some(message) = self.message.filter(|m| !m.is_empty()) {
                    debug!(%message, "certificate not ready");
                }
                FetchOutcome::NotReady
            }
        }
    }
}

/// HTTP client for `POST {server}/fetch`.
#[derive(Clone)]
pub struct SignerClient {
    client: Client,
    fetch_url: Url,
}

impl SignerClient {
    /// Create a client for the signer rooted at `server_url`.
    pub fn new(server_url: &Url) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("ghcert/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CertError::Configuration(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            fetch_url: join_path(server_url, &["fetch"])?,
        })
    }

    pub fn fetch_url(&self) -> &Url {
        &self.fetch_url
    }
}

#[async_trait]
impl CertificateFetcher for SignerClient {
    async fn fetch(&self, token: &SessionToken) -> FetchOutcome {
        let resp = match self
            .client
            .post(self.fetch_url.clone())
            .json(&FetchRequest {
                session_token: token.as_str(),
            })
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => return FetchOutcome::TransportFailure(e.to_string()),
        };

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return FetchOutcome::TransportFailure(format!(
                "signer returned {}: {}",
                status,
                body.trim()
            ));
        }

        match resp.json::<FetchResponse>().await {
            Ok(body) => body.into_outcome(token),
            Err(e) => FetchOutcome::TransportFailure(format!("unreadable signer response: {e}")),
        }
    }
}

/// Append path segments to `base`, keeping any path it already has.
pub(crate) fn join_path(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| CertError::Configuration(format!("{base} cannot be used as a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
