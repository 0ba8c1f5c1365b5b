// ABOUTME: GitHub REST client for the two calls the protocol makes on the user's behalf.
// ABOUTME: Lists the user's registered SSH keys and sends the repository dispatch event.

use crate::config::Repository;
use crate::error::{CertError, Result};
use crate::fetch::join_path;
use crate::request::{CertificateRequest, DispatchEvent};
use async_trait::async_trait;
use ghcert_ssh::RegisteredKey;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Keys per page requested from `GET /user/keys`.
const KEYS_PER_PAGE: usize = 100;

/// Upper bound on pages followed when listing keys.
const MAX_KEY_PAGES: usize = 10;

/// Source of the authenticated user's registered SSH keys.
#[async_trait]
pub trait KeyDirectory: Send + Sync {
    async fn list_keys(&self) -> Result<Vec<RegisteredKey>>;
}

/// Sends the certificate request to the signer repository.
///
/// Implementations send exactly once and never retry: a retried dispatch
/// could start a second signing run under the same token.
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    async fn dispatch(&self, repository: &Repository, request: &CertificateRequest) -> Result<()>;
}

#[async_trait]
impl<T: KeyDirectory + ?Sized> KeyDirectory for Arc<T> {
    async fn list_keys(&self) -> Result<Vec<RegisteredKey>> {
        (**self).list_keys().await
    }
}

#[async_trait]
impl<T: EventDispatcher + ?Sized> EventDispatcher for Arc<T> {
    async fn dispatch(&self, repository: &Repository, request: &CertificateRequest) -> Result<()> {
        (**self).dispatch(repository, request).await
    }
}

/// Authenticated client for the GitHub REST API.
#[derive(Clone)]
pub struct GithubClient {
    client: Client,
    api_url: Url,
    token: String,
}

impl GithubClient {
    /// Create a client for `api_url` using `token` as the bearer credential.
    pub fn new(api_url: &Url, token: impl Into<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("ghcert/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| CertError::Configuration(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: api_url.clone(),
            token: token.into(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        join_path(&self.api_url, segments)
    }
}

#[async_trait]
impl KeyDirectory for GithubClient {
    async fn list_keys(&self) -> Result<Vec<RegisteredKey>> {
        let mut keys = Vec::new();

        for page in 1..=MAX_KEY_PAGES {
            let mut url = self.endpoint(&["user", "keys"])?;
            url.query_pairs_mut()
                .append_pair("per_page", &KEYS_PER_PAGE.to_string())
                .append_pair("page", &page.to_string());

            let resp = self
                .client
                .get(url)
                .bearer_auth(&self.token)
                .send()
                .await
                .map_err(|e| CertError::KeyListing(e.to_string()))?;

            let resp = check_auth(resp).await?;
            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(CertError::KeyListing(format!(
                    "GitHub returned {}: {}",
                    status,
                    body.trim()
                )));
            }

            let batch: Vec<RegisteredKey> = resp
                .json()
                .await
                .map_err(|e| CertError::KeyListing(format!("failed to parse response: {e}")))?;

            let last_page = batch.len() < KEYS_PER_PAGE;
            keys.extend(batch);
            if last_page {
                break;
            }
        }

        debug!(count = keys.len(), "listed registered SSH keys");
        Ok(keys)
    }
}

#[async_trait]
impl EventDispatcher for GithubClient {
    async fn dispatch(&self, repository: &Repository, request: &CertificateRequest) -> Result<()> {
        let url = self.endpoint(&[
            "repos",
            repository.org.as_str(),
            repository.repo.as_str(),
            "dispatches",
        ])?;
        let event = DispatchEvent::from(request.clone());

        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(&event)
            .send()
            .await
            .map_err(|e| CertError::Dispatch {
                status: None,
                message: e.to_string(),
            })?;

        let resp = check_auth(resp).await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = match status {
                StatusCode::NOT_FOUND => format!(
                    "repository {} not found or you lack write access to it",
                    repository
                ),
                _ => body.trim().to_string(),
            };
            return Err(CertError::Dispatch {
                status: Some(status.as_u16()),
                message,
            });
        }

        info!(%repository, title = request.key_identifier(), "certificate request dispatched");
        Ok(())
    }
}

/// Map 401 to an authentication failure, pass everything else through.
async fn check_auth(resp: Response) -> Result<Response> {
    if resp.status() == StatusCode::UNAUTHORIZED {
        let body = resp.text().await.unwrap_or_default();
        return Err(CertError::Authentication(format!(
            "GitHub rejected the credential: {}",
            body.trim()
        )));
    }
    Ok(resp)
}
