// ABOUTME: One certificate transaction from local key to written certificate.
// ABOUTME: Read key, match it, mint a token, dispatch once, poll, write. Strictly sequential.

use crate::config::Repository;
use crate::error::{CertError, Result};
use crate::fetch::{Certificate, CertificateFetcher};
use crate::github::{EventDispatcher, KeyDirectory};
use crate::poller::{poll_certificate, PollPolicy};
use crate::request::CertificateRequest;
use crate::token::SessionToken;
use crate::writer::write_certificate;
use ghcert_ssh::{find_registered_key, LocalKeyFile};
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Progress notifications, in the order they occur.
#[derive(Debug)]
pub enum Stage<'a> {
    ReadingKey { path: &'a Path },
    ListingKeys { fingerprint: &'a str },
    KeyMatched { title: &'a str },
    Dispatching { repository: &'a Repository },
    Polling { max_attempts: u32 },
    Writing { path: &'a Path },
}

/// Outcome of a successful transaction.
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    pub certificate: Certificate,
    pub path: PathBuf,
    pub key_title: String,
    pub fingerprint: String,
}

/// Runs certificate transactions against a key directory, a dispatcher and
/// a signer.
pub struct CertificateIssuer<K, D, F> {
    keys: K,
    dispatcher: D,
    fetcher: F,
    policy: PollPolicy,
}

impl<K, D, F> CertificateIssuer<K, D, F>
where
    K: KeyDirectory,
    D: EventDispatcher,
    F: CertificateFetcher,
{
    pub fn new(keys: K, dispatcher: D, fetcher: F, policy: PollPolicy) -> Self {
        Self {
            keys,
            dispatcher,
            fetcher,
            policy,
        }
    }

    /// Issue a certificate for the public key at `key_path` and write it to
    /// `output`.
    pub async fn issue(
        &self,
        repository: &Repository,
        key_path: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<IssuedCertificate> {
        self.issue_with_progress(repository, key_path, output, cancel, |_| {})
            .await
    }

    /// Like [`issue`](Self::issue), reporting each stage to `on_stage`.
    ///
    /// Nothing is written unless every earlier stage succeeded. The dispatch
    /// happens at most once; a failed transaction must be restarted from
    /// scratch so that a new token is minted.
    pub async fn issue_with_progress(
        &self,
        repository: &Repository,
        key_path: &Path,
        output: &Path,
        cancel: &CancellationToken,
        mut on_stage: impl FnMut(Stage<'_>),
    ) -> Result<IssuedCertificate> {
        on_stage(Stage::ReadingKey { path: key_path });
        let local = LocalKeyFile::read(key_path)?;
        let fingerprint = local.fingerprint();
        debug!(%fingerprint, algorithm = %local.algorithm(), "read local public key");

        on_stage(Stage::ListingKeys {
            fingerprint: &fingerprint,
        });
        let registered = until_cancelled(cancel, self.keys.list_keys()).await?;
        let key = find_registered_key(&local, &registered)?;
        on_stage(Stage::KeyMatched {
            title: &key.identifier,
        });

        let token = SessionToken::generate();
        debug!(?token, "minted session token");
        let request = CertificateRequest::new(token, &key, local.file_name());

        on_stage(Stage::Dispatching { repository });
        until_cancelled(cancel, self.dispatcher.dispatch(repository, &request)).await?;

        on_stage(Stage::Polling {
            max_attempts: self.policy.max_attempts,
        });
        let certificate =
            poll_certificate(&self.fetcher, request.token(), &self.policy, cancel).await?;

        on_stage(Stage::Writing { path: output });
        write_certificate(output, &certificate)?;
        info!(path = %output.display(), title = %key.identifier, "certificate written");

        Ok(IssuedCertificate {
            certificate,
            path: output.to_path_buf(),
            key_title: key.identifier,
            fingerprint,
        })
    }
}

async fn until_cancelled<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CertError::Cancelled),
        result = fut => result,
    }
}
