// ABOUTME: Certificate poll loop with a fixed attempt budget.
// ABOUTME: Stops at the first certificate; cancellable between and during attempts.

use crate::error::{CertError, Result};
use crate::fetch::{Certificate, CertificateFetcher, FetchOutcome};
use crate::token::SessionToken;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Fetch attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// How many times to ask and how long to wait between asks.
///
/// The default interval is zero: round-trip time is the only throttle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: Duration::ZERO,
        }
    }
}

/// Poll `fetcher` for the certificate belonging to `token`.
///
/// `NotReady` answers continue silently. Transport failures also use up an
/// attempt and are reported in the final error if the budget runs out.
///
/// # Errors
/// `CertificateNotReady` after `policy.max_attempts` attempts without a
/// certificate, `Cancelled` if `cancel` fires first.
pub async fn poll_certificate<F>(
    fetcher: &F,
    token: &SessionToken,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<Certificate>
where
    F: CertificateFetcher + ?Sized,
{
    let mut transport_failures = 0;
    let mut last_failure = None;

    for attempt in 1..=policy.max_attempts {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CertError::Cancelled),
            outcome = fetcher.fetch(token) => outcome,
        };

        match outcome {
            FetchOutcome::Ready(cert) => {
                info!(attempt, "certificate received");
                return Ok(cert);
            }
            FetchOutcome::NotReady => {
                debug!(attempt, max = policy.max_attempts, "certificate not ready yet");
            }
            FetchOutcome::TransportFailure(cause) => {
                warn!(attempt, max = policy.max_attempts, %cause, "could not reach signer");
                transport_failures += 1;
                last_failure = Some(cause);
            }
        }

        if attempt < policy.max_attempts && !policy.interval.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CertError::Cancelled),
                _ = tokio::time::sleep(policy.interval) => {}
            }
        }
    }

    Err(CertError::CertificateNotReady {
        attempts: policy.max_attempts,
        transport_failures,
        last_failure,
    })
}
