// ABOUTME: Library root for ghcert.
// ABOUTME: Certificate request/fetch protocol over GitHub dispatch and a signer fetch endpoint.

pub mod auth;
pub mod config;
pub mod error;
pub mod fetch;
pub mod get;
pub mod github;
pub mod poller;
pub mod request;
pub mod token;
pub mod transaction;
pub mod writer;

pub use config::{Config, Repository, Settings};
pub use error::{CertError, Result};
pub use fetch::{Certificate, CertificateFetcher, FetchOutcome, SignerClient};
pub use github::{EventDispatcher, GithubClient, KeyDirectory};
pub use poller::{poll_certificate, PollPolicy, DEFAULT_MAX_ATTEMPTS};
pub use request::{CertificateRequest, DispatchEvent, CERTIFICATE_REQUEST_EVENT};
pub use token::{SessionToken, SESSION_TOKEN_LENGTH};
pub use transaction::{CertificateIssuer, IssuedCertificate, Stage};
pub use writer::write_certificate;
