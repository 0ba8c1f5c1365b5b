// ABOUTME: Error types for the certificate request/fetch protocol.
// ABOUTME: One variant per failure class; every variant ends the transaction.

use ghcert_ssh::SshError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by a certificate transaction.
///
/// None of these are retried by the core. A failed dispatch leaves nothing
/// pending on the signer; a failed poll leaves the signer's work done but
/// unclaimed.
#[derive(Error, Debug)]
pub enum CertError {
    /// Required inputs are missing or malformed. The transaction never starts.
    #[error("{0}")]
    Configuration(String),

    /// No usable GitHub credential, or GitHub rejected it.
    #[error("not authenticated to GitHub: {0}")]
    Authentication(String),

    /// Local key could not be loaded, or it is not registered on the account.
    #[error(transparent)]
    KeyLookup(#[from] SshError),

    /// Listing the account's registered keys failed.
    #[error("failed to list SSH keys on your GitHub profile: {0}")]
    KeyListing(String),

    /// The dispatch event could not be delivered.
    #[error("failed to request certificate creation{}: {message}", status_suffix(.status))]
    Dispatch {
        status: Option<u16>,
        message: String,
    },

    /// The poll budget ran out without a certificate.
    #[error(
        "certificate was not ready after {attempts} attempts{}",
        failure_suffix(.transport_failures, .last_failure)
    )]
    CertificateNotReady {
        attempts: u32,
        transport_failures: u32,
        last_failure: Option<String>,
    },

    /// Writing the certificate to disk failed.
    #[error("failed to write certificate to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The caller cancelled the transaction.
    #[error("operation cancelled")]
    Cancelled,
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

fn failure_suffix(transport_failures: &u32, last_failure: &Option<String>) -> String {
    match (*transport_failures, last_failure.as_deref()) {
        (0, _) => String::new(),
        (n, Some(last)) => format!(" ({n} could not reach the signer, last: {last})"),
        (n, None) => format!(" ({n} could not reach the signer)"),
    }
}

/// Result type alias using CertError.
pub type Result<T> = std::result::Result<T, CertError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_configuration_error_is_shown_verbatim() {
        let err = CertError::Configuration(r#"required value(s) "org" not set"#.to_string());
        assert_eq!(format!("{}", err), r#"required value(s) "org" not set"#);
    }

    #[test]
    fn test_dispatch_error_with_status() {
        let err = CertError::Dispatch {
            status: Some(404),
            message: "Not Found".to_string(),
        };
        let display = format!("{}", err);
        assert!(display.contains("failed to request certificate creation"));
        assert!(display.contains("HTTP 404"));
        assert!(display.contains("Not Found"));
    }

    #[test]
    fn test_dispatch_error_without_status() {
        let err = CertError::Dispatch {
            status: None,
            message: "connection refused".to_string(),
        };
        let display = format!("{}", err);
        assert!(!display.contains("HTTP"));
        assert!(display.contains("connection refused"));
    }

    #[test]
    fn test_not_ready_plain() {
        let err = CertError::CertificateNotReady {
            attempts: 10,
            transport_failures: 0,
            last_failure: None,
        };
        assert_eq!(
            format!("{}", err),
            "certificate was not ready after 10 attempts"
        );
    }

    #[test]
    fn test_not_ready_reports_transport_failures() {
        let err = CertError::CertificateNotReady {
            attempts: 10,
            transport_failures: 3,
            last_failure: Some("connection reset".to_string()),
        };
        let display = format!("{}", err);
        assert!(display.contains("3 could not reach the signer"));
        assert!(display.contains("connection reset"));
    }

    #[test]
    fn test_key_error_is_transparent() {
        let err = CertError::from(SshError::NoKeysRegistered);
        assert!(matches!(err, CertError::KeyLookup(SshError::NoKeysRegistered)));
        assert_eq!(
            format!("{}", err),
            format!("{}", SshError::NoKeysRegistered)
        );
    }

    #[test]
    fn test_io_error_source() {
        use std::error::Error;

        let err = CertError::Io {
            path: PathBuf::from("/tmp/id-cert.pub"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());
        assert!(format!("{}", err).contains("/tmp/id-cert.pub"));
    }
}
