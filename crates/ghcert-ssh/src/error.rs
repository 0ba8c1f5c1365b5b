// ABOUTME: Error types for SSH key operations using thiserror.
// ABOUTME: Covers local key reading and parsing plus registered-key lookup failures.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a local key or matching it against
/// the keys registered on the user's account.
#[derive(Error, Debug)]
pub enum SshError {
    /// Failed to read a key file from disk.
    #[error("failed to read SSH public key from {path}: {source}")]
    ReadKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The key file does not hold a single public key line.
    #[error("invalid SSH public key file {path}: {reason}")]
    InvalidKeyFile { path: PathBuf, reason: String },

    /// Failed to parse an SSH public key.
    #[error("failed to parse SSH public key from {path}: {source}")]
    ParseKey {
        path: PathBuf,
        #[source]
        source: ssh_key::Error,
    },

    /// The account has no SSH keys at all.
    #[error("no SSH keys found on your GitHub profile. Please add one")]
    NoKeysRegistered,

    /// None of the registered keys matches the local key.
    #[error("the SSH key at {path} is not registered on your GitHub profile. Please add it")]
    NoMatchingKey { path: PathBuf },
}

/// Result type alias using SshError.
pub type Result<T> = std::result::Result<T, SshError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_read_key_error_display() {
        let err = SshError::ReadKey {
            path: PathBuf::from("/path/to/key.pub"),
            source: io::Error::new(io::ErrorKind::NotFound, "file not found"),
        };
        let display = format!("{}", err);
        assert!(display.contains("failed to read SSH public key"));
        assert!(display.contains("/path/to/key.pub"));
    }

    #[test]
    fn test_parse_key_error_display() {
        let err = SshError::ParseKey {
            path: PathBuf::from("/path/to/invalid.pub"),
            source: ssh_key::Error::AlgorithmUnknown,
        };
        let display = format!("{}", err);
        assert!(display.contains("failed to parse SSH public key"));
        assert!(display.contains("/path/to/invalid.pub"));
    }

    #[test]
    fn test_invalid_key_file_display() {
        let err = SshError::InvalidKeyFile {
            path: PathBuf::from("/keys/two.pub"),
            reason: "expected exactly one key line, found 2".to_string(),
        };
        let display = format!("{}", err);
        assert!(display.contains("/keys/two.pub"));
        assert!(display.contains("found 2"));
    }

    #[test]
    fn test_no_matching_key_names_path() {
        let err = SshError::NoMatchingKey {
            path: PathBuf::from("/home/me/.ssh/id_ed25519.pub"),
        };
        assert!(format!("{}", err).contains("/home/me/.ssh/id_ed25519.pub"));
    }

    #[test]
    fn test_error_source_read_key() {
        use std::error::Error;

        let err = SshError::ReadKey {
            path: PathBuf::from("/path"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.source().is_some());
    }

    #[test]
    fn test_error_no_source_lookup() {
        use std::error::Error;

        assert!(SshError::NoKeysRegistered.source().is_none());
    }
}
