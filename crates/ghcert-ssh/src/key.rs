// ABOUTME: Local SSH public key loading and validation.
// ABOUTME: Reads a single-line OpenSSH public key file and exposes its content and fingerprint.

use crate::error::{Result, SshError};
use ssh_key::{HashAlg, PublicKey};
use std::path::{Path, PathBuf};

/// A public key file read from local disk.
///
/// The raw content is kept verbatim because matching against registered keys
/// is done on the text, not on the parsed key. The parsed form is only used
/// to reject files that are not public keys and to compute a fingerprint.
#[derive(Debug, Clone)]
pub struct LocalKeyFile {
    path: PathBuf,
    content: String,
    public_key: PublicKey,
}

impl LocalKeyFile {
    /// Read and validate the public key at `path`.
    ///
    /// # Errors
    /// Returns `ReadKey` if the file cannot be read, `InvalidKeyFile` if it
    /// does not contain exactly one key line, and `ParseKey` if that line is
    /// not an OpenSSH public key.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SshError::ReadKey {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_content(path, content)
    }

    /// Validate already-loaded content as if it had been read from `path`.
    pub fn from_content(path: &Path, content: String) -> Result<Self> {
        let invalid = |reason: String| SshError::InvalidKeyFile {
            path: path.to_path_buf(),
            reason,
        };

        let lines: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let line = match lines.as_slice() {
            [] => return Err(invalid("file is empty".to_string())),
            [line] => *line,
            many => {
                return Err(invalid(format!(
                    "expected exactly one key line, found {}",
                    many.len()
                )))
            }
        };

        if line.starts_with("-----BEGIN") {
            return Err(invalid(
                "this looks like a private key, pass the .pub file instead".to_string(),
            ));
        }

        let public_key = PublicKey::from_openssh(line).map_err(|e| SshError::ParseKey {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            content,
            public_key,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File content exactly as read.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The single key line, without surrounding whitespace.
    pub fn key_line(&self) -> &str {
        self.content.trim()
    }

    /// Final path component, e.g. `id_ed25519.pub`.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// SHA256 fingerprint in the `SHA256:...` form GitHub displays.
    pub fn fingerprint(&self) -> String {
        self.public_key.fingerprint(HashAlg::Sha256).to_string()
    }

    pub fn algorithm(&self) -> String {
        self.public_key.algorithm().as_str().to_string()
    }
}
