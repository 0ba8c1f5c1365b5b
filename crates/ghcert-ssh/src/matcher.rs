// ABOUTME: Matches a local public key against the keys registered on the account.
// ABOUTME: Selection is always by content, never by position or by how many keys exist.

use crate::error::{Result, SshError};
use crate::key::LocalKeyFile;
use crate::registered::RegisteredKey;
use tracing::debug;

/// Whether `local_content` is the key whose registered copy is `material`.
///
/// The registered copy carries no comment while the local file usually
/// does, so the local line must start with the material.
///
/// This is narrower than a plain byte-prefix test: the prefix must also end
/// on a field boundary, so `ssh-ed25519 AAAA` does not match a local
/// `ssh-ed25519 AAAAB...`. Full key blobs as GitHub returns them match the
/// same either way.
pub fn is_registered_as(local_content: &str, material: &str) -> bool {
    let material = material.trim();
    if material.is_empty() {
        return false;
    }
    match local_content.trim_start().strip_prefix(material) {
        Some(rest) => rest.is_empty() || rest.starts_with(char::is_whitespace),
        None => false,
    }
}

/// Select the registered key that `local_content` corresponds to.
///
/// # Errors
/// `NoKeysRegistered` when `keys` is empty (checked before any matching),
/// `NoMatchingKey` when no registered key matches.
pub fn select_registered_key<'a>(
    local_content: &str,
    local_path: &std::path::Path,
    keys: &'a [RegisteredKey],
) -> Result<&'a RegisteredKey> {
    if keys.is_empty() {
        return Err(SshError::NoKeysRegistered);
    }

    let found = keys
        .iter()
        .find(|k| is_registered_as(local_content, &k.material));

    match found {
        Some(key) => {
            debug!(title = %key.identifier, id = key.id, "local key is registered");
            Ok(key)
        }
        None => Err(SshError::NoMatchingKey {
            path: local_path.to_path_buf(),
        }),
    }
}

/// Convenience wrapper over [`select_registered_key`] for a loaded key file.
pub fn find_registered_key(local: &LocalKeyFile, keys: &[RegisteredKey]) -> Result<RegisteredKey> {
    select_registered_key(local.content(), local.path(), keys).cloned()
}
