// ABOUTME: Derives where a signed certificate is written.
// ABOUTME: Same directory as the public key, `.pub` replaced by `-cert.pub`.

use std::path::{Path, PathBuf};

/// Certificate path for the public key at `public_key_path`.
///
/// `~/.ssh/id_ed25519.pub` becomes `~/.ssh/id_ed25519-cert.pub`, which is
/// where OpenSSH looks for a certificate next to an identity file.
pub fn certificate_path(public_key_path: &Path) -> PathBuf {
    let file_name = public_key_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = file_name.strip_suffix(".pub").unwrap_or(&file_name);
    let cert_name = format!("{base}-cert.pub");

    match public_key_path.parent() {
        Some(dir) => dir.join(cert_name),
        None => PathBuf::from(cert_name),
    }
}
