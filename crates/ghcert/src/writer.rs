// ABOUTME: Persists a retrieved certificate to local disk.
// ABOUTME: Writes a sibling temp file and renames it so readers never see a partial certificate.

use crate::error::{CertError, Result};
use crate::fetch::Certificate;
use std::io::Write;
use std::path::Path;

/// Write `certificate` to `path`, replacing any previous certificate.
///
/// The temp file gets a unique name in the target directory, so concurrent
/// writers to the same path never share it. The last rename wins.
///
/// # Errors
/// `Io` if the directory cannot be created or the file cannot be written.
pub fn write_certificate(path: &Path, certificate: &Certificate) -> Result<()> {
    let io_err = |source| CertError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent).map_err(io_err)?;
            parent
        }
        None => Path::new("."),
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "certificate".to_string());

    // Dropping the temp file on any error path removes it.
    let mut temp = tempfile::Builder::new()
        .prefix(&format!(".{name}."))
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(io_err)?;
    temp.write_all(certificate.as_str().as_bytes())
        .map_err(io_err)?;
    temp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
