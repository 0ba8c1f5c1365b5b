// ABOUTME: Library root for ghcert-ssh.
// ABOUTME: Exports local key loading, registered-key records, matching, and certificate paths.

pub mod error;
pub mod key;
pub mod matcher;
pub mod path;
pub mod registered;

pub use error::{Result, SshError};
pub use key::LocalKeyFile;
pub use matcher::{find_registered_key, is_registered_as, select_registered_key};
pub use path::certificate_path;
pub use registered::RegisteredKey;
