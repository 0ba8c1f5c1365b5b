// ABOUTME: Registered SSH key record as returned by GitHub's key listing API.
// ABOUTME: Read-only copy fetched once per invocation and discarded at process end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A public key stored by GitHub against the authenticated user's account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredKey {
    /// Public key blob, e.g. `ssh-ed25519 AAAA...` (no comment).
    #[serde(rename = "key")]
    pub material: String,

    /// Title the user gave the key; used as the human-readable label.
    #[serde(rename = "title", default)]
    pub identifier: String,

    pub id: u64,

    #[serde(default)]
    pub verified: bool,

    #[serde(default)]
    pub read_only: bool,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
