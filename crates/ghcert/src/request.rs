// ABOUTME: Certificate request payload carried by the repository dispatch event.
// ABOUTME: Serializes to the `certificate-request` event body the signer workflow consumes.

use crate::token::SessionToken;
use ghcert_ssh::RegisteredKey;
use serde::{Deserialize, Serialize};

/// Event type the signer workflow listens for.
pub const CERTIFICATE_REQUEST_EVENT: &str = "certificate-request";

/// What the signer needs to issue one certificate. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRequest {
    #[serde(rename = "sessionToken")]
    token: SessionToken,

    #[serde(rename = "key")]
    key_material: String,

    #[serde(rename = "title")]
    key_identifier: String,

    #[serde(rename = "pubKeyFileName")]
    pub_key_file_name: String,
}

impl CertificateRequest {
    pub fn new(
        token: SessionToken,
        key: &RegisteredKey,
        pub_key_file_name: impl Into<String>,
    ) -> Self {
        Self {
            token,
            key_material: key.material.clone(),
            key_identifier: key.identifier.clone(),
            pub_key_file_name: pub_key_file_name.into(),
        }
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    pub fn key_material(&self) -> &str {
        &self.key_material
    }

    pub fn key_identifier(&self) -> &str {
        &self.key_identifier
    }

    pub fn pub_key_file_name(&self) -> &str {
        &self.pub_key_file_name
    }
}

/// Body of `POST /repos/{org}/{repo}/dispatches`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchEvent {
    pub event_type: String,
    pub client_payload: CertificateRequest,
}

impl From<CertificateRequest> for DispatchEvent {
    fn from(request: CertificateRequest) -> Self {
        Self {
            event_type: CERTIFICATE_REQUEST_EVENT.to_string(),
            client_payload: request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn laptop_key() -> RegisteredKey {
        RegisteredKey {
            material: "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIK0".to_string(),
            identifier: "laptop".to_string(),
            id: 12,
            verified: true,
            read_only: false,
            created_at: None,
        }
    }

    #[test]
    fn test_event_body_shape() {
        let token = SessionToken::from_rng(&mut StdRng::seed_from_u64(3), 20);
        let request = CertificateRequest::new(token.clone(), &laptop_key(), "id_ed25519.pub");
        let body = serde_json::to_value(DispatchEvent::from(request)).unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "event_type": "certificate-request",
                "client_payload": {
                    "sessionToken": token.as_str(),
                    "key": "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIK0",
                    "title": "laptop",
                    "pubKeyFileName": "id_ed25519.pub",
                }
            })
        );
    }

    #[test]
    fn test_payload_survives_serialization() {
        let token = SessionToken::generate();
        let mut key = laptop_key();
        key.identifier = "work \"desk\" \\ key".to_string();
        let request = CertificateRequest::new(token.clone(), &key, "weird name.pub");

        let json = serde_json::to_string(&DispatchEvent::from(request.clone())).unwrap();
        let parsed: DispatchEvent = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.event_type, CERTIFICATE_REQUEST_EVENT);
        assert_eq!(parsed.client_payload.token(), &token);
        assert_eq!(parsed.client_payload.key_material(), key.material);
        assert_eq!(parsed.client_payload.key_identifier(), "work \"desk\" \\ key");
        assert_eq!(parsed.client_payload.pub_key_file_name(), "weird name.pub");
        assert_eq!(parsed.client_payload, request);
    }
}
