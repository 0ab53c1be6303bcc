// src/device.rs
//! Device side of the protocol.

use crate::codec;
use crate::identity::{CryptoIdentity, IdentityError};
use crate::session::{compute_challenge_response, AuthError};
use crate::types::{ChallengeResponse, ConnectRequest, ValidateRequest};

pub struct Device {
    device_id: String,
    identity: CryptoIdentity,
}

impl Device {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self::with_identity(device_id, CryptoIdentity::generate())
    }

    pub fn with_identity(device_id: impl Into<String>, identity: CryptoIdentity) -> Self {
        Self {
            device_id: device_id.into(),
            identity,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn identity(&self) -> &CryptoIdentity {
        &self.identity
    }

    /// Public key plus a signature over that same key text.
    pub fn connect_request(&self) -> Result<ConnectRequest, IdentityError> {
        let public_key = self.identity.export_public_key()?;
        let signature = self.identity.sign(public_key.as_bytes())?;
        Ok(ConnectRequest {
            device_id: self.device_id.clone(),
            public_key,
            signature_hex: hex::encode(signature),
        })
    }

    /// Encoded `HMAC-SHA256(ecdh(server), challenge)`.
    pub fn respond(&self, challenge: &ChallengeResponse) -> Result<String, AuthError> {
        let challenge_bytes = codec::decode(&challenge.challenge_encoded);
        let secret = self
            .identity
            .compute_shared_secret(&challenge.server_public_key)?;
        let digest = compute_challenge_response(&secret, &challenge_bytes)?;
        Ok(codec::encode(&digest))
    }

    pub fn validate_request(&self, response_encoded: String) -> ValidateRequest {
        ValidateRequest {
            device_id: self.device_id.clone(),
            response_encoded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity;

    #[test]
    fn test_connect_request_carries_self_signature() {
        let device = Device::new("SIM-DEVICE-001");
        let req = device.connect_request().unwrap();
        let signature = hex::decode(&req.signature_hex).unwrap();

        assert_eq!(req.device_id, "SIM-DEVICE-001");
        assert!(identity::verify(&req.public_key, &signature, req.public_key.as_bytes()));
    }

    #[test]
    fn test_respond_rejects_bad_server_key() {
        let device = Device::new("dev");
        let challenge = ChallengeResponse {
            challenge_encoded: "ACGT".into(),
            server_public_key: "nope".into(),
        };

        assert!(matches!(device.respond(&challenge), Err(AuthError::KeyAgreement(_))));
    }
}
