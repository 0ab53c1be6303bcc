// src/session.rs
//! Backend side of the challenge-response protocol.
//!
//! A device proves possession of its key by signing its own exported public
//! key. The backend answers with a random challenge; the device must return
//! `HMAC-SHA256(ecdh_secret, challenge)`. Each challenge is consumed by the
//! first validation attempt, whatever its outcome.

use chrono::Duration;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::codec;
use crate::identity::{self, CryptoIdentity, IdentityError};
use crate::store::{ChallengeStore, PendingChallenge, CHALLENGE_LEN};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("invalid signature")]
    SignatureInvalid,

    #[error("no pending challenge for device")]
    UnknownOrConsumedSession,

    #[error("challenge expired")]
    ChallengeExpired,

    #[error("response does not match challenge")]
    ResponseMismatch,

    #[error("key agreement failed: {0}")]
    KeyAgreement(#[from] IdentityError),

    #[error("mac initialisation failed")]
    Mac,
}

/// What the device needs to answer a challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeIssued {
    pub encoded_challenge: String,
    pub server_public_key: String,
}

/// `HMAC-SHA256(shared_secret, challenge)`. Shared by both protocol halves.
pub fn compute_challenge_response(
    shared_secret: &[u8],
    challenge: &[u8],
) -> Result<[u8; 32], AuthError> {
    let mut mac =
        <Hmac<Sha256> as Mac>::new_from_slice(shared_secret).map_err(|_| AuthError::Mac)?;
    mac.update(challenge);
    Ok(mac.finalize().into_bytes().into())
}

pub struct SessionManager {
    identity: CryptoIdentity,
    server_public_key: String,
    store: ChallengeStore,
    ttl: Option<Duration>,
}

impl SessionManager {
    pub fn new(identity: CryptoIdentity) -> Result<Self, AuthError> {
        let server_public_key = identity.export_public_key()?;
        Ok(Self {
            identity,
            server_public_key,
            store: ChallengeStore::new(),
            ttl: None,
        })
    }

    /// Reject challenges older than `ttl`. Without this they never expire.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn server_public_key(&self) -> &str {
        &self.server_public_key
    }

    pub fn pending_count(&self) -> usize {
        self.store.len()
    }

    pub fn has_pending(&self, device_id: &str) -> bool {
        self.store.contains(device_id)
    }

    /// Issue a fresh challenge if `signature` proves possession of the key
    /// behind `client_public_key`. A failed check leaves the store untouched.
    pub fn generate_challenge(
        &self,
        device_id: &str,
        client_public_key: &str,
        signature: &[u8],
    ) -> Result<ChallengeIssued, AuthError> {
        let message = client_public_key.as_bytes();
        if let Err(e) = identity::try_verify(client_public_key, signature, message) {
            warn!(device_id = %device_id, reason = %e, "rejected connect");
            return Err(AuthError::SignatureInvalid);
        }

        let mut challenge = [0u8; CHALLENGE_LEN];
        rand::rngs::OsRng.fill_bytes(&mut challenge);
        let encoded_challenge = codec::encode(&challenge);

        let replaced = self
            .store
            .insert(PendingChallenge::new(device_id, challenge, client_public_key));
        info!(device_id = %device_id, replaced, "challenge issued");

        Ok(ChallengeIssued {
            encoded_challenge,
            server_public_key: self.server_public_key.clone(),
        })
    }

    /// Validate and consume the pending challenge, keeping the failure reason.
    pub fn try_validate_response(
        &self,
        device_id: &str,
        encoded_response: &str,
    ) -> Result<(), AuthError> {
        let pending = self
            .store
            .take(device_id)
            .ok_or(AuthError::UnknownOrConsumedSession)?;

        if let Some(ttl) = self.ttl {
            if pending.is_expired(ttl) {
                return Err(AuthError::ChallengeExpired);
            }
        }

        let shared_secret = self
            .identity
            .compute_shared_secret(&pending.client_public_key)?;
        let expected = compute_challenge_response(&shared_secret, &pending.challenge)?;
        let expected_encoded = codec::encode(&expected);

        if bool::from(expected_encoded.as_bytes().ct_eq(encoded_response.as_bytes())) {
            Ok(())
        } else {
            Err(AuthError::ResponseMismatch)
        }
    }

    /// Boolean form of [`Self::try_validate_response`].
    pub fn validate_response(&self, device_id: &str, encoded_response: &str) -> bool {
        match self.try_validate_response(device_id, encoded_response) {
            Ok(()) => {
                info!(device_id = %device_id, "authentication succeeded");
                true
            }
            Err(AuthError::UnknownOrConsumedSession) => {
                debug!(device_id = %device_id, "validate without pending challenge");
                false
            }
            Err(e) => {
                warn!(device_id = %device_id, reason = %e, "authentication failed");
                false
            }
        }
    }

    /// Drop expired challenges. No-op when no TTL is configured.
    pub fn purge_expired(&self) -> usize {
        match self.ttl {
            Some(ttl) => self.store.purge_expired(ttl),
            None => 0,
        }
    }
}
