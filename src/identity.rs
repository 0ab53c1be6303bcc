// src/identity.rs
//! P-384 key material for one protocol party.
//!
//! Signatures are ECDSA over a SHA-256 digest, exchanged as ASN.1 DER.
//! Public keys travel as SubjectPublicKeyInfo PEM text.

use p384::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p384::ecdsa::{Signature, SigningKey, VerifyingKey};
use p384::pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};
use p384::{PublicKey, SecretKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum IdentityError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("malformed signature encoding")]
    InvalidSignature,

    #[error("signature does not match message")]
    VerificationFailed,

    #[error("signing failed")]
    Signing,

    #[error("public key export failed: {0}")]
    Export(String),
}

/// A private/public key pair on NIST P-384.
///
/// No `Debug` impl so the private scalar never ends up in logs.
pub struct CryptoIdentity {
    secret: SecretKey,
}

impl CryptoIdentity {
    pub fn generate() -> Self {
        Self {
            secret: SecretKey::random(&mut OsRng),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.secret.public_key()
    }

    /// SubjectPublicKeyInfo PEM with `\n` line endings.
    pub fn export_public_key(&self) -> Result<String, IdentityError> {
        self.public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| IdentityError::Export(e.to_string()))
    }

    /// DER-encoded ECDSA signature over `SHA-256(message)`.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, IdentityError> {
        let signing_key = SigningKey::from(&self.secret);
        let digest = Sha256::digest(message);
        let signature: Signature = signing_key
            .sign_prehash(&digest)
            .map_err(|_| IdentityError::Signing)?;
        Ok(signature.to_der().as_bytes().to_vec())
    }

    /// ECDH with the peer's PEM public key; returns the raw x-coordinate.
    pub fn compute_shared_secret(
        &self,
        peer_public_key: &str,
    ) -> Result<Zeroizing<Vec<u8>>, IdentityError> {
        let peer = parse_public_key(peer_public_key)?;
        let shared = p384::ecdh::diffie_hellman(self.secret.to_nonzero_scalar(), peer.as_affine());
        Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
    }
}

fn parse_public_key(pem: &str) -> Result<PublicKey, IdentityError> {
    PublicKey::from_public_key_pem(pem).map_err(|e| IdentityError::InvalidPublicKey(e.to_string()))
}

/// Check a DER signature against a PEM public key, keeping the failure reason.
pub fn try_verify(
    peer_public_key: &str,
    signature: &[u8],
    message: &[u8],
) -> Result<(), IdentityError> {
    let public_key = parse_public_key(peer_public_key)?;
    let signature = Signature::from_der(signature).map_err(|_| IdentityError::InvalidSignature)?;
    VerifyingKey::from(&public_key)
        .verify_prehash(&Sha256::digest(message), &signature)
        .map_err(|_| IdentityError::VerificationFailed)
}

/// Like [`try_verify`], collapsed to a boolean. Never panics on bad input.
pub fn verify(peer_public_key: &str, signature: &[u8], message: &[u8]) -> bool {
    try_verify(peer_public_key, signature, message).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const P256_PUBLIC_KEY: &str = "-----BEGIN PUBLIC KEY-----
MFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAEbuscrenfftGCR6MWu3dXjj/309Dq
wrQ/ihqgZBQfQXzwvDQ2N1uJGcXgfYLSNMG/TeVRbWVKR5UcVgW9I604VQ==
-----END PUBLIC KEY-----
";

    #[test]
    fn test_export_is_pem_and_deterministic() {
        let identity = CryptoIdentity::generate();
        let pem = identity.export_public_key().unwrap();

        assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----"));
        assert!(pem.trim_end().ends_with("-----END PUBLIC KEY-----"));
        assert_eq!(pem, identity.export_public_key().unwrap());
    }

    #[test]
    fn test_sign_and_verify() {
        let identity = CryptoIdentity::generate();
        let pem = identity.export_public_key().unwrap();
        let signature = identity.sign(pem.as_bytes()).unwrap();

        assert!(verify(&pem, &signature, pem.as_bytes()));
    }

    #[test]
    fn test_verify_rejects_other_message() {
        let identity = CryptoIdentity::generate();
        let pem = identity.export_public_key().unwrap();
        let signature = identity.sign(b"first message").unwrap();

        assert_eq!(
            try_verify(&pem, &signature, b"second message"),
            Err(IdentityError::VerificationFailed)
        );
    }

    #[test]
    fn test_verify_rejects_other_key() {
        let signer = CryptoIdentity::generate();
        let other = CryptoIdentity::generate();
        let other_pem = other.export_public_key().unwrap();
        let signature = signer.sign(other_pem.as_bytes()).unwrap();

        assert!(!verify(&other_pem, &signature, other_pem.as_bytes()));
    }

    #[test]
    fn test_verify_malformed_inputs_return_false() {
        let identity = CryptoIdentity::generate();
        let pem = identity.export_public_key().unwrap();

        assert_eq!(
            try_verify(&pem, &[0xaa; 32], b"msg"),
            Err(IdentityError::InvalidSignature)
        );
        assert!(matches!(
            try_verify("not a key", &[0x30, 0x00], b"msg"),
            Err(IdentityError::InvalidPublicKey(_))
        ));
        assert!(!verify("", &[], b""));
    }

    #[test]
    fn test_other_curve_key_is_rejected() {
        let identity = CryptoIdentity::generate();
        let signature = identity.sign(P256_PUBLIC_KEY.as_bytes()).unwrap();

        assert!(matches!(
            try_verify(P256_PUBLIC_KEY, &signature, P256_PUBLIC_KEY.as_bytes()),
            Err(IdentityError::InvalidPublicKey(_))
        ));
        assert!(!verify(P256_PUBLIC_KEY, &signature, P256_PUBLIC_KEY.as_bytes()));
        assert!(matches!(
            identity.compute_shared_secret(P256_PUBLIC_KEY),
            Err(IdentityError::InvalidPublicKey(_))
        ));
    }

    #[test]
    fn test_shared_secret_is_symmetric() {
        let a = CryptoIdentity::generate();
        let b = CryptoIdentity::generate();

        let ab = a.compute_shared_secret(&b.export_public_key().unwrap()).unwrap();
        let ba = b.compute_shared_secret(&a.export_public_key().unwrap()).unwrap();

        assert_eq!(ab.len(), 48);
        assert_eq!(*ab, *ba);
    }

    #[test]
    fn test_shared_secret_rejects_bad_key() {
        let identity = CryptoIdentity::generate();
        assert!(identity.compute_shared_secret("garbage").is_err());
    }
}
