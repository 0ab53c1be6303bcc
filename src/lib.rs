// src/lib.rs
//! Device authentication by ECDSA proof-of-possession followed by an
//! ECDH-keyed HMAC challenge, with challenges carried as `ACGT` text.

pub mod api;
pub mod client;
pub mod codec;
pub mod config;
pub mod device;
pub mod identity;
pub mod session;
pub mod store;
pub mod types;

pub use device::Device;
pub use identity::{verify, CryptoIdentity, IdentityError};
pub use session::{compute_challenge_response, AuthError, ChallengeIssued, SessionManager};
