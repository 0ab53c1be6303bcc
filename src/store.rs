// src/store.rs
//! In-memory pending-challenge store.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use zeroize::Zeroize;

pub const CHALLENGE_LEN: usize = 32;

/// A challenge issued to one device and not yet answered.
pub struct PendingChallenge {
    pub device_id: String,
    pub challenge: [u8; CHALLENGE_LEN],
    pub client_public_key: String,
    pub issued_at: DateTime<Utc>,
}

impl PendingChallenge {
    pub fn new(device_id: &str, challenge: [u8; CHALLENGE_LEN], client_public_key: &str) -> Self {
        Self {
            device_id: device_id.to_owned(),
            challenge,
            client_public_key: client_public_key.to_owned(),
            issued_at: Utc::now(),
        }
    }

    /// A deadline past the representable range never expires.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.issued_at
            .checked_add_signed(ttl)
            .is_some_and(|deadline| deadline < Utc::now())
    }
}

impl Drop for PendingChallenge {
    fn drop(&mut self) {
        self.challenge.zeroize();
    }
}

/// `device_id -> PendingChallenge`, at most one entry per device.
///
/// Entries are sharded, so devices never contend with each other. Each
/// operation below holds its shard lock for the whole mutation.
#[derive(Default)]
pub struct ChallengeStore {
    pending: DashMap<String, PendingChallenge>,
}

impl ChallengeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert, replacing any challenge already pending for the device.
    /// Returns true if one was replaced.
    pub fn insert(&self, entry: PendingChallenge) -> bool {
        self.pending.insert(entry.device_id.clone(), entry).is_some()
    }

    /// Remove and return the pending challenge in one step.
    ///
    /// Concurrent callers for the same device see the entry at most once.
    pub fn take(&self, device_id: &str) -> Option<PendingChallenge> {
        self.pending.remove(device_id).map(|(_, entry)| entry)
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.pending.contains_key(device_id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop every entry older than `ttl`. Returns how many were removed.
    pub fn purge_expired(&self, ttl: Duration) -> usize {
        let mut removed = 0;
        self.pending.retain(|_, entry| {
            let expired = entry.is_expired(ttl);
            removed += usize::from(expired);
            !expired
        });
        removed
    }

    #[cfg(test)]
    pub(crate) fn backdate(&self, device_id: &str, by: Duration) {
        if let Some(mut entry) = self.pending.get_mut(device_id) {
            entry.issued_at = entry.issued_at - by;
        }
    }
}
