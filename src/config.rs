// src/config.rs
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// `None` keeps challenges valid until used or replaced.
    pub challenge_ttl: Option<Duration>,
    pub purge_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            challenge_ttl: None,
            purge_interval: Duration::from_secs(60),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ServerConfig {
    /// Read `AUTH_BIND_ADDR`, `CHALLENGE_TTL_SECS`, `PURGE_INTERVAL_SECS`
    /// and `REQUEST_TIMEOUT_SECS`. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr = match lookup("AUTH_BIND_ADDR") {
            Some(s) => s
                .parse()
                .with_context(|| format!("AUTH_BIND_ADDR is not a socket address: {s}"))?,
            None => defaults.bind_addr,
        };

        let challenge_ttl = secs(&lookup, "CHALLENGE_TTL_SECS")?.filter(|d| !d.is_zero());
        if let Some(ttl) = challenge_ttl {
            chrono::Duration::from_std(ttl)
                .ok()
                .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
                .with_context(|| format!("CHALLENGE_TTL_SECS is out of range: {}", ttl.as_secs()))?;
        }

        Ok(Self {
            bind_addr,
            challenge_ttl,
            purge_interval: secs(&lookup, "PURGE_INTERVAL_SECS")?
                .filter(|d| !d.is_zero())
                .unwrap_or(defaults.purge_interval),
            request_timeout: secs(&lookup, "REQUEST_TIMEOUT_SECS")?
                .filter(|d| !d.is_zero())
                .unwrap_or(defaults.request_timeout),
        })
    }
}

fn secs(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<Duration>> {
    lookup(key)
        .map(|s| {
            s.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .with_context(|| format!("{key} must be a whole number of seconds: {s}"))
        })
        .transpose()
}
