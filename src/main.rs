// src/main.rs
use std::sync::Arc;
use std::time::Duration;

use dna_auth::api;
use dna_auth::config::ServerConfig;
use dna_auth::{CryptoIdentity, SessionManager};
use tokio::net::TcpListener;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::from_env()?;

    let mut sessions = SessionManager::new(CryptoIdentity::generate())?;
    if let Some(ttl) = config.challenge_ttl {
        sessions = sessions.with_ttl(chrono::Duration::from_std(ttl)?);
        info!(ttl_secs = ttl.as_secs(), "challenge expiry enabled");
    }
    let sessions = Arc::new(sessions);

    if sessions.ttl().is_some() {
        let sessions = sessions.clone();
        let every = config.purge_interval;
        tokio::spawn(async move { expiry_worker(sessions, every).await });
    }

    let app = api::router(sessions, config.request_timeout);

    info!("authentication backend listening on {}", config.bind_addr);
    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn expiry_worker(sessions: Arc<SessionManager>, every: Duration) {
    let mut tick = tokio::time::interval(every);
    loop {
        tick.tick().await;
        let purged = sessions.purge_expired();
        if purged > 0 {
            debug!(purged, remaining = sessions.pending_count(), "purged expired challenges");
        }
    }
}
