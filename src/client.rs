// src/client.rs
//! HTTP client that runs a [`Device`] through `/connect` and `/validate`.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::device::Device;
use crate::identity::IdentityError;
use crate::session::AuthError;
use crate::types::{ChallengeResponse, ErrorResponse, Status, ValidateResponse};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("connection rejected ({status}): {reason}")]
    Rejected { status: StatusCode, reason: String },

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        })
    }

    pub async fn connect(&self, device: &Device) -> Result<ChallengeResponse, ClientError> {
        let req = device.connect_request()?;
        let res = self
            .http
            .post(format!("{}/connect", self.base_url))
            .json(&req)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let reason = res
                .json::<ErrorResponse>()
                .await
                .map(|e| e.error)
                .unwrap_or_else(|_| "unknown".into());
            return Err(ClientError::Rejected { status, reason });
        }
        Ok(res.json().await?)
    }

    pub async fn validate(&self, device: &Device, response: String) -> Result<Status, ClientError> {
        let res: ValidateResponse = self
            .http
            .post(format!("{}/validate", self.base_url))
            .json(&device.validate_request(response))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(res.status)
    }

    /// Full exchange. `Ok(false)` means the backend answered `failure`.
    pub async fn authenticate(&self, device: &Device) -> Result<bool, ClientError> {
        let challenge = self.connect(device).await?;
        debug!(device_id = device.device_id(), "challenge received");

        let response = device.respond(&challenge)?;
        let status = self.validate(device, response).await?;

        match status {
            Status::Success => info!(device_id = device.device_id(), "authentication successful"),
            Status::Failure => warn!(device_id = device.device_id(), "authentication failed"),
        }
        Ok(status == Status::Success)
    }
}
