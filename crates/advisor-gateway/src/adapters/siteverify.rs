//! reqwest-backed `TokenVerifier` for the reCAPTCHA siteverify endpoint.
//!
//! Sends `secret` and `response` form-encoded, expects JSON back.

use crate::domain::config::{TimeoutConfig, VerificationConfig};
use crate::domain::error::GatewayError;
use crate::domain::types::{RecaptchaVersion, VerificationResult};
use crate::ports::outbound::{TokenVerifier, VerifierError};
use async_trait::async_trait;
use tracing::debug;

/// HTTP client for the verification service
#[derive(Clone)]
pub struct SiteverifyClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl SiteverifyClient {
    /// Build a client with bounded connect and total timeouts
    pub fn new(
        verification: &VerificationConfig,
        timeouts: &TimeoutConfig,
    ) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeouts.verification)
            .connect_timeout(timeouts.connect)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| GatewayError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: verification.siteverify_url.clone(),
        })
    }
}

#[async_trait]
impl TokenVerifier for SiteverifyClient {
    async fn verify(
        &self,
        version: RecaptchaVersion,
        secret: &str,
        token: &str,
    ) -> Result<VerificationResult, VerifierError> {
        debug!(version = version.as_str(), "Calling siteverify");

        let response = self
            .http_client
            .post(&self.endpoint)
            .form(&[("secret", secret), ("response", token)])
            .send()
            .await
            .map_err(|e| VerifierError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerifierError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| VerifierError::Transport(e.without_url().to_string()))?;

        serde_json::from_slice::<VerificationResult>(&body)
            .map_err(|e| VerifierError::Decode(e.to_string()))
    }
}
