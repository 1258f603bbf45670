//! Outbound ports for the advisor gateway.

use crate::domain::types::{RecaptchaVersion, VerificationResult};
use async_trait::async_trait;

/// Why a verification call produced no usable result.
///
/// Every variant collapses to `AdviceError::ServiceUnavailable` for the
/// caller; the detail is only logged.
#[derive(Debug, thiserror::Error)]
pub enum VerifierError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("verification service returned HTTP {0}")]
    Status(u16),
    #[error("malformed verification response: {0}")]
    Decode(String),
}

/// Checks a client token against the verification service
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Submit `token` with `secret`. One attempt, no retry.
    async fn verify(
        &self,
        version: RecaptchaVersion,
        secret: &str,
        token: &str,
    ) -> Result<VerificationResult, VerifierError>;
}
