//! Wire types for the advice routes and the siteverify response.

use serde::{Deserialize, Serialize};

/// Body of `POST /get-advice`
#[derive(Debug, Clone, Deserialize)]
pub struct AdviceRequest {
    pub prompt: String,
    #[serde(default)]
    pub recaptcha_token: Option<String>,
}

/// Body of `POST /get-advice-with-v2`
#[derive(Debug, Clone, Deserialize)]
pub struct AdviceRequestV2 {
    pub prompt: String,
    #[serde(default)]
    pub recaptcha_token_v2: Option<String>,
}

/// Body of `POST /get-advice-v2-passed`
#[derive(Debug, Clone, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

/// Successful response of every advice route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdviceResponse {
    pub advice: String,
}

/// Liveness payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Which protocol a verification call belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecaptchaVersion {
    /// Score-based
    V3,
    /// Challenge-based
    V2,
}

impl RecaptchaVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecaptchaVersion::V3 => "v3",
            RecaptchaVersion::V2 => "v2",
        }
    }
}

/// Path a request took to reach advice generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationPath {
    /// `/get-advice`
    V3,
    /// `/get-advice-with-v2`
    V2,
    /// `/get-advice-v2-passed`
    V2Passed,
}

/// Siteverify response.
///
/// Only `success` is always present; v2 responses carry no `score`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VerificationResult {
    pub success: bool,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default, rename = "error-codes")]
    pub error_codes: Option<Vec<String>>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub challenge_ts: Option<String>,
}

impl VerificationResult {
    /// Successful result with a score
    pub fn passed(score: Option<f64>) -> Self {
        Self {
            success: true,
            score,
            ..Default::default()
        }
    }

    /// Rejected result with error codes
    pub fn rejected(error_codes: &[&str]) -> Self {
        Self {
            success: false,
            error_codes: Some(error_codes.iter().map(|c| c.to_string()).collect()),
            ..Default::default()
        }
    }
}
