//! Gateway configuration with validation.
//!
//! Built once at startup (defaults, then environment overrides) and shared
//! read-only afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tracing::warn;

/// Default reCAPTCHA siteverify endpoint
pub const DEFAULT_SITEVERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Documented placeholder for the v3 secret; leaving it in place disables v3
pub const PLACEHOLDER_SECRET_V3: &str = "YOUR_RECAPTCHA_SECRET_KEY";

/// Documented placeholder for the v2 secret; leaving it in place disables v2
pub const PLACEHOLDER_SECRET_V2: &str = "YOUR_RECAPTCHA_SECRET_KEY_V2";

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// reCAPTCHA verification configuration
    pub verification: VerificationConfig,
    /// Request limits
    pub limits: LimitsConfig,
    /// Timeout configuration
    pub timeouts: TimeoutConfig,
    /// CORS configuration
    pub cors: CorsConfig,
}

impl GatewayConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.verification.score_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidThreshold(threshold));
        }

        if self.verification.v3.enabled && self.verification.v3.secret_key.is_empty() {
            return Err(ConfigError::MissingSecret("v3"));
        }
        if self.verification.v2.enabled && self.verification.v2.secret_key.is_empty() {
            return Err(ConfigError::MissingSecret("v2"));
        }

        if self.verification.siteverify_url.trim().is_empty() {
            return Err(ConfigError::Invalid("siteverify_url cannot be empty".into()));
        }

        if self.limits.max_request_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_request_size cannot be 0".into(),
            ));
        }

        if self.timeouts.verification.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "verification timeout cannot be 0".into(),
            ));
        }

        if self.timeouts.connect.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "connect timeout cannot be 0".into(),
            ));
        }

        if self.timeouts.request <= self.timeouts.verification {
            return Err(ConfigError::InvalidTimeout(
                "request timeout must exceed verification timeout".into(),
            ));
        }

        Ok(())
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }

    /// Build configuration from defaults overridden by process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// `from_env` delegates here; tests pass a map instead of mutating the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("ADVISOR_HOST") {
            config.http.host = parse_var("ADVISOR_HOST", &host)?;
        }
        if let Some(port) = lookup("ADVISOR_PORT") {
            config.http.port = parse_var("ADVISOR_PORT", &port)?;
        }

        config.verification.v3 = ProtocolConfig::from_secret(
            lookup("RECAPTCHA_SECRET_KEY"),
            PLACEHOLDER_SECRET_V3,
            lookup("ADVISOR_RECAPTCHA_V3_ENABLED"),
            "ADVISOR_RECAPTCHA_V3_ENABLED",
        )?;
        config.verification.v2 = ProtocolConfig::from_secret(
            lookup("RECAPTCHA_SECRET_KEY_V2"),
            PLACEHOLDER_SECRET_V2,
            lookup("ADVISOR_RECAPTCHA_V2_ENABLED"),
            "ADVISOR_RECAPTCHA_V2_ENABLED",
        )?;

        if let Some(threshold) = lookup("RECAPTCHA_THRESHOLD") {
            config.verification.score_threshold = parse_var("RECAPTCHA_THRESHOLD", &threshold)?;
        }
        if let Some(url) = lookup("ADVISOR_SITEVERIFY_URL") {
            config.verification.siteverify_url = url;
        }

        if let Some(secs) = lookup("ADVISOR_VERIFY_TIMEOUT_SECS") {
            config.timeouts.verification =
                Duration::from_secs(parse_var("ADVISOR_VERIFY_TIMEOUT_SECS", &secs)?);
        }
        if let Some(secs) = lookup("ADVISOR_VERIFY_CONNECT_TIMEOUT_SECS") {
            config.timeouts.connect =
                Duration::from_secs(parse_var("ADVISOR_VERIFY_CONNECT_TIMEOUT_SECS", &secs)?);
        }
        if let Some(secs) = lookup("ADVISOR_REQUEST_TIMEOUT_SECS") {
            config.timeouts.request =
                Duration::from_secs(parse_var("ADVISOR_REQUEST_TIMEOUT_SECS", &secs)?);
        }

        if let Some(origins) = lookup("ADVISOR_CORS_ORIGINS") {
            config.cors.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }

        Ok(config)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8000)
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8000,
        }
    }
}

/// Per-protocol verification settings.
///
/// `enabled = false` is the fail-open bypass: requests on that route skip
/// verification entirely.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Whether tokens are checked against the verification service
    pub enabled: bool,
    /// Server-side secret; never serialized
    #[serde(skip_serializing)]
    pub secret_key: String,
}

impl ProtocolConfig {
    /// Enabled configuration with the given secret
    pub fn enabled(secret_key: impl Into<String>) -> Self {
        Self {
            enabled: true,
            secret_key: secret_key.into(),
        }
    }

    /// Bypassed configuration
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Derive the flag from the environment.
    ///
    /// An explicit flag wins. Without one, verification is on only when a
    /// real secret was provided.
    fn from_secret(
        secret: Option<String>,
        placeholder: &str,
        flag: Option<String>,
        flag_name: &'static str,
    ) -> Result<Self, ConfigError> {
        let secret = secret.map(|s| s.trim().to_string()).unwrap_or_default();

        let enabled = match flag {
            Some(value) => parse_bool(flag_name, &value)?,
            None => {
                let provided = !secret.is_empty() && secret != placeholder;
                if !provided {
                    warn!(
                        flag = flag_name,
                        "reCAPTCHA secret not provided; verification will be skipped"
                    );
                }
                provided
            }
        };

        Ok(Self {
            enabled,
            secret_key: secret,
        })
    }
}

impl fmt::Debug for ProtocolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolConfig")
            .field("enabled", &self.enabled)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// reCAPTCHA verification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Score-based protocol (v3)
    pub v3: ProtocolConfig,
    /// Challenge-based protocol (v2)
    pub v2: ProtocolConfig,
    /// Minimum accepted v3 score; scores strictly below are rejected
    pub score_threshold: f64,
    /// Siteverify endpoint
    pub siteverify_url: String,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            v3: ProtocolConfig::disabled(),
            v2: ProtocolConfig::disabled(),
            score_threshold: 0.5,
            siteverify_url: DEFAULT_SITEVERIFY_URL.to_string(),
        }
    }
}

/// Request limits configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Max request body size in bytes (default: 1MB)
    pub max_request_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_request_size: 1024 * 1024, // 1MB
        }
    }
}

/// Timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Whole-request timeout
    #[serde(with = "humantime_serde")]
    pub request: Duration,
    /// Outbound siteverify call timeout
    #[serde(with = "humantime_serde")]
    pub verification: Duration,
    /// Outbound connect timeout
    #[serde(with = "humantime_serde")]
    pub connect: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(30),
            verification: Duration::from_secs(10),
            connect: Duration::from_secs(5),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Enable CORS
    pub enabled: bool,
    /// Allowed origins ("*" for all)
    pub allowed_origins: Vec<String>,
    /// Allowed methods ("*" for all)
    pub allowed_methods: Vec<String>,
    /// Allowed headers ("*" for all)
    pub allowed_headers: Vec<String>,
    /// Max age for preflight cache
    pub max_age: u64,
    /// Allow credentials
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["http://localhost:3000".to_string()],
            allowed_methods: vec!["*".to_string()],
            allowed_headers: vec!["*".to_string()],
            max_age: 86400, // 24 hours
            allow_credentials: true,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Score threshold outside [0, 1]
    #[error("score threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f64),
    /// Verification enabled without a secret
    #[error("reCAPTCHA {0} verification is enabled but no secret key is set")]
    MissingSecret(&'static str),
    /// Invalid size or count limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// Environment variable could not be parsed
    #[error("invalid value for {name}: {value:?}")]
    InvalidVar { name: &'static str, value: String },
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidVar {
        name,
        value: value.to_string(),
    })
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidVar {
            name,
            value: value.to_string(),
        }),
    }
}

/// Humantime serde module for Duration serialization
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}ms", duration.as_millis()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        // "ms" must be checked before "s" and "m"
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(|_| "invalid minutes")
        } else {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}
