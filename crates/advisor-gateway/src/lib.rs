//! Advisor Gateway - reCAPTCHA-gated relay for the Mechanical Advisor frontend.
//!
//! Accepts a free-text prompt, optionally checks a reCAPTCHA token against the
//! siteverify API, and answers with templated advice.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      ADVISOR GATEWAY                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │   HTTP :8000   (/, /health, /get-advice*)                     │
//! │         │                                                     │
//! │  ┌──────┴─────────────────────────────────┐                   │
//! │  │ Middleware: CORS → Tracing → Timeout   │                   │
//! │  │             → BodyLimit                │                   │
//! │  └──────┬─────────────────────────────────┘                   │
//! │         │                                                     │
//! │  ┌──────┴──────────┐     ┌──────────────────────┐            │
//! │  │ RequestGateway  │────▶│ TokenVerifier (port) │            │
//! │  │  v3 / v2 / pass │     └──────────┬───────────┘            │
//! │  └─────────────────┘                │                         │
//! └─────────────────────────────────────┼─────────────────────────┘
//!                                       ▼
//!                         reCAPTCHA siteverify (HTTPS)
//! ```
//!
//! # Routes
//!
//! - `POST /get-advice` - score-based (v3) verification
//! - `POST /get-advice-with-v2` - challenge-based (v2) verification
//! - `POST /get-advice-v2-passed` - no verification
//!
//! A protocol whose `enabled` flag is off is bypassed (fail-open).
//!
//! # Usage
//!
//! ```ignore
//! use advisor_gateway::{AdvisorGatewayService, GatewayConfig};
//!
//! let config = GatewayConfig::from_env()?;
//! let mut service = AdvisorGatewayService::new(config)?;
//! service.start().await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod gateway;
pub mod middleware;
pub mod ports;
pub mod service;

// Re-exports for public API
pub use adapters::SiteverifyClient;
pub use domain::config::GatewayConfig;
pub use domain::error::{AdviceError, AdviceResult, GatewayError};
pub use domain::types::*;
pub use gateway::RequestGateway;
pub use ports::{TokenVerifier, VerifierError};
pub use service::AdvisorGatewayService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
