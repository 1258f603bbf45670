//! Domain types for the advisor gateway.
//!
//! Configuration, error taxonomy, wire types and the advice template. No I/O
//! happens here; the siteverify client lives in the adapters layer.

pub mod advice;
pub mod config;
pub mod error;
pub mod types;

// Re-exports for convenience
pub use advice::render_advice;
pub use config::{ConfigError, GatewayConfig, ProtocolConfig, VerificationConfig};
pub use error::{AdviceError, AdviceResult, ErrorBody, GatewayError};
pub use types::*;
