//! Ports (trait seams) for the advisor gateway.

pub mod outbound;

pub use outbound::{TokenVerifier, VerifierError};
