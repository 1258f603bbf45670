//! Adapters for the advisor gateway.
//!
//! Infrastructure implementations of the outbound ports.

pub mod siteverify;

pub use siteverify::SiteverifyClient;
