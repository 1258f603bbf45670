//! Middleware stack for the advisor gateway.
//!
//! Layer order (outermost first): CORS → Tracing → Timeout → BodyLimit → Handler

pub mod cors;
pub mod timeout;
pub mod tracing;

pub use cors::create_cors_layer;
pub use timeout::TimeoutLayer;
pub use tracing::{TracingLayer, REQUEST_ID_HEADER};
