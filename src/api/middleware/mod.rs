//! API middleware layer
//!
//! Provides middleware for request processing including CORS, logging, and validation.

pub mod cors;
pub mod logging;

pub use cors::cors_layer;
pub use logging::logging_layer;
