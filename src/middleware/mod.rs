//! HTTP middleware for the mail relay
//!
//! - Error envelope normalization for framework rejections
//! - Request ID propagation and request metrics

pub mod error_response;
pub mod metrics;

pub use error_response::normalize_error_response;
pub use metrics::ObservabilityLayer;
