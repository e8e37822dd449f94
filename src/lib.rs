//! Mail Relay - contact form to SMTP bridge
//!
//! Accepts a web form submission over HTTP, validates it, and relays it as a
//! single email through an authenticated, STARTTLS-secured SMTP relay.

pub mod api;
pub mod config;
pub mod domain;
pub mod email;
pub mod error;
pub mod middleware;
pub mod server;
pub mod service;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
