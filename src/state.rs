//! Application state traits for dependency injection
//!
//! Handlers are generic over [`HasRelay`] so the router can be driven by the
//! production [`AppState`](crate::server::AppState) or by a test state with a
//! fake delivery client.

use crate::config::Config;
use crate::service::RelayService;

/// Trait for application state that provides access to the relay service.
pub trait HasRelay: Clone + Send + Sync + 'static {
    /// Get the application configuration
    fn config(&self) -> &Config;

    /// Get the relay service
    fn relay_service(&self) -> &RelayService;
}
