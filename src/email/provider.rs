//! Delivery trait and error types

use crate::domain::OutboundMessage;
use async_trait::async_trait;
use thiserror::Error;

/// Why a delivery attempt failed.
///
/// Each variant carries the diagnostic text reported by the transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("TLS negotiation failed: {0}")]
    Tls(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rejected by relay: {0}")]
    Rejected(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl DeliveryError {
    /// The underlying diagnostic, without the classification prefix
    pub fn detail(&self) -> &str {
        match self {
            Self::Connection(detail)
            | Self::Tls(detail)
            | Self::Authentication(detail)
            | Self::Rejected(detail)
            | Self::InvalidMessage(detail)
            | Self::InvalidConfiguration(detail) => detail,
        }
    }

    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Tls(_) => "tls",
            Self::Authentication(_) => "authentication",
            Self::Rejected(_) => "rejected",
            Self::InvalidMessage(_) => "invalid_message",
            Self::InvalidConfiguration(_) => "invalid_configuration",
        }
    }
}

/// Delivers a single message to the relay.
///
/// One call is one attempt over one connection; implementations never retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailDelivery: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError>;

    /// Get the delivery backend name
    fn name(&self) -> &'static str;
}
