//! Outbound email: message templates and the SMTP delivery client

pub mod provider;
pub mod smtp;
pub mod templates;

pub use provider::{DeliveryError, MailDelivery};
pub use smtp::SmtpDeliveryClient;
pub use templates::TemplateEngine;
