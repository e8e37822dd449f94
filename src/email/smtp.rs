//! SMTP delivery client using lettre
//!
//! Every send opens its own connection: EHLO, mandatory STARTTLS, AUTH,
//! MAIL FROM / RCPT TO / DATA, then QUIT. Connection pooling is not compiled
//! in, so nothing is reused between requests.

use super::provider::{DeliveryError, MailDelivery};
use crate::config::RelayConfig;
use crate::domain::{header_safe, OutboundMessage};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, warn};

/// Reply codes that mean the relay refused our credentials
const AUTH_FAILURE_CODES: &[&str] = &["454", "530", "534", "535", "538"];

/// STARTTLS-only SMTP client bound to one relay
pub struct SmtpDeliveryClient {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    relay: String,
}

impl SmtpDeliveryClient {
    /// Create a new client from configuration.
    ///
    /// No connection is made here; the relay is first contacted on `send`.
    pub fn from_config(config: &RelayConfig) -> Result<Self, DeliveryError> {
        for (role, address) in [("from", &config.from_email), ("to", &config.to_email)] {
            parse_address(address, role)
                .map_err(|e| DeliveryError::InvalidConfiguration(e.detail().to_string()))?;
        }

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| DeliveryError::InvalidConfiguration(e.to_string()))?
            .port(config.port)
            .timeout(Some(config.timeout()))
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            relay: format!("{}:{}", config.host, config.port),
        })
    }
}

#[async_trait]
impl MailDelivery for SmtpDeliveryClient {
    async fn send(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        let email = build_message(message)?;

        match self.transport.send(email).await {
            Ok(response) => {
                debug!(relay = %self.relay, code = %response.code(), "Relay accepted message");
                Ok(())
            }
            Err(e) => Err(classify_smtp_error(&e)),
        }
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

/// Turn an [`OutboundMessage`] into a lettre [`Message`].
///
/// Header values are neutralized again here so a hand-built message cannot
/// smuggle line breaks into the header block either.
pub(crate) fn build_message(message: &OutboundMessage) -> Result<Message, DeliveryError> {
    let from = Mailbox::new(
        display_name(message.from_display_name.as_deref()),
        parse_address(&message.from_address, "from")?,
    );
    let to = Mailbox::new(None, parse_address(&message.to_address, "to")?);

    let mut builder = Message::builder()
        .from(from)
        .to(to)
        .subject(header_safe(&message.subject));

    if let Some(reply_to) = &message.reply_to {
        // The form only checks address shape; lettre is stricter. Losing the
        // Reply-To is better than losing the submission.
        match reply_to.address.parse::<Address>() {
            Ok(address) => {
                builder = builder.reply_to(Mailbox::new(
                    display_name(reply_to.name.as_deref()),
                    address,
                ));
            }
            Err(e) => warn!(error = %e, "Dropping unparseable Reply-To address"),
        }
    }

    builder
        .header(ContentType::TEXT_PLAIN)
        .body(message.body.clone())
        .map_err(|e| DeliveryError::InvalidMessage(e.to_string()))
}

fn parse_address(value: &str, role: &str) -> Result<Address, DeliveryError> {
    value
        .parse()
        .map_err(|e| DeliveryError::InvalidMessage(format!("Invalid {} address: {}", role, e)))
}

fn display_name(name: Option<&str>) -> Option<String> {
    name.map(header_safe).filter(|n| !n.is_empty())
}

/// Fold a lettre error into a [`DeliveryError`], keeping its text.
fn classify_smtp_error(e: &lettre::transport::smtp::Error) -> DeliveryError {
    let detail = e.to_string();

    if let Some(code) = e.status() {
        let code = code.to_string();
        return if AUTH_FAILURE_CODES.contains(&code.as_str()) {
            DeliveryError::Authentication(detail)
        } else {
            DeliveryError::Rejected(detail)
        };
    }

    let lowered = detail.to_ascii_lowercase();
    if lowered.contains("tls") || lowered.contains("certificate") {
        DeliveryError::Tls(detail)
    } else if lowered.contains("authentication") || lowered.contains("mechanism") {
        DeliveryError::Authentication(detail)
    } else {
        DeliveryError::Connection(detail)
    }
}
