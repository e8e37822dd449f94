//! Mail relay service: validate, compose, deliver

use crate::config::Config;
use crate::domain::{FormFields, OutboundMessage, SubmissionInput, Verdict};
use crate::email::MailDelivery;
use crate::error::Result;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// What happened to an accepted request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The relay accepted the message
    Sent,
    /// Honeypot tripped; nothing was sent
    Suppressed,
}

/// Handles one form submission end to end.
///
/// Holds only read-only configuration and the delivery client, so a single
/// instance is shared by every request.
pub struct RelayService {
    config: Arc<Config>,
    delivery: Arc<dyn MailDelivery>,
}

impl RelayService {
    pub fn new(config: Arc<Config>, delivery: Arc<dyn MailDelivery>) -> Self {
        Self { config, delivery }
    }

    /// Relay a normalized form submission
    pub async fn submit(&self, fields: &FormFields) -> Result<RelayOutcome> {
        let form = &self.config.form;
        let input = SubmissionInput::from_fields(fields, &form.honeypot_field);

        let submission = match input.validate(form.mode) {
            Ok(Verdict::Accept(submission)) => submission,
            Ok(Verdict::SpamSuppressed) => {
                info!(field = %form.honeypot_field, "Honeypot filled in, dropping submission");
                counter!("mail_relay_submissions_total", "outcome" => "spam").increment(1);
                return Ok(RelayOutcome::Suppressed);
            }
            Err(errors) => {
                counter!("mail_relay_submissions_total", "outcome" => "invalid").increment(1);
                return Err(errors.into());
            }
        };

        let message = OutboundMessage::compose(&submission, &self.config.relay, form);
        debug!(
            reply_to = ?message.reply_to.as_ref().map(|r| r.address.as_str()),
            subject = %message.subject,
            "Relaying submission"
        );

        let start = Instant::now();
        let result = self.delivery.send(&message).await;
        histogram!("mail_relay_delivery_duration_seconds", "backend" => self.delivery.name())
            .record(start.elapsed().as_secs_f64());

        match result {
            Ok(()) => {
                counter!("mail_relay_submissions_total", "outcome" => "sent").increment(1);
                info!(to = %message.to_address, "Submission relayed");
                Ok(RelayOutcome::Sent)
            }
            Err(e) => {
                counter!("mail_relay_submissions_total", "outcome" => "failed").increment(1);
                error!(
                    kind = e.kind(),
                    backend = self.delivery.name(),
                    detail = e.detail(),
                    "Relay delivery failed"
                );
                Err(e.into())
            }
        }
    }
}
