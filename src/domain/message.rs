//! Outbound message model

use crate::config::{FormConfig, FormMode, RelayConfig};
use crate::domain::ValidSubmission;
use crate::email::templates;

/// A display name plus address, as used in From / Reply-To style headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxSpec {
    pub name: Option<String>,
    pub address: String,
}

impl std::fmt::Display for MailboxSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <{}>", name, self.address),
            None => f.write_str(&self.address),
        }
    }
}

/// The email handed to the delivery client. Built once per request and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub subject: String,
    /// The authenticated relay account
    pub from_address: String,
    /// The submitter's name, shown against the relay account address
    pub from_display_name: Option<String>,
    pub reply_to: Option<MailboxSpec>,
    pub to_address: String,
    /// Plain text only
    pub body: String,
}

impl OutboundMessage {
    /// Build the message for a validated submission.
    ///
    /// Every value that ends up in a header goes through [`header_safe`].
    pub fn compose(submission: &ValidSubmission, relay: &RelayConfig, form: &FormConfig) -> Self {
        let name = submission.name().map(header_safe).filter(|n| !n.is_empty());
        let email = submission.email().map(header_safe).filter(|e| !e.is_empty());
        let subject = submission
            .subject()
            .map(header_safe)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| header_safe(&form.default_subject));

        let body = match form.mode {
            FormMode::Strict => templates::contact_form_body(
                name.as_deref().unwrap_or_default(),
                email.as_deref().unwrap_or_default(),
                &subject,
                submission.body(),
            ),
            FormMode::Minimal => submission.body().to_string(),
        };

        let reply_to = email.map(|address| MailboxSpec {
            name: name.clone(),
            address,
        });

        Self {
            subject: format!("{}{}", header_safe_prefix(&form.subject_prefix), subject),
            from_address: relay.from_email.clone(),
            from_display_name: name,
            reply_to,
            to_address: relay.to_email.clone(),
            body,
        }
    }

    /// The From header as it reads on the wire: `Name <account>` or the bare account
    pub fn from_mailbox(&self) -> MailboxSpec {
        MailboxSpec {
            name: self.from_display_name.clone(),
            address: self.from_address.clone(),
        }
    }
}

/// Neutralize a value destined for a header.
///
/// Control characters (CR and LF included) become spaces and whitespace runs
/// collapse, so the value can never start a new header line.
pub fn header_safe(value: &str) -> String {
    value
        .split(|c: char| c.is_control() || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Like [`header_safe`] but keeps a trailing separator, since prefixes such
/// as `[Contact] ` rely on it.
fn header_safe_prefix(prefix: &str) -> String {
    let cleaned = header_safe(prefix);
    if !cleaned.is_empty() && prefix.ends_with(|c: char| c.is_whitespace()) {
        format!("{} ", cleaned)
    } else {
        cleaned
    }
}
