//! Contact form submissions: normalization and validation

use crate::config::FormMode;
use crate::domain::message::header_safe;
use std::collections::HashMap;
use validator::{Validate, ValidationErrors};

lazy_static::lazy_static! {
    /// Shallow address check: something, `@`, something, `.`, something,
    /// with no whitespace or extra `@` anywhere.
    pub static ref EMAIL_REGEX: regex::Regex = regex::Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// Check that a value looks like an email address.
///
/// This is a syntactic check only and says nothing about deliverability.
pub fn is_valid_email(value: &str) -> bool {
    !value.is_empty() && !value.contains(char::is_control) && EMAIL_REGEX.is_match(value)
}

fn validate_email_syntax(email: &str) -> Result<(), validator::ValidationError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_email"))
    }
}

/// Canonical key/value view of a submitted form, independent of whether the
/// request carried JSON or URL-encoded data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    /// Normalize a raw request body.
    ///
    /// The body is read as a JSON object first. Anything else (invalid JSON,
    /// a non-object document, an empty body) is read as
    /// `application/x-www-form-urlencoded`. For JSON, strings are kept as-is,
    /// numbers and booleans are stringified, and nested values are ignored.
    /// For repeated form keys the first occurrence wins.
    pub fn from_body(body: &[u8]) -> Self {
        if let Ok(object) = serde_json::from_slice::<serde_json::Map<String, serde_json::Value>>(body)
        {
            let fields = object
                .into_iter()
                .filter_map(|(key, value)| json_scalar(value).map(|v| (key, v)))
                .collect();
            return Self(fields);
        }

        let mut fields = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(body).into_owned() {
            fields.entry(key).or_insert(value);
        }
        Self(fields)
    }

    /// Trimmed value of a field, `None` when missing or blank.
    pub fn get(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

fn json_scalar(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Untrusted submission as received from the form, already trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    /// Read from `message`, falling back to `body`
    pub body: String,
    pub honeypot: Option<String>,
}

impl SubmissionInput {
    pub fn from_fields(fields: &FormFields, honeypot_field: &str) -> Self {
        Self {
            name: fields.get("name"),
            email: fields.get("email"),
            subject: fields.get("subject"),
            body: fields
                .get("message")
                .or_else(|| fields.get("body"))
                .unwrap_or_default(),
            honeypot: fields.get(honeypot_field),
        }
    }

    /// Decide whether a submission is accepted, rejected or silently dropped.
    ///
    /// The honeypot is checked before anything else so automated clients get
    /// the same answer whether or not the rest of their payload is valid.
    pub fn validate(self, mode: FormMode) -> Result<Verdict, ValidationErrors> {
        if self.honeypot.is_some() {
            return Ok(Verdict::SpamSuppressed);
        }

        // Header-bound text is judged in the form it will be sent in
        let name = self.name.as_deref().map(header_safe).filter(|n| !n.is_empty());
        let subject = self.subject.as_deref().map(header_safe).filter(|s| !s.is_empty());

        match mode {
            FormMode::Strict => {
                let contact = StrictContact {
                    name: name.unwrap_or_default(),
                    email: self.email.unwrap_or_default(),
                    message: self.body,
                };
                contact.validate()?;

                Ok(Verdict::Accept(ValidSubmission {
                    name: Some(contact.name),
                    email: Some(contact.email),
                    subject,
                    body: contact.message,
                }))
            }
            FormMode::Minimal => {
                let contact = MinimalContact { message: self.body };
                contact.validate()?;

                Ok(Verdict::Accept(ValidSubmission {
                    name,
                    // An unusable address only costs the Reply-To header here
                    email: self.email.filter(|e| is_valid_email(e)),
                    subject,
                    body: contact.message,
                }))
            }
        }
    }
}

#[derive(Debug, Validate)]
struct StrictContact {
    #[validate(length(min = 1))]
    name: String,
    #[validate(custom(function = "validate_email_syntax"))]
    email: String,
    #[validate(length(min = 1))]
    message: String,
}

#[derive(Debug, Validate)]
struct MinimalContact {
    #[validate(length(min = 1))]
    message: String,
}

/// Outcome of validating a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept(ValidSubmission),
    /// Honeypot was filled in; pretend success and send nothing
    SpamSuppressed,
}

/// A submission that passed validation.
///
/// Only obtainable through [`SubmissionInput::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubmission {
    name: Option<String>,
    email: Option<String>,
    subject: Option<String>,
    body: String,
}

impl ValidSubmission {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}
